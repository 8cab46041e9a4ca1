//! Lobby composition layer sitting between auth/room/match, grounded on
//! `examples/original_source/backend/src/service/BeforePlayService.cpp`.

use crate::auth::AuthService;
use crate::match_service::MatchService;
use crate::room::RoomService;
use crate::types::PlayerState;
use protocol::packets::{
    S2CCreateRoomResult, S2CGameStart, S2CInviteReceived, S2CInviteResponse, S2CKickResult, S2COnlineList,
    S2CPlayerReadyUpdate,
};
use protocol::ResultCode;
use std::sync::Arc;

pub struct InviteOutcome {
    pub to_target: Option<(String, S2CInviteReceived)>,
    pub error: Option<String>,
}

pub struct RespondInviteOutcome {
    pub to_sender: (String, S2CInviteResponse),
    /// Present only when the invite was accepted and the join succeeded.
    pub join_result: Option<(String, S2CCreateRoomResult)>,
}

pub struct SetReadyOutcome {
    pub ack: ResultCode,
    pub ack_message: String,
    pub to_host: Option<(String, S2CPlayerReadyUpdate)>,
}

pub struct StartGameOutcome {
    pub host_packet: S2CGameStart,
    pub opponent_packet: (String, S2CGameStart),
}

pub struct KickOutcome {
    pub result: S2CKickResult,
    pub target_username: Option<String>,
}

pub struct BeforePlayService {
    auth: Arc<AuthService>,
    room: Arc<RoomService>,
    match_service: Arc<MatchService>,
}

impl BeforePlayService {
    pub fn new(auth: Arc<AuthService>, room: Arc<RoomService>, match_service: Arc<MatchService>) -> BeforePlayService {
        BeforePlayService { auth, room, match_service }
    }

    /// Empty list on auth failure, matching the original's fail-open-empty behavior.
    pub fn online_list(&self, username: &str) -> S2COnlineList {
        let usernames = self
            .auth
            .all_sessions()
            .into_iter()
            .filter(|s| s.username != username)
            .filter(|s| !self.room.is_user_in_room(&s.username))
            .map(|s| s.username)
            .collect();
        S2COnlineList { usernames }
    }

    pub fn send_invite(&self, sender: &str, target_username: &str, room_id: u32) -> InviteOutcome {
        if self.auth.connection_id_of(target_username).is_none() {
            return InviteOutcome {
                to_target: None,
                error: Some("User not online".into()),
            };
        }
        if self.room.is_user_in_room(target_username) {
            return InviteOutcome {
                to_target: None,
                error: Some(format!("{} is busy", target_username)),
            };
        }

        InviteOutcome {
            to_target: Some((
                target_username.to_string(),
                S2CInviteReceived {
                    from_username: sender.to_string(),
                    room_id,
                    room_name: String::new(),
                },
            )),
            error: None,
        }
    }

    pub fn respond_invite(&self, target_username: &str, from_username: &str, accept: bool) -> RespondInviteOutcome {
        if !accept {
            return RespondInviteOutcome {
                to_sender: (
                    from_username.to_string(),
                    S2CInviteResponse {
                        to_username: from_username.to_string(),
                        accepted: false,
                        message: format!("{} declined invite", target_username),
                    },
                ),
                join_result: None,
            };
        }

        let room = match self.room.room_by_username(from_username) {
            Some(r) => r,
            None => {
                return RespondInviteOutcome {
                    to_sender: (
                        from_username.to_string(),
                        S2CInviteResponse {
                            to_username: from_username.to_string(),
                            accepted: false,
                            message: "Room invalid".into(),
                        },
                    ),
                    join_result: None,
                }
            }
        };

        let connection_id = self.auth.connection_id_of(target_username).unwrap_or(0);
        let join_result = self.room.join_room(room.id, target_username, connection_id);

        if join_result.code != ResultCode::Ok {
            return RespondInviteOutcome {
                to_sender: (
                    from_username.to_string(),
                    S2CInviteResponse {
                        to_username: from_username.to_string(),
                        accepted: false,
                        message: join_result.message.clone(),
                    },
                ),
                join_result: Some((target_username.to_string(), join_result)),
            };
        }

        RespondInviteOutcome {
            to_sender: (
                from_username.to_string(),
                S2CInviteResponse {
                    to_username: from_username.to_string(),
                    accepted: true,
                    message: format!("{} accepted invite", target_username),
                },
            ),
            join_result: Some((target_username.to_string(), join_result)),
        }
    }

    pub fn set_ready(&self, username: &str, room_id: u32, ready: bool) -> SetReadyOutcome {
        let room = match self.room.get_room(room_id) {
            Some(r) => r,
            None => {
                return SetReadyOutcome {
                    ack: ResultCode::NotFound,
                    ack_message: "Room not found".into(),
                    to_host: None,
                }
            }
        };

        if room.state == crate::types::RoomState::Playing {
            return SetReadyOutcome {
                ack: ResultCode::Fail,
                ack_message: "Game already in progress".into(),
                to_host: None,
            };
        }

        let state = if ready { PlayerState::Ready } else { PlayerState::Preparing };
        self.room.update_player_state(room_id, username, state);

        let to_host = room.member(&room.host_username).map(|host| {
            (
                host.username.clone(),
                S2CPlayerReadyUpdate {
                    username: username.to_string(),
                    ready,
                },
            )
        });

        SetReadyOutcome {
            ack: ResultCode::Ok,
            ack_message: "Set ready success".into(),
            to_host,
        }
    }

    pub fn start_game(&self, username: &str, room_id: u32) -> Result<StartGameOutcome, String> {
        let room = self.room.get_room(room_id).ok_or_else(|| "Room not found".to_string())?;

        if room.host_username != username {
            return Err("Only host can start game".into());
        }

        let opponent = room
            .opponent_of(username)
            .ok_or_else(|| "No opponent or not ready".to_string())?;
        if opponent.state != PlayerState::Ready {
            return Err("Opponent not ready".into());
        }
        let opponent_username = opponent.username.clone();

        self.room.update_room_state(room_id, crate::types::RoomState::Playing);
        self.room.update_player_state(room_id, username, PlayerState::InGame);
        self.room.update_player_state(room_id, &opponent_username, PlayerState::InGame);

        let started = self
            .match_service
            .start_match(room_id, vec![username.to_string(), opponent_username.clone()]);

        let host_packet = S2CGameStart {
            room_id,
            opponent_username: opponent_username.clone(),
            word_length: started.round1_word_length as u32,
            current_round: 1,
        };
        let opponent_packet = S2CGameStart {
            room_id,
            opponent_username: username.to_string(),
            word_length: started.round1_word_length as u32,
            current_round: 1,
        };

        Ok(StartGameOutcome {
            host_packet,
            opponent_packet: (opponent_username, opponent_packet),
        })
    }

    pub fn kick_player(&self, username: &str, room_id: u32, target_username: &str) -> KickOutcome {
        let room = match self.room.get_room(room_id) {
            Some(r) => r,
            None => {
                return KickOutcome {
                    result: S2CKickResult {
                        code: ResultCode::NotFound,
                        message: "Room not found".into(),
                        target_username: target_username.to_string(),
                    },
                    target_username: None,
                }
            }
        };

        if room.host_username != username {
            return KickOutcome {
                result: S2CKickResult {
                    code: ResultCode::Fail,
                    message: "Only host can kick".into(),
                    target_username: target_username.to_string(),
                },
                target_username: None,
            };
        }

        if room.state == crate::types::RoomState::Playing {
            return KickOutcome {
                result: S2CKickResult {
                    code: ResultCode::Fail,
                    message: "Cannot kick during game".into(),
                    target_username: target_username.to_string(),
                },
                target_username: None,
            };
        }

        if room.member(target_username).is_none() {
            return KickOutcome {
                result: S2CKickResult {
                    code: ResultCode::NotFound,
                    message: "Target not in room".into(),
                    target_username: target_username.to_string(),
                },
                target_username: None,
            };
        }

        self.room.kick_player(room_id, target_username);

        KickOutcome {
            result: S2CKickResult {
                code: ResultCode::Ok,
                message: "Kick success".into(),
                target_username: target_username.to_string(),
            },
            target_username: Some(target_username.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Hasher;
    use crate::store::{HistoryStore, UserStore};
    use crate::words::{FirstWord, WordLists};
    use flux::logging;
    use tempfile::tempdir;

    fn services() -> (Arc<AuthService>, BeforePlayService) {
        let dir = tempdir().unwrap();
        let log = logging::init("error");
        let auth = Arc::new(AuthService::new(UserStore::new(dir.path().join("users.txt")), Box::new(Sha256Hasher), &log).unwrap());
        let room = Arc::new(RoomService::new(&log));
        let history = Arc::new(HistoryStore::new(dir.path().join("history")));
        let match_service = Arc::new(MatchService::new(
            WordLists::load(std::path::Path::new("/nonexistent")),
            Box::new(FirstWord),
            auth.clone(),
            history,
            &log,
        ));
        std::mem::forget(dir);
        let bp = BeforePlayService::new(auth.clone(), room, match_service);
        (auth, bp)
    }

    #[test]
    fn ready_then_start_game_requires_both_ready() {
        let (auth, bp) = services();
        auth.register("alice", "pw");
        auth.register("bob", "pw");
        let alice = auth.login("alice", "pw", 1);
        let bob = auth.login("bob", "pw", 2);
        let _ = (&alice, &bob);

        let room = bp.room.create_room("alice", 1, "room");
        bp.room.join_room(room.room_id, "bob", 2);

        let early = bp.start_game("alice", room.room_id);
        assert!(early.is_err());

        bp.set_ready("bob", room.room_id, true);
        let started = bp.start_game("alice", room.room_id).unwrap();
        assert_eq!(started.host_packet.opponent_username, "bob");
        assert_eq!(started.opponent_packet.0, "bob");
    }

    #[test]
    fn only_host_can_kick() {
        let (_auth, bp) = services();
        let room = bp.room.create_room("alice", 1, "room");
        bp.room.join_room(room.room_id, "bob", 2);

        let outcome = bp.kick_player("bob", room.room_id, "alice");
        assert_eq!(outcome.result.code, ResultCode::Fail);

        let outcome = bp.kick_player("alice", room.room_id, "bob");
        assert_eq!(outcome.result.code, ResultCode::Ok);
    }
}
