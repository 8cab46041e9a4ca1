//! Lobby and room bookkeeping, grounded on
//! `examples/original_source/backend/src/service/RoomService.cpp`. The
//! lookup/mutation helpers called from `BeforePlayService.cpp`
//! (`isUserInRoom`, `getRoomByUsername`, `joinRoom`, `updatePlayerState`,
//! `updateRoomState`, `kickPlayer`) are implemented here even though the
//! retrieved `RoomService.cpp` only shows `createRoom`/`leaveRoom` bodies;
//! their call sites pin down the required semantics.

use crate::types::{PlayerState, Room, RoomMember, RoomState};
use flux::logging::{self, Logger};
use protocol::packets::{S2CCreateRoomResult, S2CLeaveRoomAck, S2CPlayerLeftNotification};
use protocol::ResultCode;
use std::collections::HashMap;
use std::sync::Mutex;

/// `leaveRoom`'s reply plus whichever notification needs relaying, mirroring
/// the original's `LeaveRoomResult` (ack for the leaver, broadcast for
/// whoever's left behind).
pub struct LeaveOutcome {
    pub ack: S2CLeaveRoomAck,
    /// `(connection_id, notification)` for the remaining player, if any.
    pub notify: Option<(usize, S2CPlayerLeftNotification)>,
}

pub struct RoomService {
    rooms: Mutex<HashMap<u32, Room>>,
    next_room_id: Mutex<u32>,
    log: Logger,
}

impl RoomService {
    pub fn new(log: &Logger) -> RoomService {
        RoomService {
            rooms: Mutex::new(HashMap::new()),
            next_room_id: Mutex::new(1),
            log: log.new(logging::o!("component" => "room")),
        }
    }

    pub fn create_room(&self, username: &str, connection_id: usize, room_name: &str) -> S2CCreateRoomResult {
        if room_name.is_empty() {
            return S2CCreateRoomResult {
                code: ResultCode::Invalid,
                message: "Room name cannot be empty".into(),
                room_id: 0,
            };
        }

        let mut rooms = self.rooms.lock().unwrap();
        let mut next_id = self.next_room_id.lock().unwrap();
        let room_id = *next_id;
        *next_id += 1;

        rooms.insert(
            room_id,
            Room {
                id: room_id,
                name: room_name.to_string(),
                host_username: username.to_string(),
                members: vec![RoomMember {
                    username: username.to_string(),
                    connection_id,
                    state: PlayerState::Preparing,
                }],
                state: RoomState::Lobby,
            },
        );

        logging::info!(self.log, "room created"; "room_id" => room_id, "host" => username);
        S2CCreateRoomResult {
            code: ResultCode::Ok,
            message: "Room created successfully".into(),
            room_id,
        }
    }

    pub fn leave_room(&self, username: &str, room_id: u32) -> LeaveOutcome {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(&room_id) {
            Some(r) => r,
            None => {
                return LeaveOutcome {
                    ack: S2CLeaveRoomAck {
                        code: ResultCode::NotFound,
                        message: "Room not found".into(),
                    },
                    notify: None,
                }
            }
        };

        let was_host = room.host_username == username;
        let before = room.members.len();
        room.members.retain(|m| m.username != username);

        if room.members.len() == before {
            return LeaveOutcome {
                ack: S2CLeaveRoomAck {
                    code: ResultCode::Invalid,
                    message: "User not in room".into(),
                },
                notify: None,
            };
        }

        let ack = S2CLeaveRoomAck {
            code: ResultCode::Ok,
            message: "Left room successfully".into(),
        };

        if !was_host {
            let notify = room.members.iter().find(|m| m.username == room.host_username).map(|host| {
                (
                    host.connection_id,
                    S2CPlayerLeftNotification {
                        username: username.to_string(),
                        is_new_host: false,
                        message: "Opponent left the room".into(),
                    },
                )
            });
            return LeaveOutcome { ack, notify };
        }

        if room.members.is_empty() {
            rooms.remove(&room_id);
            logging::info!(self.log, "room deleted (empty)"; "room_id" => room_id);
            return LeaveOutcome { ack, notify: None };
        }

        let new_host = room.members[0].username.clone();
        room.host_username = new_host.clone();
        let new_host_conn = room.members[0].connection_id;
        logging::info!(self.log, "new host assigned"; "room_id" => room_id, "host" => new_host.as_str());

        LeaveOutcome {
            ack,
            notify: Some((
                new_host_conn,
                S2CPlayerLeftNotification {
                    username: username.to_string(),
                    is_new_host: true,
                    message: "Host left, you are now the host".into(),
                },
            )),
        }
    }

    pub fn get_room(&self, room_id: u32) -> Option<Room> {
        self.rooms.lock().unwrap().get(&room_id).cloned()
    }

    pub fn is_user_in_room(&self, username: &str) -> bool {
        self.rooms.lock().unwrap().values().any(|r| r.member(username).is_some())
    }

    pub fn room_by_username(&self, username: &str) -> Option<Room> {
        self.rooms
            .lock()
            .unwrap()
            .values()
            .find(|r| r.member(username).is_some())
            .cloned()
    }

    pub fn join_room(&self, room_id: u32, username: &str, connection_id: usize) -> S2CCreateRoomResult {
        let mut rooms = self.rooms.lock().unwrap();
        let room = match rooms.get_mut(&room_id) {
            Some(r) => r,
            None => {
                return S2CCreateRoomResult {
                    code: ResultCode::NotFound,
                    message: "Room not found".into(),
                    room_id: 0,
                }
            }
        };

        if room.members.iter().any(|m| m.username == username) {
            return S2CCreateRoomResult {
                code: ResultCode::Already,
                message: "Already in room".into(),
                room_id,
            };
        }
        if room.state != RoomState::Lobby || room.members.len() != 1 {
            return S2CCreateRoomResult {
                code: ResultCode::Fail,
                message: "Room is not joinable".into(),
                room_id,
            };
        }

        room.members.push(RoomMember {
            username: username.to_string(),
            connection_id,
            state: PlayerState::Preparing,
        });

        S2CCreateRoomResult {
            code: ResultCode::Ok,
            message: "Joined room successfully".into(),
            room_id,
        }
    }

    pub fn update_player_state(&self, room_id: u32, username: &str, state: PlayerState) {
        if let Some(room) = self.rooms.lock().unwrap().get_mut(&room_id) {
            if let Some(member) = room.member_mut(username) {
                member.state = state;
            }
        }
    }

    pub fn update_room_state(&self, room_id: u32, state: RoomState) {
        if let Some(room) = self.rooms.lock().unwrap().get_mut(&room_id) {
            room.state = state;
        }
    }

    pub fn kick_player(&self, room_id: u32, target_username: &str) {
        if let Some(room) = self.rooms.lock().unwrap().get_mut(&room_id) {
            room.members.retain(|m| m.username != target_username);
        }
    }

    /// Removes `username` from whatever room they're in, as a disconnect
    /// cleanup path. Returns the same outcome `leave_room` would, if they
    /// were in one.
    pub fn handle_disconnect(&self, username: &str) -> Option<LeaveOutcome> {
        let room_id = self.room_by_username(username)?.id;
        Some(self.leave_room(username, room_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> RoomService {
        RoomService::new(&logging::init("error"))
    }

    #[test]
    fn create_then_join_then_leave_as_guest() {
        let svc = service();
        let created = svc.create_room("alice", 1, "alice's room");
        assert_eq!(created.code, ResultCode::Ok);

        let joined = svc.join_room(created.room_id, "bob", 2);
        assert_eq!(joined.code, ResultCode::Ok);

        let outcome = svc.leave_room("bob", created.room_id);
        assert_eq!(outcome.ack.code, ResultCode::Ok);
        let (conn, notif) = outcome.notify.unwrap();
        assert_eq!(conn, 1);
        assert!(!notif.is_new_host);
    }

    #[test]
    fn host_leaving_promotes_remaining_player() {
        let svc = service();
        let created = svc.create_room("alice", 1, "alice's room");
        svc.join_room(created.room_id, "bob", 2);

        let outcome = svc.leave_room("alice", created.room_id);
        assert_eq!(outcome.ack.code, ResultCode::Ok);
        let (conn, notif) = outcome.notify.unwrap();
        assert_eq!(conn, 2);
        assert!(notif.is_new_host);

        let room = svc.get_room(created.room_id).unwrap();
        assert_eq!(room.host_username, "bob");
    }

    #[test]
    fn last_player_leaving_deletes_room() {
        let svc = service();
        let created = svc.create_room("alice", 1, "alice's room");
        let outcome = svc.leave_room("alice", created.room_id);
        assert!(outcome.notify.is_none());
        assert!(svc.get_room(created.room_id).is_none());
    }

    #[test]
    fn join_room_full_is_rejected() {
        let svc = service();
        let created = svc.create_room("alice", 1, "room");
        svc.join_room(created.room_id, "bob", 2);
        let third = svc.join_room(created.room_id, "carol", 3);
        assert_eq!(third.code, ResultCode::Fail);
    }
}
