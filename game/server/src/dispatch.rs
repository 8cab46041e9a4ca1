//! Packet-type to service-call table, grounded on
//! `examples/original_source/backend/src/network/Server.cpp`'s `processPacket`
//! switch (which packet maps to which task) and on each service's call sites
//! for what a successful/failed call replies with. Runs entirely on a worker
//! thread: decodes the typed payload, calls into [`services::Services`], and
//! returns a [`JobResult`] for the reactor to turn into socket writes.

use crate::workerpool::{Job, JobResult};
use flux::logging::{self, Logger};
use netio::connection::ConnectionId;
use protocol::frame;
use protocol::packets::*;
use services::match_service::MatchError;
use services::Services;

fn encode<P: Packet>(packet: &P) -> Vec<u8> {
    let (code, payload) = packet.encode();
    frame::encode(code, &payload)
}

fn error_bytes(for_type: PacketType, message: impl Into<String>) -> Vec<u8> {
    encode(&S2CError {
        for_type: for_type.code(),
        message: message.into(),
    })
}

fn match_error_message(err: MatchError) -> &'static str {
    match err {
        MatchError::NotFound => "match not found",
        MatchError::NotInMatch => "you are not a player in this match",
        MatchError::NotYourTurn => "not your turn",
        MatchError::AlreadyFinished => "match already finished for you",
    }
}

/// Bare reply, no broadcasts; the common case for auth/lobby acks.
fn solo(connection_id: ConnectionId, seq: u64, bytes: Vec<u8>) -> JobResult {
    JobResult {
        connection_id,
        seq,
        reply: Some(bytes),
        broadcasts: Vec::new(),
    }
}

fn empty(connection_id: ConnectionId, seq: u64) -> JobResult {
    JobResult {
        connection_id,
        seq,
        reply: None,
        broadcasts: Vec::new(),
    }
}

pub fn handle(job: Job, services: &Services, log: &Logger) -> JobResult {
    let Job {
        connection_id,
        seq,
        packet_type,
        payload,
    } = job;

    match packet_type {
        PacketType::C2SRegister => match C2SRegister::decode(&payload) {
            Ok(req) => solo(connection_id, seq, encode(&services.auth.register(&req.username, &req.password))),
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SLogin => match C2SLogin::decode(&payload) {
            Ok(req) => solo(
                connection_id,
                seq,
                encode(&services.auth.login(&req.username, &req.password, connection_id.0)),
            ),
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SLogout => match C2SLogout::decode(&payload) {
            Ok(req) => solo(connection_id, seq, encode(&services.auth.logout(&req.session_token))),
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SCreateRoom => match C2SCreateRoom::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => solo(
                    connection_id,
                    seq,
                    encode(&services.room.create_room(&username, connection_id.0, &req.room_name)),
                ),
                None => solo(connection_id, seq, encode(&auth_fail_room_result())),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SLeaveRoom => match C2SLeaveRoom::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => {
                    let outcome = services.room.leave_room(&username, req.room_id);
                    let mut result = solo(connection_id, seq, encode(&outcome.ack));
                    if let Some((target_conn, notification)) = outcome.notify {
                        result.broadcasts.push((ConnectionId(target_conn), encode(&notification)));
                    }
                    result
                }
                None => solo(
                    connection_id,
                    seq,
                    encode(&S2CLeaveRoomAck {
                        code: protocol::ResultCode::AuthFail,
                        message: "invalid session".into(),
                    }),
                ),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRequestOnlineList => match C2SRequestOnlineList::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => solo(connection_id, seq, encode(&services.beforeplay.online_list(&username))),
                None => solo(connection_id, seq, encode(&S2COnlineList { usernames: Vec::new() })),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SKickPlayer => match C2SKickPlayer::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => {
                    let outcome = services.beforeplay.kick_player(&username, req.room_id, &req.target_username);
                    let mut result = solo(connection_id, seq, encode(&outcome.result));
                    if let Some(target) = outcome.target_username {
                        if let Some(target_conn) = services.auth.connection_id_of(&target) {
                            result
                                .broadcasts
                                .push((ConnectionId(target_conn), encode(&outcome.result)));
                        }
                    }
                    result
                }
                None => solo(
                    connection_id,
                    seq,
                    encode(&S2CKickResult {
                        code: protocol::ResultCode::AuthFail,
                        message: "invalid session".into(),
                        target_username: req.target_username.clone(),
                    }),
                ),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SSendInvite => match C2SSendInvite::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => {
                    let outcome = services.beforeplay.send_invite(&username, &req.target_username, req.room_id);
                    match outcome.to_target {
                        Some((target, packet)) => {
                            let mut result = empty(connection_id, seq);
                            if let Some(target_conn) = services.auth.connection_id_of(&target) {
                                result.broadcasts.push((ConnectionId(target_conn), encode(&packet)));
                            }
                            result
                        }
                        None => solo(
                            connection_id,
                            seq,
                            error_bytes(packet_type, outcome.error.unwrap_or_else(|| "invite failed".into())),
                        ),
                    }
                }
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRespondInvite => match C2SRespondInvite::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => {
                    let outcome = services.beforeplay.respond_invite(&username, &req.from_username, req.accept);
                    let mut result = match outcome.join_result {
                        Some((_, create_room_result)) => solo(connection_id, seq, encode(&create_room_result)),
                        None => empty(connection_id, seq),
                    };
                    let (sender, response_packet) = outcome.to_sender;
                    if let Some(sender_conn) = services.auth.connection_id_of(&sender) {
                        result.broadcasts.push((ConnectionId(sender_conn), encode(&response_packet)));
                    }
                    result
                }
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SSetReady => match C2SSetReady::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => {
                    let outcome = services.beforeplay.set_ready(&username, req.room_id, req.ready);
                    let mut result = solo(
                        connection_id,
                        seq,
                        encode(&S2CAck {
                            ack_for_type: PacketType::C2SSetReady.code(),
                            code: outcome.ack,
                            message: outcome.ack_message,
                        }),
                    );
                    if let Some((host, update)) = outcome.to_host {
                        if let Some(host_conn) = services.auth.connection_id_of(&host) {
                            result.broadcasts.push((ConnectionId(host_conn), encode(&update)));
                        }
                    }
                    result
                }
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SStartGame => match C2SStartGame::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => match services.beforeplay.start_game(&username, req.room_id) {
                    Ok(outcome) => {
                        let mut result = solo(connection_id, seq, encode(&outcome.host_packet));
                        let (opponent, opponent_packet) = outcome.opponent_packet;
                        if let Some(opp_conn) = services.auth.connection_id_of(&opponent) {
                            result.broadcasts.push((ConnectionId(opp_conn), encode(&opponent_packet)));
                        }
                        result
                    }
                    Err(message) => solo(connection_id, seq, error_bytes(packet_type, message)),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SGuessChar => match C2SGuessChar::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => match services.match_service.guess_char(&username, req.room_id, req.ch) {
                    Ok(outcome) => {
                        let mut result = solo(connection_id, seq, encode(&outcome.guesser));
                        if let Some((opponent, packet)) = outcome.opponent {
                            if let Some(opp_conn) = services.auth.connection_id_of(&opponent) {
                                result.broadcasts.push((ConnectionId(opp_conn), encode(&packet)));
                            }
                        }
                        result
                    }
                    Err(e) => solo(connection_id, seq, error_bytes(packet_type, match_error_message(e))),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SGuessWord => match C2SGuessWord::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => match services.match_service.guess_word(&username, req.room_id, &req.word) {
                    Ok(outcome) => {
                        let mut result = solo(connection_id, seq, encode(&outcome.guesser));
                        if let Some((opponent, packet)) = outcome.opponent {
                            if let Some(opp_conn) = services.auth.connection_id_of(&opponent) {
                                result.broadcasts.push((ConnectionId(opp_conn), encode(&packet)));
                            }
                        }
                        result
                    }
                    Err(e) => solo(connection_id, seq, error_bytes(packet_type, match_error_message(e))),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRequestDraw => match C2SRequestDraw::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => match services.match_service.request_draw(&username, req.room_id) {
                    Ok(outcome) => {
                        let mut result = empty(connection_id, seq);
                        if let Some(opponent) = outcome.opponent_username {
                            if let Some(opp_conn) = services.auth.connection_id_of(&opponent) {
                                let notice = S2CDrawRequest {
                                    from_username: username,
                                    match_id: req.match_id,
                                };
                                result.broadcasts.push((ConnectionId(opp_conn), encode(&notice)));
                            }
                        }
                        result
                    }
                    Err(e) => solo(connection_id, seq, error_bytes(packet_type, match_error_message(e))),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SEndGame => match C2SEndGame::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => match services.match_service.end_game(&username, req.room_id, req.result_code) {
                    Ok(outcome) => {
                        let packet = S2CGameEnd {
                            match_id: req.match_id,
                            result_code: req.result_code,
                            summary: "Game Over".into(),
                        };
                        let mut result = solo(connection_id, seq, encode(&packet));
                        if let Some(opponent) = outcome.opponent_username {
                            if let Some(opp_conn) = services.auth.connection_id_of(&opponent) {
                                result.broadcasts.push((ConnectionId(opp_conn), encode(&packet)));
                            }
                        }
                        result
                    }
                    Err(e) => solo(connection_id, seq, error_bytes(packet_type, match_error_message(e))),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRequestSummary => match C2SRequestSummary::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(_username) => match services.match_service.request_summary(req.room_id) {
                    Some(summary) => solo(connection_id, seq, encode(&summary)),
                    None => solo(connection_id, seq, error_bytes(packet_type, "match not found")),
                },
                None => solo(connection_id, seq, error_bytes(packet_type, "invalid session")),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRequestHistory => match C2SRequestHistory::decode(&payload) {
            Ok(req) => match services.auth.validate_session(&req.token) {
                Some(username) => solo(connection_id, seq, encode(&services.summary.request_history(&username))),
                None => solo(connection_id, seq, encode(&S2CHistoryList { entries: Vec::new() })),
            },
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        PacketType::C2SRequestLeaderboard => match C2SRequestLeaderboard::decode(&payload) {
            Ok(_req) => solo(connection_id, seq, encode(&services.summary.request_leaderboard())),
            Err(_) => solo(connection_id, seq, error_bytes(packet_type, "parse error")),
        },

        other => {
            logging::warn!(log, "unhandled packet type reached dispatch"; "type" => format!("{:?}", other));
            empty(connection_id, seq)
        }
    }
}

fn auth_fail_room_result() -> S2CCreateRoomResult {
    S2CCreateRoomResult {
        code: protocol::ResultCode::AuthFail,
        message: "invalid session".into(),
        room_id: 0,
    }
}
