//! End-to-end scenarios exercised against the service layer directly,
//! bypassing the network stack (reactor/dispatch), matching the teacher's
//! preference for integration tests that construct real services against a
//! temp directory rather than mocking them.

use flux::logging;
use protocol::ResultCode;
use services::auth::Sha256Hasher;
use services::words::FirstWord;
use services::Services;
use tempfile::tempdir;

/// Builds a fresh `Services` backed by an empty temp data dir and the
/// deterministic `FirstWord` selector, so every match's words fall back to
/// the fixed GAME / COMPUTER / PROGRAMMING corpus.
fn new_services() -> Services {
    let dir = tempdir().unwrap();
    let log = logging::init("error");
    let services = Services::with_selector(dir.path(), Box::new(Sha256Hasher), Box::new(FirstWord), &log).unwrap();
    // Keep the temp dir alive for the life of the process; each test gets its own.
    std::mem::forget(dir);
    services
}

/// Registers alice and bob, logs both in, puts them in a room together, and
/// starts the match. Returns the room/match id (they're the same number).
fn start_two_player_match(svc: &Services) -> u32 {
    svc.auth.register("alice", "hunter2");
    svc.auth.register("bob", "hunter2");
    svc.auth.login("alice", "hunter2", 1);
    svc.auth.login("bob", "hunter2", 2);

    let room = svc.room.create_room("alice", 1, "alice's room");
    svc.room.join_room(room.room_id, "bob", 2);
    svc.beforeplay.set_ready("bob", room.room_id, true);
    let started = svc.beforeplay.start_game("alice", room.room_id).unwrap();
    assert_eq!(started.host_packet.opponent_username, "bob");
    room.room_id
}

#[test]
fn register_login_round_trip_invalidates_prior_token_on_relogin() {
    let svc = new_services();

    let reg = svc.auth.register("alice", "hunter2");
    assert_eq!(reg.code, ResultCode::Ok);

    let first_login = svc.auth.login("alice", "hunter2", 1);
    assert_eq!(first_login.code, ResultCode::Ok);
    assert_eq!(svc.auth.validate_session(&first_login.session_token).as_deref(), Some("alice"));

    let second_login = svc.auth.login("alice", "hunter2", 2);
    assert!(svc.auth.validate_session(&first_login.session_token).is_none());
    assert_eq!(svc.auth.validate_session(&second_login.session_token).as_deref(), Some("alice"));
}

#[test]
fn host_leaving_a_room_promotes_the_remaining_player() {
    let svc = new_services();
    svc.auth.register("alice", "hunter2");
    svc.auth.register("bob", "hunter2");
    svc.auth.login("alice", "hunter2", 1);
    svc.auth.login("bob", "hunter2", 2);

    let room = svc.room.create_room("alice", 1, "alice's room");
    svc.room.join_room(room.room_id, "bob", 2);

    let outcome = svc.room.leave_room("alice", room.room_id);
    assert_eq!(outcome.ack.code, ResultCode::Ok);

    let (notified_conn, notification) = outcome.notify.expect("bob should be notified of the promotion");
    assert_eq!(notified_conn, 2);
    assert!(notification.is_new_host);
    assert_eq!(svc.room.get_room(room.room_id).unwrap().host_username, "bob");
}

#[test]
fn character_guesses_complete_a_round_and_retain_the_guessers_turn() {
    let svc = new_services();
    let room_id = start_two_player_match(&svc);

    // Round 1's fallback word (FirstWord selector, no corpus files) is GAME.
    let mut last = None;
    for ch in [b'G', b'A', b'M', b'E'] {
        last = Some(svc.match_service.guess_char("alice", room_id, ch).unwrap());
    }
    let outcome = last.unwrap();

    assert!(outcome.guesser.correct);
    assert_eq!(outcome.guesser.current_round, 2, "completing GAME should advance to round 2");
    assert!(outcome.guesser.is_your_turn, "the player who closed out the round keeps the turn");
}

#[test]
fn word_guess_wins_round_three_case_insensitively() {
    let svc = new_services();
    let room_id = start_two_player_match(&svc);

    let round1 = svc.match_service.guess_word("alice", room_id, "game").unwrap();
    assert!(round1.guesser.correct);
    assert!(round1.guesser.round_complete);
    assert_eq!(round1.guesser.current_round, 2);
    assert!(round1.guesser.is_your_turn);

    let round2 = svc.match_service.guess_word("alice", room_id, "COMPUTER").unwrap();
    assert!(round2.guesser.correct);
    assert_eq!(round2.guesser.current_round, 3);

    let round3 = svc.match_service.guess_word("alice", room_id, "PrOgRaMmInG").unwrap();
    assert!(round3.guesser.correct, "comparison against the stored word is case-insensitive");
    assert_eq!(round3.guesser.current_round, 3, "round three completion does not advance past it");
}

#[test]
fn resignation_awards_the_opponent_a_win_and_records_history_for_both() {
    let svc = new_services();
    let room_id = start_two_player_match(&svc);

    let bob_before = svc.auth.all_users().into_iter().find(|u| u.username == "bob").unwrap();

    let outcome = svc.match_service.end_game("alice", room_id, 0).unwrap();
    assert_eq!(outcome.opponent_username.as_deref(), Some("bob"));

    let bob_after = svc.auth.all_users().into_iter().find(|u| u.username == "bob").unwrap();
    assert_eq!(bob_after.wins, bob_before.wins + 1);
    assert_eq!(bob_after.total_points, bob_before.total_points + 10);

    let bob_history = svc.summary.request_history("bob");
    assert_eq!(bob_history.entries.len(), 1);
    assert_eq!(bob_history.entries[0].result, 1, "bob's row records a win");

    let alice_history = svc.summary.request_history("alice");
    assert_eq!(alice_history.entries.len(), 1);
    assert_eq!(alice_history.entries[0].result, 0, "alice's row records the resignation as a loss");
}

#[test]
fn disconnecting_cleans_up_the_session_and_the_room_membership() {
    let svc = new_services();
    svc.auth.register("alice", "hunter2");
    svc.auth.register("bob", "hunter2");
    let alice_login = svc.auth.login("alice", "hunter2", 1);
    svc.auth.login("bob", "hunter2", 2);

    let room = svc.room.create_room("alice", 1, "alice's room");
    svc.room.join_room(room.room_id, "bob", 2);

    svc.auth.handle_disconnect(1);
    assert!(svc.auth.validate_session(&alice_login.session_token).is_none());

    let outcome = svc.room.handle_disconnect("alice").expect("alice was in a room");
    let (_, notification) = outcome.notify.expect("bob should be promoted and notified");
    assert!(notification.is_new_host);
    assert_eq!(svc.room.get_room(room.room_id).unwrap().host_username, "bob");
}
