//! The three-round guessing engine, grounded on
//! `examples/original_source/backend/src/service/MatchService.cpp`.
//!
//! Callers are expected to have already resolved a session token to a
//! username via [`crate::auth::AuthService::validate_session`] before
//! calling into here, matching the pattern used by `room`/`beforeplay`.

use crate::auth::AuthService;
use crate::store::HistoryStore;
use crate::types::{HistoryRow, Match, PlayerMatchState, CHAR_POINTS, WORD_BONUS, WORD_PENALTY};
use crate::words::{WordLists, WordSelection};
use flux::logging::{self, Logger};
use protocol::packets::{S2CGameSummary, S2CGuessCharResult, S2CGuessWordResult};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MatchError {
    NotFound,
    NotInMatch,
    NotYourTurn,
    AlreadyFinished,
}

pub struct StartedMatch {
    pub round1_word_length: usize,
}

pub struct GuessCharOutcome {
    pub guesser: S2CGuessCharResult,
    /// Opponent's parallel view of the same shared pattern, if one exists.
    pub opponent: Option<(String, S2CGuessCharResult)>,
}

pub struct GuessWordOutcome {
    pub guesser: S2CGuessWordResult,
    pub opponent: Option<(String, S2CGuessWordResult)>,
}

pub struct DrawRequestOutcome {
    pub opponent_username: Option<String>,
}

/// `result_code` on `C2S_EndGame`: 0 = resignation, 1 = win, 2 = loss, 3 = draw.
pub struct EndGameOutcome {
    pub opponent_username: Option<String>,
}

pub struct MatchService {
    matches: Mutex<HashMap<u32, Match>>,
    word_lists: WordLists,
    selector: Box<dyn WordSelection>,
    auth: Arc<AuthService>,
    history: Arc<HistoryStore>,
    log: Logger,
}

impl MatchService {
    pub fn new(
        word_lists: WordLists,
        selector: Box<dyn WordSelection>,
        auth: Arc<AuthService>,
        history: Arc<HistoryStore>,
        log: &Logger,
    ) -> MatchService {
        MatchService {
            matches: Mutex::new(HashMap::new()),
            word_lists,
            selector,
            auth,
            history,
            log: log.new(logging::o!("component" => "match")),
        }
    }

    pub fn start_match(&self, room_id: u32, players: Vec<String>) -> StartedMatch {
        let round_words = [
            self.word_lists.pick(1, self.selector.as_ref()),
            self.word_lists.pick(2, self.selector.as_ref()),
            self.word_lists.pick(3, self.selector.as_ref()),
        ];
        let round1_len = round_words[0].len();

        let current_turn = players.first().cloned().unwrap_or_default();
        let mut player_states = HashMap::new();
        for p in &players {
            player_states.insert(p.clone(), PlayerMatchState::new(p.clone()));
        }

        let m = Match {
            match_id: room_id,
            room_id,
            round_words,
            current_round: 1,
            revealed_chars: BTreeSet::new(),
            current_turn,
            players: player_states,
            player_order: players.clone(),
            active: true,
        };

        logging::info!(self.log, "match started"; "room_id" => room_id,
            "round1" => m.round_words[0].as_str(), "first_turn" => m.current_turn.as_str());

        self.matches.lock().unwrap().insert(room_id, m);
        StartedMatch {
            round1_word_length: round1_len,
        }
    }

    pub fn guess_char(&self, username: &str, room_id: u32, ch: u8) -> Result<GuessCharOutcome, MatchError> {
        let mut matches = self.matches.lock().unwrap();
        let m = matches.get_mut(&room_id).filter(|m| m.active).ok_or(MatchError::NotFound)?;

        if !m.players.contains_key(username) {
            return Err(MatchError::NotInMatch);
        }
        if m.current_turn != username {
            return Err(MatchError::NotYourTurn);
        }
        if m.players[username].finished {
            return Err(MatchError::AlreadyFinished);
        }

        let opponent_username = m.opponent_of(username).map(str::to_string);
        let word = m.current_word().to_string();
        let correct = word.as_bytes().contains(&ch);

        let mut score_gained = 0u32;
        if correct {
            m.revealed_chars.insert(ch);
            let occurrences = word.bytes().filter(|&c| c == ch).count() as u32;
            score_gained = CHAR_POINTS[(m.current_round - 1) as usize] * occurrences;
            let state = m.players.get_mut(username).unwrap();
            state.score += score_gained;
            state.round_scores[(m.current_round - 1) as usize] += score_gained;
        } else {
            let state = m.players.get_mut(username).unwrap();
            if state.remaining_attempts > 0 {
                state.remaining_attempts -= 1;
            }
        }
        m.players.get_mut(username).unwrap().guessed_chars.insert(ch);

        let won = word.bytes().all(|c| m.revealed_chars.contains(&c));
        let mut switch_turn = true;

        if won || m.players[username].remaining_attempts == 0 {
            switch_turn = false;
            if m.current_round < 3 {
                let completed_round = m.current_round;
                m.advance_round();
                logging::info!(self.log, "round transition via char guess"; "room_id" => room_id,
                    "completed_round" => completed_round, "by" => username);
            } else {
                let state = m.players.get_mut(username).unwrap();
                state.finished = true;
                state.won = won;
            }
        }

        if switch_turn {
            if let Some(ref opp) = opponent_username {
                m.current_turn = opp.clone();
            }
        }

        let fresh = m.players[username].clone();
        let exposed = exposed_pattern(m.current_word().as_bytes(), &m.revealed_chars);
        let guesser = S2CGuessCharResult {
            correct,
            exposed_pattern: exposed.clone(),
            remaining_attempts: fresh.remaining_attempts,
            score_gained,
            total_score: fresh.score,
            current_round: m.current_round,
            is_your_turn: m.current_turn == username,
        };

        let opponent = opponent_username.map(|opp| {
            let opp_state = m.players[&opp].clone();
            (
                opp.clone(),
                S2CGuessCharResult {
                    correct,
                    exposed_pattern: exposed,
                    remaining_attempts: opp_state.remaining_attempts,
                    score_gained: 0,
                    total_score: opp_state.score,
                    current_round: m.current_round,
                    is_your_turn: m.current_turn == opp,
                },
            )
        });

        Ok(GuessCharOutcome { guesser, opponent })
    }

    pub fn guess_word(&self, username: &str, room_id: u32, guess: &str) -> Result<GuessWordOutcome, MatchError> {
        let mut matches = self.matches.lock().unwrap();
        let m = matches.get_mut(&room_id).filter(|m| m.active).ok_or(MatchError::NotFound)?;

        if !m.players.contains_key(username) {
            return Err(MatchError::NotInMatch);
        }
        if m.current_turn != username {
            return Err(MatchError::NotYourTurn);
        }
        if m.players[username].finished {
            return Err(MatchError::AlreadyFinished);
        }

        let opponent_username = m.opponent_of(username).map(str::to_string);
        let round_idx = (m.current_round - 1) as usize;
        let word = m.current_word().to_string();
        let correct = guess.to_uppercase() == word;

        let mut score_gained = 0u32;
        if correct {
            score_gained = WORD_BONUS[round_idx];
            let state = m.players.get_mut(username).unwrap();
            state.score += score_gained;
            state.round_scores[round_idx] += score_gained;
        } else {
            let penalty = WORD_PENALTY[round_idx];
            let state = m.players.get_mut(username).unwrap();
            if state.score >= penalty {
                state.score -= penalty;
                if state.round_scores[round_idx] >= penalty {
                    state.round_scores[round_idx] -= penalty;
                }
            } else {
                state.score = 0;
            }
            if state.remaining_attempts > 0 {
                state.remaining_attempts -= 1;
            }
        }

        let mut switch_turn = true;
        let mut round_complete = false;
        let mut next_word_pattern = String::new();
        let mut message;

        if correct {
            switch_turn = false;
            if m.current_round < 3 {
                round_complete = true;
                message = format!("Correct! Moving to Round {}!", m.current_round + 1);
                m.advance_round();
                next_word_pattern = exposed_pattern(m.current_word().as_bytes(), &BTreeSet::new());
            } else {
                let state = m.players.get_mut(username).unwrap();
                state.finished = true;
                state.won = true;
                message = format!("Correct! You completed all 3 rounds with score {}!", state.score);
            }
        } else {
            let penalty = WORD_PENALTY[round_idx];
            message = format!("Incorrect! Lost {} points", penalty);
            if m.players[username].remaining_attempts == 0 {
                switch_turn = false;
                if m.current_round < 3 {
                    round_complete = true;
                    message.push_str(&format!(". Out of attempts! Moving to Round {}.", m.current_round + 1));
                    m.advance_round();
                    next_word_pattern = exposed_pattern(m.current_word().as_bytes(), &BTreeSet::new());
                } else {
                    let state = m.players.get_mut(username).unwrap();
                    state.finished = true;
                    state.won = false;
                    message = format!("Out of attempts! Final score: {}", state.score);
                }
            }
        }

        if switch_turn {
            if let Some(ref opp) = opponent_username {
                m.current_turn = opp.clone();
            }
        }

        let fresh = m.players[username].clone();
        let guesser = S2CGuessWordResult {
            correct,
            message,
            remaining_attempts: fresh.remaining_attempts,
            score_gained,
            total_score: fresh.score,
            current_round: m.current_round,
            round_complete,
            next_word_pattern: next_word_pattern.clone(),
            is_your_turn: m.current_turn == username,
        };

        let opponent = opponent_username.map(|opp| {
            let opp_state = m.players[&opp].clone();
            (
                opp.clone(),
                S2CGuessWordResult {
                    correct: false,
                    message: String::new(),
                    remaining_attempts: opp_state.remaining_attempts,
                    score_gained: 0,
                    total_score: opp_state.score,
                    current_round: m.current_round,
                    round_complete,
                    next_word_pattern,
                    is_your_turn: m.current_turn == opp,
                },
            )
        });

        Ok(GuessWordOutcome { guesser, opponent })
    }

    pub fn request_draw(&self, username: &str, room_id: u32) -> Result<DrawRequestOutcome, MatchError> {
        let matches = self.matches.lock().unwrap();
        let m = matches.get(&room_id).ok_or(MatchError::NotFound)?;
        Ok(DrawRequestOutcome {
            opponent_username: m.opponent_of(username).map(str::to_string),
        })
    }

    /// `result_code`: 0 = resignation, 1 = win, 2 = loss, 3 = draw.
    pub fn end_game(&self, username: &str, room_id: u32, result_code: u8) -> Result<EndGameOutcome, MatchError> {
        let opponent_username = {
            let matches = self.matches.lock().unwrap();
            let m = matches.get(&room_id).ok_or(MatchError::NotFound)?;
            m.opponent_of(username).map(str::to_string)
        };

        let (points, is_win) = match result_code {
            1 => (10, true),
            3 => (1, false),
            _ => (0, false),
        };
        self.auth.update_stats(username, is_win, points);

        let round_scores = {
            let matches = self.matches.lock().unwrap();
            matches
                .get(&room_id)
                .and_then(|m| m.players.get(username))
                .map(|s| s.round_scores)
        };
        self.save_history(username, opponent_username.as_deref().unwrap_or(""), history_result(result_code), round_scores);

        if result_code == 0 {
            if let Some(ref opp) = opponent_username {
                self.auth.update_stats(opp, true, 10);
                let opp_scores = {
                    let matches = self.matches.lock().unwrap();
                    matches.get(&room_id).and_then(|m| m.players.get(opp.as_str())).map(|s| s.round_scores)
                };
                self.save_history(opp, username, 1, opp_scores);
            }
        } else if result_code == 3 {
            if let Some(ref opp) = opponent_username {
                self.auth.update_stats(opp, false, 1);
                let opp_scores = {
                    let matches = self.matches.lock().unwrap();
                    matches.get(&room_id).and_then(|m| m.players.get(opp.as_str())).map(|s| s.round_scores)
                };
                self.save_history(opp, username, 2, opp_scores);
            }
        }

        if let Some(m) = self.matches.lock().unwrap().get_mut(&room_id) {
            m.active = false;
        }

        Ok(EndGameOutcome { opponent_username })
    }

    /// Stores a `HistoryRow`; `result` is the row's own 0=lose/1=win/2=draw
    /// code (distinct from `C2S_EndGame`'s 0..=3 `result_code`), already
    /// resolved by the caller via [`history_result`] or passed literally.
    fn save_history(&self, username: &str, opponent: &str, result: u8, round_scores: Option<[u32; 3]>) {
        let scores = round_scores.unwrap_or([0, 0, 0]);
        let row = HistoryRow {
            datetime: format_now(),
            opponent: opponent.to_string(),
            result,
            r1: scores[0],
            r2: scores[1],
            r3: scores[2],
        };
        if let Err(e) = self.history.append(username, &row) {
            logging::warn!(self.log, "failed to persist history row"; "username" => username, "err" => %e);
        }
    }

    pub fn request_summary(&self, room_id: u32) -> Option<S2CGameSummary> {
        let matches = self.matches.lock().unwrap();
        let m = matches.get(&room_id)?;
        if m.player_order.len() != 2 {
            return None;
        }

        let p1 = &m.player_order[0];
        let p2 = &m.player_order[1];
        let s1 = m.players.get(p1)?;
        let s2 = m.players.get(p2)?;

        let winner_username = if s1.score > s2.score {
            p1.clone()
        } else if s2.score > s1.score {
            p2.clone()
        } else {
            String::new()
        };

        Some(S2CGameSummary {
            match_id: m.match_id,
            player1: p1.clone(),
            player2: p2.clone(),
            r1_p1: s1.round_scores[0],
            r2_p1: s1.round_scores[1],
            r3_p1: s1.round_scores[2],
            r1_p2: s2.round_scores[0],
            r2_p2: s2.round_scores[1],
            r3_p2: s2.round_scores[2],
            total_p1: s1.score,
            total_p2: s2.score,
            winner_username,
        })
    }

    pub fn handle_disconnect(&self, username: &str) {
        let mut matches = self.matches.lock().unwrap();
        for m in matches.values_mut() {
            if m.players.contains_key(username) {
                m.active = false;
            }
        }
    }
}

/// Maps a `C2S_EndGame` `result_code` (0=resignation, 1=win, 2=loss, 3=draw)
/// to the caller's own `HistoryRow::result` (0=lose, 1=win, 2=draw).
fn history_result(result_code: u8) -> u8 {
    match result_code {
        1 => 1,
        3 => 2,
        _ => 0,
    }
}

/// Builds a `"C _ C _"`-style pattern: revealed bytes shown as themselves,
/// everything else as `_`, single spaces between, no trailing space.
fn exposed_pattern(word: &[u8], revealed: &BTreeSet<u8>) -> String {
    let mut out = String::with_capacity(word.len() * 2);
    for (i, &c) in word.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if revealed.contains(&c) {
            out.push(c as char);
        } else {
            out.push('_');
        }
    }
    out
}

fn format_now() -> String {
    let secs = flux::time::timestamp_secs();
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Hasher;
    use crate::store::UserStore;
    use crate::words::FirstWord;
    use tempfile::tempdir;

    fn service() -> MatchService {
        let dir = tempdir().unwrap();
        let log = logging::init("error");
        let auth = Arc::new(AuthService::new(UserStore::new(dir.path().join("users.txt")), Box::new(Sha256Hasher), &log).unwrap());
        let history = Arc::new(HistoryStore::new(dir.path().join("history")));
        std::mem::forget(dir);
        MatchService::new(WordLists::load(std::path::Path::new("/nonexistent")), Box::new(FirstWord), auth, history, &log)
    }

    #[test]
    fn correct_char_guess_reveals_and_scores() {
        let svc = service();
        svc.start_match(1, vec!["alice".into(), "bob".into()]);
        // Round 1 fallback word is "GAME" via FirstWord + missing corpus.
        let outcome = svc.guess_char("alice", 1, b'G').unwrap();
        assert!(outcome.guesser.correct);
        assert_eq!(outcome.guesser.score_gained, 10);
        assert!(!outcome.guesser.is_your_turn);
        let (opp_name, opp_pkt) = outcome.opponent.unwrap();
        assert_eq!(opp_name, "bob");
        assert_eq!(opp_pkt.exposed_pattern, outcome.guesser.exposed_pattern);
    }

    #[test]
    fn wrong_turn_is_rejected() {
        let svc = service();
        svc.start_match(1, vec!["alice".into(), "bob".into()]);
        let err = svc.guess_char("bob", 1, b'G').unwrap_err();
        assert_eq!(err, MatchError::NotYourTurn);
    }

    #[test]
    fn completing_word_advances_round_without_switching_turn() {
        let svc = service();
        svc.start_match(1, vec!["alice".into(), "bob".into()]);
        let result = svc.guess_word("alice", 1, "GAME").unwrap();
        assert!(result.guesser.correct);
        assert!(result.guesser.round_complete);
        assert!(result.guesser.is_your_turn);
    }

    #[test]
    fn draw_request_identifies_opponent() {
        let svc = service();
        svc.start_match(1, vec!["alice".into(), "bob".into()]);
        let outcome = svc.request_draw("alice", 1).unwrap();
        assert_eq!(outcome.opponent_username.as_deref(), Some("bob"));
    }

    #[test]
    fn end_game_deactivates_the_match_so_later_guesses_are_rejected() {
        let svc = service();
        svc.start_match(1, vec!["alice".into(), "bob".into()]);
        svc.end_game("alice", 1, 0).unwrap();

        let err = svc.guess_char("bob", 1, b'G').unwrap_err();
        assert_eq!(err, MatchError::NotFound);
    }
}
