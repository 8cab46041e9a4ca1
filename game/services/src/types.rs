//! Shared data shapes used across the service layer, grounded on the
//! original backend's `Connection.h`/`MatchService.h` structs.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password_hash: String,
    pub wins: u32,
    pub total_points: u32,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub wins: u32,
    pub total_points: u32,
    pub created_at: u64,
    pub connection_id: usize,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum RoomState {
    Lobby,
    Playing,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PlayerState {
    Preparing,
    Ready,
    InGame,
}

#[derive(Debug, Clone)]
pub struct RoomMember {
    pub username: String,
    pub connection_id: usize,
    pub state: PlayerState,
}

#[derive(Debug, Clone)]
pub struct Room {
    pub id: u32,
    pub name: String,
    pub host_username: String,
    pub members: Vec<RoomMember>,
    pub state: RoomState,
}

impl Room {
    pub fn member(&self, username: &str) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.username == username)
    }

    pub fn member_mut(&mut self, username: &str) -> Option<&mut RoomMember> {
        self.members.iter_mut().find(|m| m.username == username)
    }

    pub fn opponent_of(&self, username: &str) -> Option<&RoomMember> {
        self.members.iter().find(|m| m.username != username)
    }
}

/// Points awarded per correctly guessed character occurrence, by round (1-indexed).
pub const CHAR_POINTS: [u32; 3] = [10, 15, 20];
/// Bonus awarded for a correct whole-word guess, by round.
pub const WORD_BONUS: [u32; 3] = [30, 50, 80];
/// Penalty subtracted for an incorrect whole-word guess, by round.
pub const WORD_PENALTY: [u32; 3] = [10, 15, 20];
pub const STARTING_ATTEMPTS: u8 = 6;

#[derive(Debug, Clone, Default)]
pub struct PlayerMatchState {
    pub username: String,
    pub guessed_chars: BTreeSet<u8>,
    pub remaining_attempts: u8,
    pub score: u32,
    pub round_scores: [u32; 3],
    pub finished: bool,
    pub won: bool,
}

impl PlayerMatchState {
    pub fn new(username: String) -> PlayerMatchState {
        PlayerMatchState {
            username,
            guessed_chars: BTreeSet::new(),
            remaining_attempts: STARTING_ATTEMPTS,
            score: 0,
            round_scores: [0, 0, 0],
            finished: false,
            won: false,
        }
    }

    fn reset_for_new_round(&mut self) {
        self.guessed_chars.clear();
        self.remaining_attempts = STARTING_ATTEMPTS;
        self.finished = false;
    }
}

#[derive(Debug, Clone)]
pub struct Match {
    pub match_id: u32,
    pub room_id: u32,
    pub round_words: [String; 3],
    pub current_round: u8,
    pub revealed_chars: BTreeSet<u8>,
    pub current_turn: String,
    pub players: HashMap<String, PlayerMatchState>,
    pub player_order: Vec<String>,
    pub active: bool,
}

impl Match {
    pub fn current_word(&self) -> &str {
        &self.round_words[(self.current_round - 1) as usize]
    }

    pub fn opponent_of(&self, username: &str) -> Option<&str> {
        self.player_order.iter().map(String::as_str).find(|u| *u != username)
    }

    /// Advances to the next round, clearing shared reveal state and
    /// resetting every player's per-round state. Does not touch turn.
    pub fn advance_round(&mut self) {
        self.current_round += 1;
        self.revealed_chars.clear();
        for state in self.players.values_mut() {
            state.reset_for_new_round();
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryRow {
    pub datetime: String,
    pub opponent: String,
    /// 0 = lose, 1 = win, 2 = draw.
    pub result: u8,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
}
