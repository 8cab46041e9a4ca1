//! Flat-file persistence for users and match history.
//!
//! Grounded on the original `AuthService::loadDatabase`/`saveUserToDatabase`/
//! `saveAllUsersToDatabase`, re-architected per the file-I/O-under-mutex note
//! (spec design notes): callers take the snapshot they need under the lock,
//! drop the guard, then call into this module.

use crate::error::{ServiceError, ServiceResult};
use crate::types::{HistoryRow, User};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> UserStore {
        UserStore { path: path.into() }
    }

    /// Loads every user record, creating an empty store file if none exists yet.
    pub fn load(&self) -> ServiceResult<HashMap<String, User>> {
        if !self.path.exists() {
            File::create(&self.path)?;
            return Ok(HashMap::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut users = HashMap::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(4, ':');
            let username = parts.next().ok_or_else(|| ServiceError::Corrupt(line.clone()))?;
            let password_hash = parts.next().ok_or_else(|| ServiceError::Corrupt(line.clone()))?;
            let wins = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            let total_points = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);

            users.insert(
                username.to_string(),
                User {
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    wins,
                    total_points,
                },
            );
        }

        Ok(users)
    }

    /// Appends a freshly registered user as a new line.
    pub fn append(&self, user: &User) -> ServiceResult<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(
            file,
            "{}:{}:{}:{}",
            user.username, user.password_hash, user.wins, user.total_points
        )?;
        Ok(())
    }

    /// Atomically rewrites the whole store (used after a stat update), via a
    /// temp file plus rename so a crash mid-write never corrupts the file.
    pub fn rewrite_all(&self, users: &HashMap<String, User>) -> ServiceResult<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;

        for user in users.values() {
            writeln!(
                tmp,
                "{}:{}:{}:{}",
                user.username, user.password_hash, user.wins, user.total_points
            )?;
        }

        tmp.persist(&self.path).map_err(|e| ServiceError::Io(e.error))?;
        Ok(())
    }
}

pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> HistoryStore {
        HistoryStore { dir: dir.into() }
    }

    fn path_for(&self, username: &str) -> PathBuf {
        self.dir.join(format!("{}.txt", username))
    }

    pub fn append(&self, username: &str, row: &HistoryRow) -> ServiceResult<()> {
        fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(username))?;
        writeln!(
            file,
            "{}:{}:{}:{}:{}:{}",
            row.datetime,
            row.opponent,
            result_word(row.result),
            row.r1,
            row.r2,
            row.r3
        )?;
        Ok(())
    }

    /// Returns this user's history rows, most recent first.
    pub fn load(&self, username: &str) -> ServiceResult<Vec<HistoryRow>> {
        let path = self.path_for(username);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.splitn(6, ':').collect();
            if parts.len() != 6 {
                continue;
            }
            rows.push(HistoryRow {
                datetime: parts[0].to_string(),
                opponent: parts[1].to_string(),
                result: result_code(parts[2]),
                r1: parts[3].parse().unwrap_or(0),
                r2: parts[4].parse().unwrap_or(0),
                r3: parts[5].parse().unwrap_or(0),
            });
        }

        rows.reverse();
        Ok(rows)
    }
}

/// `HistoryRow::result` (0 = lose, 1 = win, 2 = draw) as the on-disk word,
/// matching the original `saveHistoryWithScores` format.
fn result_word(result: u8) -> &'static str {
    match result {
        1 => "win",
        2 => "draw",
        _ => "lose",
    }
}

fn result_code(word: &str) -> u8 {
    match word {
        "win" => 1,
        "draw" => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn user_store_round_trips() {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.txt"));

        let alice = User {
            username: "alice".into(),
            password_hash: "hash".into(),
            wins: 0,
            total_points: 0,
        };
        store.append(&alice).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["alice"].password_hash, "hash");
    }

    #[test]
    fn user_store_rewrite_all_is_atomic() {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.txt"));

        let mut users = HashMap::new();
        users.insert(
            "alice".to_string(),
            User {
                username: "alice".into(),
                password_hash: "hash".into(),
                wins: 3,
                total_points: 90,
            },
        );
        store.rewrite_all(&users).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded["alice"].wins, 3);
        assert_eq!(loaded["alice"].total_points, 90);
    }

    #[test]
    fn history_store_returns_most_recent_first() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        store
            .append(
                "alice",
                &HistoryRow {
                    datetime: "2026-01-01 10:00:00".into(),
                    opponent: "bob".into(),
                    result: 1,
                    r1: 10,
                    r2: 20,
                    r3: 30,
                },
            )
            .unwrap();
        store
            .append(
                "alice",
                &HistoryRow {
                    datetime: "2026-01-02 10:00:00".into(),
                    opponent: "carol".into(),
                    result: 0,
                    r1: 5,
                    r2: 5,
                    r3: 5,
                },
            )
            .unwrap();

        let rows = store.load("alice").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].opponent, "carol");
        assert_eq!(rows[1].opponent, "bob");
    }

    #[test]
    fn history_store_persists_result_as_a_word_on_disk() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path());

        store
            .append(
                "alice",
                &HistoryRow {
                    datetime: "2026-01-01 10:00:00".into(),
                    opponent: "bob".into(),
                    result: 2,
                    r1: 0,
                    r2: 0,
                    r3: 0,
                },
            )
            .unwrap();

        let raw = fs::read_to_string(dir.path().join("alice.txt")).unwrap();
        assert!(raw.contains(":draw:"), "expected the word 'draw' on disk, got: {raw}");

        let rows = store.load("alice").unwrap();
        assert_eq!(rows[0].result, 2);
    }
}
