//! Match history and leaderboard queries. The original backend has no
//! single class for these — `AuthService::getInstance().users` backed the
//! leaderboard directly and history was read ad hoc per request; this
//! groups both behind one seam the way the teacher groups small read-only
//! composites behind a service struct.

use crate::auth::AuthService;
use crate::store::HistoryStore;
use protocol::packets::{HistoryEntry, LeaderboardRow, S2CHistoryList, S2CLeaderboard};
use std::sync::Arc;

pub struct SummaryService {
    auth: Arc<AuthService>,
    history: Arc<HistoryStore>,
}

impl SummaryService {
    pub fn new(auth: Arc<AuthService>, history: Arc<HistoryStore>) -> SummaryService {
        SummaryService { auth, history }
    }

    pub fn request_history(&self, username: &str) -> S2CHistoryList {
        let rows = self.history.load(username).unwrap_or_default();
        S2CHistoryList {
            entries: rows
                .into_iter()
                .map(|r| HistoryEntry {
                    datetime: r.datetime,
                    opponent: r.opponent,
                    result: r.result,
                    r1: r.r1,
                    r2: r.r2,
                    r3: r.r3,
                })
                .collect(),
        }
    }

    /// Ranked by wins, then total points, descending.
    pub fn request_leaderboard(&self) -> S2CLeaderboard {
        let mut users = self.auth.all_users();
        users.sort_by(|a, b| b.wins.cmp(&a.wins).then(b.total_points.cmp(&a.total_points)));

        S2CLeaderboard {
            rows: users
                .into_iter()
                .map(|u| LeaderboardRow {
                    username: u.username,
                    wins: u.wins,
                    total_points: u.total_points,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sha256Hasher;
    use crate::store::UserStore;
    use flux::logging;
    use tempfile::tempdir;

    #[test]
    fn leaderboard_orders_by_wins_then_points() {
        let dir = tempdir().unwrap();
        let log = logging::init("error");
        let auth = Arc::new(AuthService::new(UserStore::new(dir.path().join("users.txt")), Box::new(Sha256Hasher), &log).unwrap());
        let history = Arc::new(HistoryStore::new(dir.path().join("history")));

        auth.register("alice", "pw");
        auth.register("bob", "pw");
        auth.update_stats("alice", true, 20);
        auth.update_stats("bob", true, 50);
        auth.update_stats("bob", true, 50);

        let summary = SummaryService::new(auth, history);
        let board = summary.request_leaderboard();
        assert_eq!(board.rows[0].username, "bob");
        assert_eq!(board.rows[0].wins, 2);
    }

    #[test]
    fn history_returns_empty_for_unknown_user() {
        let dir = tempdir().unwrap();
        let log = logging::init("error");
        let auth = Arc::new(AuthService::new(UserStore::new(dir.path().join("users.txt")), Box::new(Sha256Hasher), &log).unwrap());
        let history = Arc::new(HistoryStore::new(dir.path().join("history")));
        let summary = SummaryService::new(auth, history);
        assert!(summary.request_history("nobody").entries.is_empty());
    }
}
