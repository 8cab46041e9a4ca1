//! Singleton game services, each owning the mutex(es) for its own concern.
//! Grounded on the original backend's `*Service::getInstance()` singletons;
//! here they're plain structs bundled behind one `Arc<Services>` handle
//! instead of process-wide globals, per the design notes' re-architecture.

pub mod auth;
pub mod beforeplay;
pub mod error;
pub mod match_service;
pub mod room;
pub mod store;
pub mod summary;
pub mod types;
pub mod words;

use auth::{AuthService, PasswordHasher};
use beforeplay::BeforePlayService;
use error::ServiceResult;
use flux::logging::Logger;
use match_service::MatchService;
use room::RoomService;
use std::path::Path;
use std::sync::Arc;
use store::{HistoryStore, UserStore};
use summary::SummaryService;
use words::{default_selector, WordLists, WordSelection};

/// Every service a connection handler needs, bundled behind one `Arc`.
pub struct Services {
    pub auth: Arc<AuthService>,
    pub room: Arc<RoomService>,
    pub beforeplay: Arc<BeforePlayService>,
    pub match_service: Arc<MatchService>,
    pub summary: Arc<SummaryService>,
}

impl Services {
    /// `data_dir` holds `users.txt`, `history/`, and `words_round{1,2,3}.txt`.
    pub fn new(data_dir: &Path, hasher: Box<dyn PasswordHasher>, log: &Logger) -> ServiceResult<Services> {
        Services::with_selector(data_dir, hasher, Box::new(DefaultSelector), log)
    }

    pub fn with_selector(
        data_dir: &Path,
        hasher: Box<dyn PasswordHasher>,
        selector: Box<dyn WordSelection>,
        log: &Logger,
    ) -> ServiceResult<Services> {
        let users = UserStore::new(data_dir.join("users.txt"));
        let history = Arc::new(HistoryStore::new(data_dir.join("history")));
        let word_lists = WordLists::load(data_dir);

        let auth = Arc::new(AuthService::new(users, hasher, log)?);
        let room = Arc::new(RoomService::new(log));
        let match_service = Arc::new(MatchService::new(word_lists, selector, auth.clone(), history.clone(), log));
        let beforeplay = Arc::new(BeforePlayService::new(auth.clone(), room.clone(), match_service.clone()));
        let summary = Arc::new(SummaryService::new(auth.clone(), history));

        Ok(Services {
            auth,
            room,
            beforeplay,
            match_service,
            summary,
        })
    }
}

struct DefaultSelector;

impl WordSelection for DefaultSelector {
    fn select(&self, len: usize) -> usize {
        default_selector().select(len)
    }
}
