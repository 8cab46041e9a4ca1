//! Session registry and credential store, grounded on
//! `examples/original_source/backend/src/service/AuthService.cpp`.

use crate::error::ServiceResult;
use crate::store::UserStore;
use crate::types::{Session, User};
use flux::logging::{self, Logger};
use protocol::packets::{S2CLoginResult, S2CLogoutAck, S2CRegisterResult};
use protocol::ResultCode;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;

const MAX_CREDENTIAL_LEN: usize = 64;
/// Fixed application-wide salt. The hashing algorithm is swappable via
/// `PasswordHasher`; this default exists to be a real hash (unlike the
/// original's plaintext placeholder) rather than to be cryptographically
/// best-practice on its own.
const SALT: &str = "hangman-server";

/// Decouples `AuthService` from the concrete hashing algorithm.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> String;
    fn verify(&self, password: &str, hash: &str) -> bool {
        self.hash(password) == hash
    }
}

pub struct Sha256Hasher;

impl PasswordHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(SALT.as_bytes());
        hasher.update(password.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

pub struct AuthService {
    users: Mutex<HashMap<String, User>>,
    sessions: Mutex<HashMap<String, Session>>,
    store: UserStore,
    hasher: Box<dyn PasswordHasher>,
    log: Logger,
}

impl AuthService {
    pub fn new(store: UserStore, hasher: Box<dyn PasswordHasher>, log: &Logger) -> ServiceResult<AuthService> {
        let users = store.load()?;
        Ok(AuthService {
            users: Mutex::new(users),
            sessions: Mutex::new(HashMap::new()),
            store,
            hasher,
            log: log.new(logging::o!("component" => "auth")),
        })
    }

    pub fn register(&self, username: &str, password: &str) -> S2CRegisterResult {
        if username.is_empty() || password.is_empty() {
            return S2CRegisterResult {
                code: ResultCode::Invalid,
                message: "Username and password cannot be empty".into(),
            };
        }
        if username.len() > MAX_CREDENTIAL_LEN || password.len() > MAX_CREDENTIAL_LEN {
            return S2CRegisterResult {
                code: ResultCode::Invalid,
                message: "Username or password too long".into(),
            };
        }

        {
            let users = self.users.lock().unwrap();
            if users.contains_key(username) {
                return S2CRegisterResult {
                    code: ResultCode::Already,
                    message: "Username already exists".into(),
                };
            }
        }

        let user = User {
            username: username.to_string(),
            password_hash: self.hasher.hash(password),
            wins: 0,
            total_points: 0,
        };

        {
            let mut users = self.users.lock().unwrap();
            users.insert(username.to_string(), user.clone());
        }

        if let Err(e) = self.store.append(&user) {
            let mut users = self.users.lock().unwrap();
            users.remove(username);
            logging::warn!(self.log, "failed to persist new user"; "username" => username, "err" => %e);
            return S2CRegisterResult {
                code: ResultCode::ServerError,
                message: "Failed to save user to database".into(),
            };
        }

        logging::info!(self.log, "registered user"; "username" => username);
        S2CRegisterResult {
            code: ResultCode::Ok,
            message: "Account created successfully".into(),
        }
    }

    pub fn login(&self, username: &str, password: &str, connection_id: usize) -> S2CLoginResult {
        if username.is_empty() || password.is_empty() {
            return S2CLoginResult {
                code: ResultCode::Invalid,
                message: "Username and password cannot be empty".into(),
                session_token: String::new(),
                num_of_wins: 0,
                total_points: 0,
            };
        }

        let user = {
            let users = self.users.lock().unwrap();
            match users.get(username) {
                Some(u) if self.hasher.verify(password, &u.password_hash) => u.clone(),
                _ => {
                    return S2CLoginResult {
                        code: ResultCode::AuthFail,
                        message: "Invalid username or password".into(),
                        session_token: String::new(),
                        num_of_wins: 0,
                        total_points: 0,
                    }
                }
            }
        };

        let token = generate_session_token(username);

        {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.retain(|_, s| s.username != username);
            sessions.insert(
                token.clone(),
                Session {
                    token: token.clone(),
                    username: username.to_string(),
                    wins: user.wins,
                    total_points: user.total_points,
                    created_at: flux::time::timestamp_secs(),
                    connection_id,
                },
            );
        }

        logging::info!(self.log, "login"; "username" => username);
        S2CLoginResult {
            code: ResultCode::Ok,
            message: "Login successful".into(),
            session_token: token,
            num_of_wins: user.wins,
            total_points: user.total_points,
        }
    }

    pub fn logout(&self, token: &str) -> S2CLogoutAck {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.remove(token).is_some() {
            S2CLogoutAck {
                code: ResultCode::Ok,
                message: "Logout successful".into(),
            }
        } else {
            S2CLogoutAck {
                code: ResultCode::AuthFail,
                message: "Invalid session token".into(),
            }
        }
    }

    /// Returns the username owning `token`, if the session is live.
    pub fn validate_session(&self, token: &str) -> Option<String> {
        self.sessions.lock().unwrap().get(token).map(|s| s.username.clone())
    }

    pub fn connection_id_of(&self, username: &str) -> Option<usize> {
        self.sessions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.username == username)
            .map(|s| s.connection_id)
    }

    pub fn all_sessions(&self) -> Vec<Session> {
        self.sessions.lock().unwrap().values().cloned().collect()
    }

    /// Removes every session bound to `connection_id`. Idempotent: safe to
    /// call more than once for the same socket.
    pub fn handle_disconnect(&self, connection_id: usize) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.retain(|_, s| s.connection_id != connection_id);
    }

    /// Updates in-memory win/point totals and persists the whole store.
    /// The file write happens after the lock guard that did the snapshot is
    /// dropped, per the design notes' "no file I/O under a service mutex" rule.
    pub fn update_stats(&self, username: &str, is_win: bool, points: u32) {
        let snapshot = {
            let mut users = self.users.lock().unwrap();
            if let Some(user) = users.get_mut(username) {
                if is_win {
                    user.wins += 1;
                }
                user.total_points += points;
            }
            users.clone()
        };

        if let Err(e) = self.store.rewrite_all(&snapshot) {
            logging::warn!(self.log, "failed to persist stat update"; "username" => username, "err" => %e);
        }
    }

    pub fn all_users(&self) -> Vec<User> {
        self.users.lock().unwrap().values().cloned().collect()
    }
}

fn generate_session_token(username: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{}_{}_{}", username, flux::time::timestamp_secs(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn service() -> AuthService {
        let dir = tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.txt"));
        std::mem::forget(dir);
        let log = logging::init("error");
        AuthService::new(store, Box::new(Sha256Hasher), &log).unwrap()
    }

    #[test]
    fn register_then_login_round_trips() {
        let svc = service();
        let reg = svc.register("alice", "hunter2");
        assert_eq!(reg.code, ResultCode::Ok);

        let login = svc.login("alice", "hunter2", 7);
        assert_eq!(login.code, ResultCode::Ok);
        assert!(!login.session_token.is_empty());

        let username = svc.validate_session(&login.session_token);
        assert_eq!(username.as_deref(), Some("alice"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let svc = service();
        svc.register("alice", "hunter2");
        let second = svc.register("alice", "other");
        assert_eq!(second.code, ResultCode::Already);
    }

    #[test]
    fn wrong_password_fails_auth() {
        let svc = service();
        svc.register("alice", "hunter2");
        let login = svc.login("alice", "wrong", 1);
        assert_eq!(login.code, ResultCode::AuthFail);
    }

    #[test]
    fn disconnect_cleanup_removes_session() {
        let svc = service();
        svc.register("alice", "hunter2");
        let login = svc.login("alice", "hunter2", 42);
        svc.handle_disconnect(42);
        assert!(svc.validate_session(&login.session_token).is_none());
    }

    #[test]
    fn relogin_supersedes_prior_session() {
        let svc = service();
        svc.register("alice", "hunter2");
        let first = svc.login("alice", "hunter2", 1);
        let second = svc.login("alice", "hunter2", 2);
        assert!(svc.validate_session(&first.session_token).is_none());
        assert!(svc.validate_session(&second.session_token).is_some());
    }
}
