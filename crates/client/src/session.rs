//! Persisted session identity.
//!
//! Three keys hold the client's view of the session: `user` (JSON),
//! `loginTime` and `lastActivity` (epoch milliseconds). They are written
//! together on login and always cleared together.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use bep_core::SessionUser;
use chrono::{DateTime, TimeZone, Utc};

/// Storage keys.
pub mod keys {
    pub const USER: &str = "user";
    pub const LOGIN_TIME: &str = "loginTime";
    pub const LAST_ACTIVITY: &str = "lastActivity";

    pub const ALL: [&str; 3] = [USER, LOGIN_TIME, LAST_ACTIVITY];
}

/// Key/value storage that survives restarts of the user interface.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Storage backed by a JSON file, rewritten on every change.
///
/// I/O failures are logged and otherwise ignored: losing the persisted
/// identity only means the next start asks for a login.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStorage {
    /// Open (or start) the file at `path`. A missing or unreadable file
    /// starts empty.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &HashMap<String, String>) {
        let result = serde_json::to_string_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write session file");
        }
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }
}

/// Who the client believes is signed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    Authenticated {
        user: SessionUser,
        login_time: DateTime<Utc>,
    },
    Anonymous,
}

impl SessionIdentity {
    /// Read the identity from storage. A stored user that no longer decodes
    /// counts as anonymous; a missing login time falls back to the epoch.
    pub fn load(storage: &dyn SessionStorage) -> Self {
        let Some(user) = storage
            .get(keys::USER)
            .and_then(|json| serde_json::from_str::<SessionUser>(&json).ok())
        else {
            return Self::Anonymous;
        };

        let login_time = storage
            .get(keys::LOGIN_TIME)
            .and_then(|v| parse_millis(&v))
            .unwrap_or(DateTime::UNIX_EPOCH);

        Self::Authenticated { user, login_time }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub const fn user(&self) -> Option<&SessionUser> {
        match self {
            Self::Authenticated { user, .. } => Some(user),
            Self::Anonymous => None,
        }
    }

    /// Record a fresh login: user, login time and activity all written.
    pub fn persist_login(storage: &dyn SessionStorage, user: &SessionUser, now: DateTime<Utc>) -> Self {
        let stamp = now.timestamp_millis().to_string();
        write_user(storage, user);
        storage.set(keys::LOGIN_TIME, &stamp);
        storage.set(keys::LAST_ACTIVITY, &stamp);
        Self::Authenticated {
            user: user.clone(),
            login_time: now,
        }
    }

    /// Store the user the server just confirmed, keeping the original login
    /// time if there is one.
    pub fn refresh(storage: &dyn SessionStorage, user: &SessionUser, now: DateTime<Utc>) -> Self {
        let login_time = storage
            .get(keys::LOGIN_TIME)
            .and_then(|v| parse_millis(&v))
            .unwrap_or_else(|| {
                storage.set(keys::LOGIN_TIME, &now.timestamp_millis().to_string());
                now
            });
        write_user(storage, user);
        Self::touch(storage, now);
        Self::Authenticated {
            user: user.clone(),
            login_time,
        }
    }

    pub fn touch(storage: &dyn SessionStorage, now: DateTime<Utc>) {
        storage.set(keys::LAST_ACTIVITY, &now.timestamp_millis().to_string());
    }

    pub fn last_activity(storage: &dyn SessionStorage) -> Option<DateTime<Utc>> {
        storage.get(keys::LAST_ACTIVITY).and_then(|v| parse_millis(&v))
    }

    /// Remove all three keys.
    pub fn clear(storage: &dyn SessionStorage) {
        for key in keys::ALL {
            storage.remove(key);
        }
    }
}

fn write_user(storage: &dyn SessionStorage, user: &SessionUser) {
    match serde_json::to_string(user) {
        Ok(json) => storage.set(keys::USER, &json),
        Err(e) => tracing::warn!(error = %e, "failed to encode session user"),
    }
}

fn parse_millis(value: &str) -> Option<DateTime<Utc>> {
    let millis = value.trim().parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bep_core::{Permission, Role, UserId};
    use chrono::Duration;

    use super::*;

    fn user() -> SessionUser {
        SessionUser {
            id: UserId::new(1),
            username: "minh".to_string(),
            role: Role::Admin,
            permissions: vec![Permission::MenuWrite],
            full_name: Some("Trần Minh".to_string()),
            email: None,
        }
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).single().unwrap()
    }

    #[test]
    fn test_empty_storage_is_anonymous() {
        let storage = MemoryStorage::new();
        assert_eq!(SessionIdentity::load(&storage), SessionIdentity::Anonymous);
    }

    #[test]
    fn test_persist_then_load() {
        let storage = MemoryStorage::new();
        let now = at(1_760_000_000_000);
        SessionIdentity::persist_login(&storage, &user(), now);

        assert_eq!(storage.get(keys::LOGIN_TIME).as_deref(), Some("1760000000000"));
        assert_eq!(storage.get(keys::LAST_ACTIVITY).as_deref(), Some("1760000000000"));

        let identity = SessionIdentity::load(&storage);
        assert!(identity.is_authenticated());
        assert_eq!(identity.user().unwrap().username, "minh");
        assert_eq!(
            identity,
            SessionIdentity::Authenticated {
                user: user(),
                login_time: now
            }
        );
    }

    #[test]
    fn test_refresh_keeps_login_time() {
        let storage = MemoryStorage::new();
        let login = at(1_760_000_000_000);
        SessionIdentity::persist_login(&storage, &user(), login);

        let later = login + Duration::minutes(30);
        let identity = SessionIdentity::refresh(&storage, &user(), later);

        assert_eq!(
            identity,
            SessionIdentity::Authenticated {
                user: user(),
                login_time: login
            }
        );
        assert_eq!(SessionIdentity::last_activity(&storage), Some(later));
    }

    #[test]
    fn test_clear_removes_all_keys() {
        let storage = MemoryStorage::new();
        SessionIdentity::persist_login(&storage, &user(), at(1));
        SessionIdentity::clear(&storage);
        for key in keys::ALL {
            assert!(storage.get(key).is_none(), "{key} left behind");
        }
    }

    #[test]
    fn test_corrupt_user_is_anonymous() {
        let storage = MemoryStorage::new();
        storage.set(keys::USER, "{not json");
        assert_eq!(SessionIdentity::load(&storage), SessionIdentity::Anonymous);
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let path = std::env::temp_dir().join(format!("bep-session-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let storage = FileStorage::open(&path);
        SessionIdentity::persist_login(&storage, &user(), at(42));
        drop(storage);

        let reopened = FileStorage::open(&path);
        assert!(SessionIdentity::load(&reopened).is_authenticated());
        SessionIdentity::clear(&reopened);
        assert_eq!(SessionIdentity::load(&FileStorage::open(&path)), SessionIdentity::Anonymous);

        let _ = std::fs::remove_file(&path);
    }
}
