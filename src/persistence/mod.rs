//! Save/load of player progress
//!
//! Features:
//! - `Storage` trait over a string key/value store
//! - In-memory backend (native, tests) and LocalStorage backend (web)
//! - JSON records with per-field defaults so partial saves still load
//! - Failures degrade to defaults with a warning, never a crash
//!
//! Only cumulative progress is stored. In-flight bubbles are never saved.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::sim::Fragments;

/// Why a storage operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// No backing store (e.g. LocalStorage disabled)
    Unavailable,
    /// Backend rejected the read or write
    Io(String),
    Serialize(String),
    Deserialize { key: String, message: String },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "storage unavailable"),
            Self::Io(message) => write!(f, "storage error: {message}"),
            Self::Serialize(message) => write!(f, "failed to serialize record: {message}"),
            Self::Deserialize { key, message } => {
                write!(f, "failed to parse record '{key}': {message}")
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// String key/value store
pub trait Storage {
    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;
}

/// Serialize `value` as JSON under `key`
pub fn save_json<T: Serialize>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(value).map_err(|e| PersistenceError::Serialize(e.to_string()))?;
    storage.save(key, &json)
}

/// Parse the JSON record under `key`, `None` when absent
pub fn load_json<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    let Some(json) = storage.load(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| PersistenceError::Deserialize {
            key: key.to_string(),
            message: e.to_string(),
        })
}

/// Load a record, falling back to its default on absence or any error
pub fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match load_json(storage, key) {
        Ok(Some(value)) => {
            log::info!("Loaded '{}' from storage", key);
            value
        }
        Ok(None) => T::default(),
        Err(e) => {
            log::warn!("Using defaults for '{}': {}", key, e);
            T::default()
        }
    }
}

/// Save a record, logging instead of failing
pub fn save_or_warn<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) -> bool {
    match save_json(storage, key, value) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not save '{}': {}", key, e);
            false
        }
    }
}

/// In-memory storage (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).cloned())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    fn storage() -> Result<web_sys::Storage, PersistenceError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(PersistenceError::Unavailable)
    }
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn save(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| PersistenceError::Io(format!("{:?}", e)))
    }

    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PersistenceError::Io(format!("{:?}", e)))
    }
}

/// Persisted player progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Fragments collected across all runs
    #[serde(default)]
    pub fragments: Fragments,
    /// Consecutive days with a login
    #[serde(default)]
    pub login_streak: u32,
    /// Day number (days since the Unix epoch) of the last login
    #[serde(default)]
    pub last_login_day: Option<i64>,
}

impl Progress {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "bubble_pop_progress";

    /// Load progress; absent or unreadable records start from zero
    pub fn load(storage: &dyn Storage) -> Self {
        load_or_default(storage, Self::STORAGE_KEY)
    }

    pub fn save(&self, storage: &mut dyn Storage) -> bool {
        save_or_warn(storage, Self::STORAGE_KEY, self)
    }

    /// Record a login on `today` (days since the Unix epoch)
    ///
    /// The streak grows on the next calendar day, resets to 1 after a gap,
    /// and is unchanged for repeat logins on the same day.
    pub fn record_login(&mut self, today: i64) -> u32 {
        self.login_streak = match self.last_login_day {
            None => 1,
            Some(last) => match today - last {
                1 => self.login_streak.saturating_add(1),
                gap if gap > 1 => 1,
                _ => self.login_streak.max(1),
            },
        };
        self.last_login_day = Some(today.max(self.last_login_day.unwrap_or(today)));
        self.login_streak
    }
}

/// Convert a Unix timestamp in milliseconds to a day number
pub fn day_from_unix_ms(ms: f64) -> i64 {
    (ms / 86_400_000.0).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BubbleKind;

    /// Storage that fails every operation
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn save(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
            Err(PersistenceError::Unavailable)
        }

        fn load(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
            Err(PersistenceError::Io("quota".to_string()))
        }
    }

    #[test]
    fn test_progress_roundtrip() {
        let mut storage = MemoryStorage::new();
        let mut progress = Progress::default();
        progress.fragments.add(BubbleKind::Golden);
        progress.fragments.add(BubbleKind::Golden);
        progress.record_login(100);

        assert!(progress.save(&mut storage));
        assert_eq!(Progress::load(&storage), progress);
    }

    #[test]
    fn test_missing_progress_is_zero() {
        let storage = MemoryStorage::new();
        let progress = Progress::load(&storage);
        assert_eq!(progress.fragments.total(), 0);
        assert_eq!(progress.login_streak, 0);
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let mut storage = MemoryStorage::new();
        storage
            .save(Progress::STORAGE_KEY, r#"{"fragments":{"rainbow":4}}"#)
            .unwrap();

        let progress = Progress::load(&storage);
        assert_eq!(progress.fragments.get(BubbleKind::Rainbow), 4);
        assert_eq!(progress.fragments.get(BubbleKind::Normal), 0);
        assert_eq!(progress.last_login_day, None);
    }

    #[test]
    fn test_corrupt_record_falls_back() {
        let mut storage = MemoryStorage::new();
        storage.save(Progress::STORAGE_KEY, "{not json").unwrap();
        assert_eq!(Progress::load(&storage), Progress::default());

        let err = load_json::<Progress>(&storage, Progress::STORAGE_KEY).unwrap_err();
        assert!(matches!(err, PersistenceError::Deserialize { .. }));
    }

    #[test]
    fn test_unavailable_storage_is_tolerated() {
        let mut broken = BrokenStorage;
        assert_eq!(Progress::load(&broken), Progress::default());
        assert!(!Progress::default().save(&mut broken));
    }

    #[test]
    fn test_login_streak() {
        let mut p = Progress::default();
        assert_eq!(p.record_login(10), 1);
        // Same day
        assert_eq!(p.record_login(10), 1);
        assert_eq!(p.record_login(11), 2);
        assert_eq!(p.record_login(12), 3);
        // Gap resets
        assert_eq!(p.record_login(15), 1);
        // Clock moved backwards keeps streak and last day
        assert_eq!(p.record_login(14), 1);
        assert_eq!(p.last_login_day, Some(15));
    }

    #[test]
    fn test_day_from_unix_ms() {
        assert_eq!(day_from_unix_ms(0.0), 0);
        assert_eq!(day_from_unix_ms(86_399_999.0), 0);
        assert_eq!(day_from_unix_ms(86_400_000.0), 1);
    }

    #[test]
    fn test_error_display() {
        let err = PersistenceError::Deserialize {
            key: "k".to_string(),
            message: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "failed to parse record 'k': bad");
        assert_eq!(PersistenceError::Unavailable.to_string(), "storage unavailable");
    }
}
