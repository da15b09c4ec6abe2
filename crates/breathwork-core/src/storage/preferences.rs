//! User preferences behind a key-value store.
//!
//! Three keys are read at startup and written on every user change. A store
//! that is missing, unreadable or holding garbage never blocks startup: each
//! key falls back to its default on its own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::StorageError;

pub const EXERCISE_KEY: &str = "exercise_id";
pub const DURATION_KEY: &str = "session_duration_seconds";
pub const SOUND_KEY: &str = "sound_enabled";

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-process store, used by tests and simulations.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store for hosts without persistent storage. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePreferences;

impl PreferenceStore for UnavailablePreferences {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("no preference store".into()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("no preference store".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub exercise_id: String,
    /// `0` means unbounded.
    pub total_duration_seconds: u64,
    pub sound_enabled: bool,
}

impl Preferences {
    pub fn defaults(catalog: &Catalog) -> Self {
        Self {
            exercise_id: catalog.default_exercise().id().to_string(),
            total_duration_seconds: 0,
            sound_enabled: true,
        }
    }

    /// Read all keys, keeping the default for any key that is missing,
    /// unreadable or invalid.
    pub fn load(store: &dyn PreferenceStore, catalog: &Catalog) -> Self {
        let mut prefs = Self::defaults(catalog);

        if let Some(id) = read(store, EXERCISE_KEY) {
            if catalog.contains(&id) {
                prefs.exercise_id = id;
            } else {
                tracing::warn!(
                    exercise = %id,
                    "stored exercise is not in the catalog; using default"
                );
            }
        }
        if let Some(raw) = read(store, DURATION_KEY) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => prefs.total_duration_seconds = secs,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid stored session duration"),
            }
        }
        if let Some(raw) = read(store, SOUND_KEY) {
            match raw.trim().parse::<bool>() {
                Ok(enabled) => prefs.sound_enabled = enabled,
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid stored sound flag"),
            }
        }
        prefs
    }

    /// # Errors
    /// Returns the first store failure.
    pub fn save(&self, store: &mut dyn PreferenceStore) -> Result<(), StorageError> {
        store.set(EXERCISE_KEY, &self.exercise_id)?;
        store.set(DURATION_KEY, &self.total_duration_seconds.to_string())?;
        store.set(SOUND_KEY, &self.sound_enabled.to_string())?;
        Ok(())
    }
}

fn read(store: &dyn PreferenceStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "preference store read failed; using default");
            None
        }
    }
}
