mod config;
pub mod database;
pub mod preferences;

pub use config::{Config, DisplayConfig, DrivingConfig, WakeLockConfig};
pub use database::{Database, SessionRecord, Stats};
pub use preferences::{MemoryPreferences, PreferenceStore, Preferences, UnavailablePreferences};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `BREATHWORK_DATA_DIR` wins if set. Otherwise `~/.config/breathwork/`, or
/// `~/.config/breathwork-dev/` when `BREATHWORK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("BREATHWORK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("BREATHWORK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("breathwork-dev")
            } else {
                base_dir.join("breathwork")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
