//! TOML-based application configuration.
//!
//! Stores engine settings:
//! - Shape scale range
//! - Frame interval and background timer floor
//! - Wake lock behavior on pause
//! - Extra user-defined exercises
//!
//! Configuration is stored at `<data dir>/config.toml`. Values are validated
//! on load and before every save, so a bad edit is rejected up front instead
//! of surfacing mid-session.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::catalog::{Catalog, ExerciseSpec};
use crate::error::{ConfigError, CoreError};
use crate::lifecycle::{EngineSettings, WakeLockPolicy};
use crate::timer::{FramePoll, OneShotTimer, ScaleRange};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_min_scale")]
    pub min_scale: f64,
    #[serde(default = "default_max_scale")]
    pub max_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivingConfig {
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_coarse_min_delay")]
    pub coarse_min_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WakeLockConfig {
    #[serde(default)]
    pub on_pause: WakeLockPolicy,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub driving: DrivingConfig,
    #[serde(default)]
    pub wake_lock: WakeLockConfig,
    /// Appended to the built-in exercises.
    #[serde(default)]
    pub exercises: Vec<ExerciseSpec>,
}

fn default_min_scale() -> f64 {
    ScaleRange::default().min
}
fn default_max_scale() -> f64 {
    ScaleRange::default().max
}
fn default_frame_interval() -> u64 {
    FramePoll::default().frame_interval_ms
}
fn default_coarse_min_delay() -> u64 {
    OneShotTimer::default().min_delay_ms
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            min_scale: default_min_scale(),
            max_scale: default_max_scale(),
        }
    }
}

impl Default for DrivingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            coarse_min_delay_ms: default_coarse_min_delay(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let not_a_number = || invalid(format!("cannot parse '{value}' as number"));
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(not_a_number)?
                        } else {
                            return Err(not_a_number());
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Path of the config file in the data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if no file exists.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed or validated,
    /// or if the default config cannot be written.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    /// # Errors
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist to the data directory.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or cannot be written.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    /// # Errors
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        self.validate()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check scale bounds and the extra exercises.
    ///
    /// # Errors
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.engine_settings()?;
        self.catalog()?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and save to the data directory.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// the result fails validation, or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Like [`Config::set`], without touching the disk.
    ///
    /// # Errors
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is unchanged on error.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// # Errors
    /// Returns `InvalidValue` for an inverted or non-finite scale range.
    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        let scale = ScaleRange {
            min: self.display.min_scale,
            max: self.display.max_scale,
        };
        if !scale.is_valid() {
            return Err(ConfigError::InvalidValue {
                key: "display".into(),
                message: format!(
                    "min_scale ({}) must be between 0 and max_scale ({})",
                    scale.min, scale.max
                ),
            });
        }
        Ok(EngineSettings {
            scale,
            fine: FramePoll {
                frame_interval_ms: self.driving.frame_interval_ms,
            },
            coarse: OneShotTimer {
                min_delay_ms: self.driving.coarse_min_delay_ms,
            },
            wake_lock_on_pause: self.wake_lock.on_pause,
        })
    }

    /// Built-in exercises plus the configured extras.
    ///
    /// # Errors
    /// Returns a catalog error for any invalid or duplicate exercise.
    pub fn catalog(&self) -> Result<Catalog, CoreError> {
        Ok(Catalog::with_extra(self.exercises.clone())?)
    }
}
