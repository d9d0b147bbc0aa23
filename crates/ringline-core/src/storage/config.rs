//! TOML-based application configuration.
//!
//! Two small sections: whether ringing is audible, and whether the host
//! surface may post alerts. The ring timeout is deliberately absent -- it
//! is fixed in the lifecycle, not a preference.
//!
//! Configuration is stored at `~/.config/ringline/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

const CONFIG_FILE: &str = "config.toml";

/// Ringer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingConfig {
    /// Acquire the audible backend when a call rings.
    #[serde(default = "default_true")]
    pub sound: bool,
}

/// Alert-surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Stands in for the platform notification permission.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/ringline/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ring: RingConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

// Default functions
fn default_true() -> bool {
    true
}

impl Default for RingConfig {
    fn default() -> Self {
        Self { sound: true }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ring: RingConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|err| ConfigError::DataDir(err.to_string()))?;
        Ok(dir.join(CONFIG_FILE))
    }

    /// Load from disk, writing the default on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// default cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|err| ConfigError::LoadFailed {
                path,
                message: err.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|err| ConfigError::SaveFailed {
            path: path.clone(),
            message: err.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|err| ConfigError::SaveFailed {
            path,
            message: err.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "ring.sound" => Some(self.ring.sound.to_string()),
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            _ => None,
        }
    }

    /// Set a config value by dot-separated key and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply_key(key, value)?;
        self.save()
    }

    fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let parsed = value
            .parse::<bool>()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse '{value}' as bool"),
            });
        match key {
            "ring.sound" => {
                self.ring.sound = parsed?;
                Ok(())
            }
            "notifications.enabled" => {
                self.notifications.enabled = parsed?;
                Ok(())
            }
            _ => Err(ConfigError::UnknownKey(key.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.ring.sound);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("").unwrap();
        assert!(parsed.ring.sound);

        let parsed: Config = toml::from_str("[ring]\nsound = false\n").unwrap();
        assert!(!parsed.ring.sound);
        assert!(parsed.notifications.enabled);
    }

    #[test]
    fn get_supports_dot_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("ring.sound").as_deref(), Some("true"));
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert!(cfg.get("ring.volume").is_none());
    }

    #[test]
    fn apply_key_updates_known_keys() {
        let mut cfg = Config::default();
        cfg.apply_key("ring.sound", "false").unwrap();
        assert!(!cfg.ring.sound);
        cfg.apply_key("notifications.enabled", "false").unwrap();
        assert!(!cfg.notifications.enabled);
    }

    #[test]
    fn apply_key_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply_key("ring.timeout_secs", "60"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn apply_key_rejects_invalid_value() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply_key("ring.sound", "loud"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.ring.sound);
    }
}
