//! Configuration for the snapshot manager
//!
//! Settings are read once from a TOML file (a missing file falls back to
//! defaults), then `MONGODB_URI` and `BACKUP_DIR` from the environment take
//! precedence. The resulting value is immutable for the rest of the run.

use crate::error::{Result, SnapshotError};
use crate::schedule::ScheduleWindow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the connection URI
pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
/// Environment variable overriding the backup root
pub const ENV_BACKUP_DIR: &str = "BACKUP_DIR";
/// Config file looked up when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Snapshot manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// MongoDB connection URI (required)
    pub mongodb_uri: String,
    /// Directory holding one subdirectory per snapshot
    pub backup_dir: PathBuf,
    /// Daily schedule used by the service loop
    pub schedule: ScheduleSettings,
    /// Deadlines for store and filesystem operations
    pub timeouts: TimeoutSettings,
    /// Logging output
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    /// Local hour at which the daily snapshot runs
    pub hour: u32,
    /// Grace window after the full hour, in minutes
    pub window_minutes: u32,
    /// How often the service loop checks the window, in seconds
    pub tick_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    /// Connect and ping deadline
    pub connect_secs: u64,
    /// Snapshot and restore deadline
    pub operation_secs: u64,
    /// Catalog listing deadline
    pub list_secs: u64,
    /// Disconnect deadline
    pub close_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of the compact text format
    pub json_format: bool,
    /// Also append log lines to this file
    pub log_file: Option<PathBuf>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            mongodb_uri: String::new(),
            backup_dir: PathBuf::from("backups"),
            schedule: ScheduleSettings::default(),
            timeouts: TimeoutSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            hour: 2,
            window_minutes: 5,
            tick_secs: 3600,
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            operation_secs: 30 * 60,
            list_secs: 10,
            close_secs: 5,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            log_file: None,
        }
    }
}

impl SnapshotConfig {
    /// Load configuration from `path` and the process environment
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load configuration from `path`, resolving overrides through `env`
    pub fn load_with_env<F>(path: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(SnapshotError::io(format!("reading {}", path.display())))?;
            Self::from_toml(&content)?
        } else {
            Self::default()
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without applying overrides or validation
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SnapshotError::Configuration(format!("failed to parse config file: {}", e)))
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = env(ENV_MONGODB_URI).filter(|v| !v.is_empty()) {
            self.mongodb_uri = uri;
        }
        if let Some(dir) = env(ENV_BACKUP_DIR).filter(|v| !v.is_empty()) {
            self.backup_dir = PathBuf::from(dir);
        }
    }

    /// Check required fields and value ranges
    pub fn validate(&self) -> Result<()> {
        if self.mongodb_uri.trim().is_empty() {
            return Err(SnapshotError::Configuration(
                "MongoDB URI is required".to_string(),
            ));
        }
        if self.backup_dir.as_os_str().is_empty() {
            return Err(SnapshotError::Configuration(
                "backup directory must not be empty".to_string(),
            ));
        }
        if self.schedule.hour > 23 {
            return Err(SnapshotError::Configuration(format!(
                "schedule hour must be between 0 and 23, got {}",
                self.schedule.hour
            )));
        }
        if self.schedule.window_minutes == 0 || self.schedule.window_minutes > 60 {
            return Err(SnapshotError::Configuration(format!(
                "schedule window must be between 1 and 60 minutes, got {}",
                self.schedule.window_minutes
            )));
        }
        if self.schedule.tick_secs == 0 {
            return Err(SnapshotError::Configuration(
                "schedule tick must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

impl ScheduleSettings {
    pub fn window(&self) -> ScheduleWindow {
        ScheduleWindow::new(self.hour, self.window_minutes)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

impl TimeoutSettings {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn operation(&self) -> Duration {
        Duration::from_secs(self.operation_secs)
    }

    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list_secs)
    }

    pub fn close(&self) -> Duration {
        Duration::from_secs(self.close_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_uses_defaults_and_env_uri() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = SnapshotConfig::load_with_env(
            &path,
            env_from(&[(ENV_MONGODB_URI, "mongodb://localhost:27017")]),
        )
        .unwrap();

        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
        assert_eq!(config.schedule.hour, 2);
        assert_eq!(config.schedule.window_minutes, 5);
        assert_eq!(config.timeouts.operation(), Duration::from_secs(1800));
    }

    #[test]
    fn test_uri_is_required() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let err = SnapshotConfig::load_with_env(&path, env_from(&[])).unwrap_err();
        assert!(matches!(err, SnapshotError::Configuration(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
mongodb_uri = "mongodb://from-file:27017"
backup_dir = "/var/backups/mongo"

[schedule]
hour = 4
"#,
        )
        .unwrap();

        let from_file = SnapshotConfig::load_with_env(&path, env_from(&[])).unwrap();
        assert_eq!(from_file.mongodb_uri, "mongodb://from-file:27017");
        assert_eq!(from_file.backup_dir, PathBuf::from("/var/backups/mongo"));
        assert_eq!(from_file.schedule.hour, 4);
        assert_eq!(from_file.schedule.window_minutes, 5);

        let overridden = SnapshotConfig::load_with_env(
            &path,
            env_from(&[
                (ENV_MONGODB_URI, "mongodb://from-env:27017"),
                (ENV_BACKUP_DIR, "snapshots"),
            ]),
        )
        .unwrap();
        assert_eq!(overridden.mongodb_uri, "mongodb://from-env:27017");
        assert_eq!(overridden.backup_dir, PathBuf::from("snapshots"));
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "mongodb_uri = \"mongodb://db:27017\"\n").unwrap();

        let config = SnapshotConfig::load_with_env(
            &path,
            env_from(&[(ENV_MONGODB_URI, ""), (ENV_BACKUP_DIR, "")]),
        )
        .unwrap();
        assert_eq!(config.mongodb_uri, "mongodb://db:27017");
        assert_eq!(config.backup_dir, PathBuf::from("backups"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "mongodb_uri = [unterminated").unwrap();

        let err = SnapshotConfig::load_with_env(
            &path,
            env_from(&[(ENV_MONGODB_URI, "mongodb://localhost")]),
        )
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Configuration(_)));
    }

    #[test]
    fn test_schedule_bounds_are_validated() {
        let mut config = SnapshotConfig {
            mongodb_uri: "mongodb://localhost".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        config.schedule.hour = 24;
        assert!(config.validate().is_err());

        config.schedule.hour = 2;
        config.schedule.window_minutes = 0;
        assert!(config.validate().is_err());

        config.schedule.window_minutes = 61;
        assert!(config.validate().is_err());
    }
}
