//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path and logging settings with defaults.
//! - Let front ends override any value explicitly after resolution.
//!
//! # Invariants
//! - Resolution never panics; an invalid value is an error naming the
//!   variable.

use crate::logging::{LogLevel, LogTarget, LoggingError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_VAR: &str = "DAYSCORE_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "DAYSCORE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "DAYSCORE_LOG_DIR";

pub const DEFAULT_DB_FILE_NAME: &str = "dayscore.sqlite3";

#[derive(Debug)]
pub struct ConfigError {
    pub var: &'static str,
    pub source: LoggingError,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.var, self.source)
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: LogLevel,
    pub log_target: LogTarget,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: LogLevel::build_default(),
            log_target: LogTarget::Stderr,
        }
    }
}

impl CoreConfig {
    /// Resolves settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        match read(DB_PATH_VAR) {
            Some(path) => config.db_path = PathBuf::from(path),
            None => debug!(
                "event=config_default module=config key={} value={}",
                DB_PATH_VAR,
                config.db_path.display()
            ),
        }
        if let Some(level) = read(LOG_LEVEL_VAR) {
            config.log_level = level.parse::<LogLevel>().map_err(|source| ConfigError {
                var: LOG_LEVEL_VAR,
                source,
            })?;
        }
        if let Some(dir) = read(LOG_DIR_VAR) {
            config.log_target = LogTarget::directory(dir).map_err(|source| ConfigError {
                var: LOG_DIR_VAR,
                source,
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let config = CoreConfig::from_lookup(lookup_from(&[(DB_PATH_VAR, "  ")])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE_NAME));
    }

    #[test]
    fn environment_values_override_defaults() {
        let dir = std::env::temp_dir();
        let dir_text = dir.to_str().unwrap().to_string();
        let config = CoreConfig::from_lookup(lookup_from(&[
            (DB_PATH_VAR, "/data/journal.db"),
            (LOG_LEVEL_VAR, "WARN"),
            (LOG_DIR_VAR, dir_text.as_str()),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/journal.db"));
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_target, LogTarget::Directory(dir));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_LEVEL_VAR, "loud")])).unwrap_err();
        assert_eq!(err.var, LOG_LEVEL_VAR);

        let err = CoreConfig::from_lookup(lookup_from(&[(LOG_DIR_VAR, "relative/logs")]))
            .unwrap_err();
        assert_eq!(err.var, LOG_DIR_VAR);
    }
}
