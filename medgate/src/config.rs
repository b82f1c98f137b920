//! Environment configuration.
//!
//! | Variable | Required | Meaning |
//! |---|---|---|
//! | `DB_PATH` | yes | Path to the SQLite database file |
//! | `MEDGATE_MAX_FAILED_ATTEMPTS` | no | Failures before a lock (default 5) |
//! | `MEDGATE_LOCKOUT_SECONDS` | no | Lock duration in seconds (default 300, at most 365 days) |

use std::path::PathBuf;

use chrono::Duration;
use medgate_core::LockoutConfig;

use crate::MedgateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedgateConfig {
    pub db_path: PathBuf,
    pub lockout: LockoutConfig,
}

impl MedgateConfig {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            lockout: LockoutConfig::default(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, MedgateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MedgateError> {
        let db_path = lookup("DB_PATH")
            .filter(|path| !path.is_empty())
            .ok_or_else(|| {
                MedgateError::ConfigError("Environment variable 'DB_PATH' is not set".to_string())
            })?;

        let mut config = Self::new(db_path);

        // Unparseable or out-of-range values fall back to the defaults.
        if let Some(attempts) = lookup("MEDGATE_MAX_FAILED_ATTEMPTS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|attempts| *attempts > 0)
        {
            config.lockout.max_failed_attempts = attempts;
        }
        if let Some(period) = lookup("MEDGATE_LOCKOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .and_then(Duration::try_seconds)
            .filter(|period| LockoutConfig::is_valid_period(*period))
        {
            config.lockout.lockout_period = period;
        }

        Ok(config)
    }

    /// SQLite connection URL for `db_path`.
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.db_path.display())
    }
}
