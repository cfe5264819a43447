use std::env;

use crate::error::ConfigError;

pub const FETCH_CONCURRENCY_ENV: &str = "COURSE_STATS_FETCH_CONCURRENCY";
const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Tuning for the statistics aggregator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsConfig {
    /// Upper bound on per-entity fetches in flight at once.
    pub fetch_concurrency: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

impl StatsConfig {
    /// Read overrides from the environment, falling back to defaults when unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConcurrency` if the variable is set but is not a
    /// positive integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        match env::var(FETCH_CONCURRENCY_ENV) {
            Ok(raw) => Self::default().with_fetch_concurrency_str(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidConcurrency` unless `raw` is a positive integer.
    pub fn with_fetch_concurrency_str(self, raw: &str) -> Result<Self, ConfigError> {
        let parsed = raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| ConfigError::InvalidConcurrency {
                key: FETCH_CONCURRENCY_ENV,
                raw: raw.to_string(),
            })?;
        Ok(Self {
            fetch_concurrency: parsed,
        })
    }
}
