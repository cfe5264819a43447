//! Shared error and warning types for the services crate.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use storage::{Collection, StorageError};

/// Errors that stop an aggregation: a primary collection could not be loaded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AggregationError {
    #[error("failed to load {collection}: {source}")]
    Primary {
        collection: Collection,
        #[source]
        source: StorageError,
    },
}

impl AggregationError {
    /// Adapter for `map_err` on a primary fetch.
    pub(crate) fn primary(collection: Collection) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Primary { collection, source }
    }
}

/// Errors emitted while reading service configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {raw:?}")]
    InvalidConcurrency { key: &'static str, raw: String },
}

/// A collection that failed to load but was replaced by an empty/zero default.
///
/// Any warning on a report means the view is degraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataWarning {
    pub collection: Collection,
    pub reason: String,
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} could not be loaded: {}", self.collection, self.reason)
    }
}

/// Fall back to the default value for a non-primary fetch, recording the failure.
pub(crate) fn or_degraded<T: Default>(
    result: Result<T, StorageError>,
    collection: Collection,
    warnings: &mut Vec<DataWarning>,
) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(%collection, error = %err, "fetch failed, continuing with empty data");
            warnings.push(DataWarning {
                collection,
                reason: err.to_string(),
            });
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{EnrollmentId, SessionId};

    #[test]
    fn degraded_fetch_yields_default_and_warning() {
        let mut warnings = Vec::new();
        let value: Vec<u32> = or_degraded(
            Err(StorageError::Unavailable("down".into())),
            Collection::Progress(EnrollmentId::new(3)),
            &mut warnings,
        );

        assert!(value.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            "progress of enrollment 3 could not be loaded: backend unavailable: down"
        );
    }

    #[test]
    fn primary_error_names_collection() {
        let err = AggregationError::primary(Collection::Lectures(SessionId::new(4)))(
            StorageError::NotFound,
        );
        assert_eq!(err.to_string(), "failed to load lectures of session 4: not found");
    }
}
