//! Reporting cache freshness policy.
//!
//! The materialized balance cache is refreshed by the database layer;
//! this module decides when a refresh is due and describes refresh
//! results, independent of any connection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from cache refresh coordination.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A refresh is already running and the caller opted not to wait.
    #[error("a cache refresh is already in progress")]
    RefreshInProgress,

    /// Waited for a concurrent refresh past the configured timeout.
    #[error("timed out after {waited_secs}s waiting for a concurrent refresh")]
    RefreshTimeout {
        /// How long the caller waited.
        waited_secs: u64,
    },

    /// Database error during refresh or freshness lookup.
    #[error("database error: {0}")]
    Database(String),
}

impl CacheError {
    /// Machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::RefreshInProgress => "REFRESH_IN_PROGRESS",
            Self::RefreshTimeout { .. } => "REFRESH_TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Whether retrying the same call can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RefreshInProgress | Self::RefreshTimeout { .. })
    }
}

impl From<CacheError> for tally_shared::AppError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::RefreshInProgress | CacheError::RefreshTimeout { .. } => {
                Self::Conflict(err.to_string())
            }
            CacheError::Database(msg) => Self::Database(msg),
        }
    }
}

/// When a cached snapshot counts as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessPolicy {
    /// Age beyond which a snapshot is stale, in seconds.
    pub threshold_secs: u64,
}

impl StalenessPolicy {
    /// Policy with the given threshold.
    #[must_use]
    pub const fn new(threshold_secs: u64) -> Self {
        Self { threshold_secs }
    }

    /// Classifies a snapshot timestamp against this policy.
    #[must_use]
    pub fn evaluate(&self, refreshed_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Freshness {
        match refreshed_at {
            None => Freshness::NeverRefreshed,
            Some(at) => {
                let age = now.signed_duration_since(at);
                let threshold = Duration::seconds(self.threshold_secs.min(i64::MAX as u64) as i64);
                if age > threshold {
                    Freshness::Stale {
                        refreshed_at: at,
                        age_secs: age.num_seconds().max(0) as u64,
                    }
                } else {
                    Freshness::Fresh {
                        refreshed_at: at,
                        age_secs: age.num_seconds().max(0) as u64,
                    }
                }
            }
        }
    }
}

/// Freshness classification of the reporting cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Freshness {
    /// The cache has never been populated.
    NeverRefreshed,
    /// Within the staleness threshold.
    Fresh {
        /// When the cache was last refreshed.
        refreshed_at: DateTime<Utc>,
        /// Snapshot age in seconds.
        age_secs: u64,
    },
    /// Older than the staleness threshold.
    Stale {
        /// When the cache was last refreshed.
        refreshed_at: DateTime<Utc>,
        /// Snapshot age in seconds.
        age_secs: u64,
    },
}

impl Freshness {
    /// Whether this state requires a refresh.
    #[must_use]
    pub const fn needs_refresh(&self) -> bool {
        matches!(self, Self::NeverRefreshed | Self::Stale { .. })
    }
}

/// Result of a refresh call.
///
/// `skipped` is true when another caller ran the actual recompute and
/// this caller inherited its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshOutcome {
    /// Timestamp the cache now reflects.
    pub refreshed_at: DateTime<Utc>,
    /// How long the recompute (or the wait for it) took, in milliseconds.
    pub duration_ms: u64,
    /// Number of account rows in the refreshed cache.
    pub rows: u64,
    /// True when this caller piggybacked on a concurrent refresh.
    pub skipped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_refreshed_needs_refresh() {
        let policy = StalenessPolicy::new(3600);
        let state = policy.evaluate(None, Utc::now());
        assert_eq!(state, Freshness::NeverRefreshed);
        assert!(state.needs_refresh());
    }

    #[test]
    fn test_recent_snapshot_is_fresh() {
        let policy = StalenessPolicy::new(3600);
        let now = Utc::now();
        let state = policy.evaluate(Some(now - Duration::seconds(60)), now);

        assert!(matches!(state, Freshness::Fresh { age_secs: 60, .. }));
        assert!(!state.needs_refresh());
    }

    #[test]
    fn test_old_snapshot_is_stale() {
        let policy = StalenessPolicy::new(3600);
        let now = Utc::now();
        let state = policy.evaluate(Some(now - Duration::seconds(7200)), now);

        assert!(matches!(state, Freshness::Stale { age_secs: 7200, .. }));
        assert!(state.needs_refresh());
    }

    #[test]
    fn test_exactly_threshold_is_fresh() {
        let policy = StalenessPolicy::new(3600);
        let now = Utc::now();
        let state = policy.evaluate(Some(now - Duration::seconds(3600)), now);
        assert!(!state.needs_refresh());
    }

    #[test]
    fn test_future_snapshot_clamps_age_to_zero() {
        // Clock skew between app and database should not underflow.
        let policy = StalenessPolicy::new(3600);
        let now = Utc::now();
        let state = policy.evaluate(Some(now + Duration::seconds(30)), now);
        assert!(matches!(state, Freshness::Fresh { age_secs: 0, .. }));
    }

    #[test]
    fn test_error_codes_and_retryability() {
        assert_eq!(
            CacheError::RefreshInProgress.error_code(),
            "REFRESH_IN_PROGRESS"
        );
        assert!(CacheError::RefreshInProgress.is_retryable());
        assert!(CacheError::RefreshTimeout { waited_secs: 30 }.is_retryable());
        assert!(!CacheError::Database("boom".into()).is_retryable());
    }

    #[test]
    fn test_conversion_to_app_error() {
        let app: tally_shared::AppError = CacheError::RefreshInProgress.into();
        assert!(matches!(app, tally_shared::AppError::Conflict(_)));

        let app: tally_shared::AppError = CacheError::Database("down".into()).into();
        assert!(matches!(app, tally_shared::AppError::Database(_)));
    }
}
