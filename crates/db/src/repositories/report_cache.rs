//! Reporting cache repository.
//!
//! Wraps the account_balances materialized view. Refreshes are mutually
//! exclusive at two levels: a named in-process lock so concurrent tasks
//! in this process coalesce, and a Postgres advisory lock so separate
//! processes cannot recompute the view simultaneously. Losers of the
//! race inherit the winner's result instead of refreshing again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    QueryOrder, Set, Statement, TransactionTrait,
};
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::entities::{balance_snapshots, cache_refresh_log};
use tally_core::cache::{CacheError, Freshness, RefreshOutcome, StalenessPolicy};
use tally_shared::config::ReportingConfig;

/// Advisory lock key for cross-process refresh exclusion.
const REFRESH_LOCK_KEY: i64 = 0x5441_4C4C_5943_4143;

/// Repository over the account_balances view and its refresh log.
#[derive(Debug, Clone)]
pub struct ReportCacheRepository {
    db: DatabaseConnection,
    policy: StalenessPolicy,
    wait_timeout: Duration,
    refresh_guard: Arc<Mutex<()>>,
}

impl ReportCacheRepository {
    /// Creates a new report cache repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &ReportingConfig) -> Self {
        Self {
            db,
            policy: StalenessPolicy::new(config.staleness_threshold_secs),
            wait_timeout: Duration::from_secs(config.refresh_wait_timeout_secs),
            refresh_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Refreshes the cache, waiting for an in-flight refresh if one is
    /// running.
    ///
    /// A caller that waited out a concurrent refresh newer than its own
    /// start time gets that result back with `skipped` set instead of
    /// recomputing.
    ///
    /// # Errors
    ///
    /// Returns `RefreshTimeout` when the in-flight refresh outlives the
    /// configured wait.
    pub async fn refresh(&self) -> Result<RefreshOutcome, CacheError> {
        let started = Utc::now();

        let Ok(_guard) = timeout(self.wait_timeout, self.refresh_guard.lock()).await else {
            return Err(CacheError::RefreshTimeout {
                waited_secs: self.wait_timeout.as_secs(),
            });
        };

        // The refresh we waited behind may already cover us
        if let Some(log) = self.latest_log().await? {
            let refreshed_at = log.refreshed_at.with_timezone(&Utc);
            if refreshed_at >= started {
                return Ok(RefreshOutcome {
                    refreshed_at,
                    duration_ms: elapsed_ms(started),
                    rows: log.row_count.max(0).unsigned_abs(),
                    skipped: true,
                });
            }
        }

        self.do_refresh().await
    }

    /// Refreshes the cache only if no refresh is currently running.
    ///
    /// # Errors
    ///
    /// Returns `RefreshInProgress` instead of waiting.
    pub async fn try_refresh(&self) -> Result<RefreshOutcome, CacheError> {
        let Ok(_guard) = self.refresh_guard.try_lock() else {
            return Err(CacheError::RefreshInProgress);
        };
        self.do_refresh().await
    }

    /// Classifies the cache's current age against the staleness policy.
    pub async fn check_freshness(&self) -> Result<Freshness, CacheError> {
        let refreshed_at = self
            .latest_log()
            .await?
            .map(|log| log.refreshed_at.with_timezone(&Utc));
        Ok(self.policy.evaluate(refreshed_at, Utc::now()))
    }

    /// Refreshes only when the cache is stale or has never been built.
    ///
    /// Returns `None` when the cache was already fresh.
    pub async fn refresh_if_stale(&self) -> Result<Option<RefreshOutcome>, CacheError> {
        let freshness = self.check_freshness().await?;
        if freshness.needs_refresh() {
            Ok(Some(self.refresh().await?))
        } else {
            Ok(None)
        }
    }

    /// Reads the whole snapshot ordered by account code.
    pub async fn snapshot(&self) -> Result<Vec<balance_snapshots::Model>, CacheError> {
        balance_snapshots::Entity::find()
            .order_by_asc(balance_snapshots::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Recomputes the materialized view under both locks.
    async fn do_refresh(&self) -> Result<RefreshOutcome, CacheError> {
        let started = Utc::now();

        let txn = self.db.begin().await.map_err(db_err)?;

        // Cross-process exclusion; released at commit
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [REFRESH_LOCK_KEY.into()],
        ))
        .await
        .map_err(db_err)?;

        txn.execute(Statement::from_string(
            DbBackend::Postgres,
            "REFRESH MATERIALIZED VIEW account_balances",
        ))
        .await
        .map_err(db_err)?;

        let row = txn
            .query_one(Statement::from_string(
                DbBackend::Postgres,
                "SELECT COUNT(*) AS row_count FROM account_balances",
            ))
            .await
            .map_err(db_err)?
            .ok_or_else(|| CacheError::Database("count returned no row".to_string()))?;
        let row_count: i64 = row.try_get("", "row_count").map_err(db_err)?;

        let refreshed_at = Utc::now();
        let duration_ms = elapsed_ms(started);

        cache_refresh_log::ActiveModel {
            refreshed_at: Set(refreshed_at.into()),
            duration_ms: Set(i64::try_from(duration_ms).unwrap_or(i64::MAX)),
            row_count: Set(row_count),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            rows = row_count,
            duration_ms,
            "reporting cache refreshed"
        );

        Ok(RefreshOutcome {
            refreshed_at,
            duration_ms,
            rows: row_count.max(0).unsigned_abs(),
            skipped: false,
        })
    }

    async fn latest_log(&self) -> Result<Option<cache_refresh_log::Model>, CacheError> {
        cache_refresh_log::Entity::find()
            .order_by_desc(cache_refresh_log::Column::Id)
            .one(&self.db)
            .await
            .map_err(db_err)
    }
}

fn elapsed_ms(since: chrono::DateTime<Utc>) -> u64 {
    Utc::now()
        .signed_duration_since(since)
        .num_milliseconds()
        .max(0)
        .unsigned_abs()
}

fn db_err(err: DbErr) -> CacheError {
    CacheError::Database(err.to_string())
}
