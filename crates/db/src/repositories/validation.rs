//! Balance validation repository.
//!
//! Runs the accounting equation against the live account balances. The
//! check is detective: an out-of-balance ledger comes back as a
//! structured invalid result and a warning log, never as an error.

use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::accounts;
use tally_core::equation::{
    evaluate, recommendations, AccountRow, DetailedReport, EquationCheck, TypeTotals,
};

/// Repository for accounting equation checks over live balances.
#[derive(Debug, Clone)]
pub struct ValidationRepository {
    db: DatabaseConnection,
}

impl ValidationRepository {
    /// Creates a new validation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Checks the accounting equation against live running balances.
    pub async fn validate_real_time_balance(&self) -> Result<EquationCheck, DbErr> {
        let rows = self.active_accounts().await?;

        let mut totals = TypeTotals::default();
        for account in &rows {
            totals.add(account.account_type.clone().into(), account.balance);
        }

        Ok(evaluate(
            &totals,
            tally_core::equation::default_epsilon(),
            chrono::Utc::now(),
        ))
    }

    /// Runs the equation check right after an entry posts and logs a
    /// structured alert when the ledger no longer balances.
    ///
    /// Advisory only: the triggering transaction is already committed,
    /// so an invalid result never rolls anything back. `context_tag`
    /// names the caller for traceability.
    pub async fn validate_after_entry(
        &self,
        entry_id: Uuid,
        context_tag: &str,
    ) -> Result<EquationCheck, DbErr> {
        let check = self.validate_real_time_balance().await?;

        if check.is_valid {
            tracing::debug!(
                entry_id = %entry_id,
                context = context_tag,
                balance_diff = %check.balance_diff,
                "accounting equation holds after posting"
            );
        } else {
            tracing::warn!(
                entry_id = %entry_id,
                context = context_tag,
                balance_diff = %check.balance_diff,
                net_income = %check.net_income,
                "accounting equation broken after posting"
            );
        }

        Ok(check)
    }

    /// Builds the full validation report: summary, per-account balances,
    /// and remediation hints.
    pub async fn detailed_report(&self) -> Result<DetailedReport, DbErr> {
        let rows = self.active_accounts().await?;

        let mut totals = TypeTotals::default();
        let mut account_rows = Vec::new();
        for account in rows {
            let account_type = account.account_type.into();
            totals.add(account_type, account.balance);
            if !account.balance.is_zero() {
                account_rows.push(AccountRow {
                    code: account.code,
                    name: account.name,
                    account_type,
                    balance: account.balance,
                });
            }
        }

        let summary = evaluate(
            &totals,
            tally_core::equation::default_epsilon(),
            chrono::Utc::now(),
        );
        let recommendations = recommendations(&summary);

        Ok(DetailedReport {
            summary,
            accounts: account_rows,
            recommendations,
        })
    }

    async fn active_accounts(&self) -> Result<Vec<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_asc(accounts::Column::AccountType)
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
    }
}
