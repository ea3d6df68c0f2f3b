//! Period closing repository.
//!
//! Runs period-end closing: builds the closing plan from live revenue
//! and expense balances, posts the closing entry through the ordinary
//! posting path, and records the closed period. Income statements for
//! closed periods keep working because they read historical lines, not
//! the zeroed running balances.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    accounts, closing_periods,
    sea_orm_active_enums::{AccountType, EntrySource, EntryStatus},
};
use crate::repositories::ledger::{EntryWithLines, LedgerRepository};
use tally_core::closing::{AccountBalanceView, ClosingPlan};
use tally_core::ledger::{CreateEntryInput, LedgerError};
use tally_shared::config::ClosingConfig;

/// Error types for period closing operations.
#[derive(Debug, thiserror::Error)]
pub enum ClosingError {
    /// The period has already been closed.
    #[error("Period {year}-{month:02} has already been closed")]
    AlreadyClosed {
        /// Calendar year.
        year: i32,
        /// Calendar month (1-12).
        month: u32,
    },

    /// Net income is zero, nothing to move to retained earnings.
    #[error("Nothing to close: net income for the period is zero")]
    NothingToClose,

    /// Month outside 1-12.
    #[error("Invalid month: {0}")]
    InvalidMonth(u32),

    /// The configured retained earnings account is missing or inactive.
    #[error("Retained earnings account {0} is missing or inactive")]
    RetainedEarningsUnavailable(String),

    /// Ledger error while creating or posting the closing entry.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<DbErr> for ClosingError {
    fn from(err: DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result of a completed period close.
#[derive(Debug, Clone)]
pub struct ClosingOutcome {
    /// The recorded closed period.
    pub period: closing_periods::Model,
    /// The posted closing entry.
    pub entry: EntryWithLines,
}

/// One account's contribution to an income statement.
#[derive(Debug, Clone)]
pub struct StatementRow {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Net amount for the period, in the account's normal-balance sign.
    pub amount: Decimal,
}

/// Income statement over a historical date range.
#[derive(Debug, Clone)]
pub struct IncomeStatement {
    /// Range start (inclusive).
    pub period_start: NaiveDate,
    /// Range end (exclusive).
    pub period_end: NaiveDate,
    /// Revenue accounts with activity.
    pub revenue: Vec<StatementRow>,
    /// Expense accounts with activity.
    pub expenses: Vec<StatementRow>,
    /// Sum of revenue rows.
    pub total_revenue: Decimal,
    /// Sum of expense rows.
    pub total_expense: Decimal,
    /// Revenue minus expense.
    pub net_income: Decimal,
}

/// Period closing repository.
#[derive(Debug, Clone)]
pub struct ClosingRepository {
    db: DatabaseConnection,
    retained_earnings_code: String,
    fiscal_year_start_month: u32,
}

impl ClosingRepository {
    /// Creates a new closing repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &ClosingConfig) -> Self {
        Self {
            db,
            retained_earnings_code: config.retained_earnings_code.clone(),
            fiscal_year_start_month: config.fiscal_year_start_month,
        }
    }

    /// Builds the closing plan for a period without writing anything.
    ///
    /// Returns `Ok(None)` when net income is zero and no entry would be
    /// created.
    pub async fn preview_closing(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<ClosingPlan>, ClosingError> {
        let period_end = period_end(year, month).ok_or(ClosingError::InvalidMonth(month))?;
        self.ensure_retained_earnings().await?;

        let balances = self.closeable_balances().await?;
        Ok(ClosingPlan::build(
            period_end,
            &format!("{year}-{month:02}"),
            &balances,
            &self.retained_earnings_code,
        ))
    }

    /// Closes a period: posts the closing entry and records the period,
    /// atomically.
    ///
    /// # Errors
    ///
    /// - `AlreadyClosed` when the period has a recorded close
    /// - `NothingToClose` when net income is zero
    pub async fn run_period_end_closing(
        &self,
        year: i32,
        month: u32,
    ) -> Result<ClosingOutcome, ClosingError> {
        if self.find_closed(year, month).await?.is_some() {
            return Err(ClosingError::AlreadyClosed { year, month });
        }

        let plan = self
            .preview_closing(year, month)
            .await?
            .ok_or(ClosingError::NothingToClose)?;

        let txn = self.db.begin().await?;

        let draft = LedgerRepository::create_entry_on(
            &txn,
            CreateEntryInput {
                entry_date: plan.entry_date,
                description: plan.description.clone(),
                reference: None,
                lines: plan.lines.clone(),
            },
            EntrySource::Closing,
            None,
            EntryStatus::Draft,
        )
        .await?;
        let entry = LedgerRepository::post_entry_on(&txn, draft.entry.id).await?;

        let period = closing_periods::ActiveModel {
            id: Set(Uuid::new_v4()),
            period_year: Set(year),
            period_month: Set(i32::try_from(month).unwrap_or_default()),
            period_end: Set(plan.entry_date),
            entry_id: Set(entry.entry.id),
            total_revenue: Set(plan.total_revenue),
            total_expense: Set(plan.total_expense),
            net_income: Set(plan.net_income),
            closed_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        tracing::info!(
            year,
            month,
            entry_number = %entry.entry.entry_number,
            net_income = %plan.net_income,
            "period closed"
        );
        Ok(ClosingOutcome { period, entry })
    }

    /// Lists closed periods, newest first.
    pub async fn list_closed_periods(&self) -> Result<Vec<closing_periods::Model>, ClosingError> {
        Ok(closing_periods::Entity::find()
            .order_by_desc(closing_periods::Column::PeriodYear)
            .order_by_desc(closing_periods::Column::PeriodMonth)
            .all(&self.db)
            .await?)
    }

    /// Income statement for a period, computed from posted lines.
    ///
    /// Covers the fiscal year up to and including the requested month,
    /// so it stays correct after the period's balances are closed out.
    pub async fn historical_income_statement(
        &self,
        year: i32,
        month: u32,
    ) -> Result<IncomeStatement, ClosingError> {
        let end = period_end(year, month).ok_or(ClosingError::InvalidMonth(month))?;
        let end_exclusive = end
            .succ_opt()
            .ok_or(ClosingError::InvalidMonth(month))?;
        let start = self.fiscal_year_start(year, month);

        self.income_statement_range(start, end_exclusive).await
    }

    /// Income statement over an arbitrary `[start, end)` range.
    pub async fn income_statement_range(
        &self,
        start: NaiveDate,
        end_exclusive: NaiveDate,
    ) -> Result<IncomeStatement, ClosingError> {
        // Closing entries move income to retained earnings; including
        // them would zero out the very statement being asked for
        let rows = self
            .db
            .query_all(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"SELECT
                      a.code,
                      a.name,
                      a.account_type::TEXT AS account_type,
                      SUM(CASE WHEN a.account_type = 'revenue'
                               THEN l.credit - l.debit
                               ELSE l.debit - l.credit
                          END) AS amount
                  FROM ledger_lines l
                  JOIN ledger_entries e
                    ON e.id = l.entry_id
                   AND e.status = 'posted'
                   AND e.source <> 'closing'
                   AND e.entry_date >= $1
                   AND e.entry_date < $2
                  JOIN accounts a ON a.id = l.account_id
                  WHERE a.account_type IN ('revenue', 'expense')
                  GROUP BY a.code, a.name, a.account_type
                  ORDER BY a.code",
                [start.into(), end_exclusive.into()],
            ))
            .await?;

        let mut revenue = Vec::new();
        let mut expenses = Vec::new();
        let mut total_revenue = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;

        for row in rows {
            let account_type: String = row.try_get("", "account_type")?;
            let statement_row = StatementRow {
                code: row.try_get("", "code")?,
                name: row.try_get("", "name")?,
                amount: row.try_get("", "amount")?,
            };

            if account_type == "revenue" {
                total_revenue += statement_row.amount;
                revenue.push(statement_row);
            } else {
                total_expense += statement_row.amount;
                expenses.push(statement_row);
            }
        }

        Ok(IncomeStatement {
            period_start: start,
            period_end: end_exclusive,
            net_income: total_revenue - total_expense,
            revenue,
            expenses,
            total_revenue,
            total_expense,
        })
    }

    async fn find_closed(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Option<closing_periods::Model>, ClosingError> {
        Ok(closing_periods::Entity::find()
            .filter(closing_periods::Column::PeriodYear.eq(year))
            .filter(closing_periods::Column::PeriodMonth.eq(i32::try_from(month).unwrap_or_default()))
            .one(&self.db)
            .await?)
    }

    async fn ensure_retained_earnings(&self) -> Result<(), ClosingError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(&self.retained_earnings_code))
            .one(&self.db)
            .await?;

        match account {
            Some(a) if a.is_active && a.account_type == AccountType::Equity => Ok(()),
            _ => Err(ClosingError::RetainedEarningsUnavailable(
                self.retained_earnings_code.clone(),
            )),
        }
    }

    /// Live revenue and expense balances eligible for closing.
    async fn closeable_balances(&self) -> Result<Vec<AccountBalanceView>, ClosingError> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::IsActive.eq(true))
            .filter(
                accounts::Column::AccountType
                    .is_in([AccountType::Revenue, AccountType::Expense]),
            )
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|a| AccountBalanceView {
                code: a.code,
                name: a.name,
                account_type: a.account_type.into(),
                balance: a.balance,
            })
            .collect())
    }

    /// First day of the fiscal year containing the given period.
    fn fiscal_year_start(&self, year: i32, month: u32) -> NaiveDate {
        let start_month = self.fiscal_year_start_month.clamp(1, 12);
        let fiscal_year = if month >= start_month { year } else { year - 1 };
        NaiveDate::from_ymd_opt(fiscal_year, start_month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(fiscal_year, 1, 1).unwrap_or_default())
    }
}

/// Last day of a calendar month, or `None` for an invalid month.
fn period_end(year: i32, month: u32) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) {
        return None;
    }
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    first_of_next.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_end() {
        assert_eq!(
            period_end(2026, 1),
            NaiveDate::from_ymd_opt(2026, 1, 31)
        );
        assert_eq!(
            period_end(2026, 2),
            NaiveDate::from_ymd_opt(2026, 2, 28)
        );
        assert_eq!(
            period_end(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
        assert_eq!(
            period_end(2026, 12),
            NaiveDate::from_ymd_opt(2026, 12, 31)
        );
        assert_eq!(period_end(2026, 0), None);
        assert_eq!(period_end(2026, 13), None);
    }
}
