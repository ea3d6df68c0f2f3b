//! Ledger repository for journal entry lifecycle and balance sync.
//!
//! Posting and voiding flip the entry status and apply account balance
//! deltas inside one database transaction, with a conditional status
//! update as the concurrency guard: whoever flips the row first wins,
//! everyone else gets `ConcurrentModification`.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    accounts, ledger_entries, ledger_lines,
    sea_orm_active_enums::{EntrySource, EntryStatus},
};
use crate::repositories::account::AccountRepository;
use crate::repositories::counter::{CounterRepository, JOURNAL_TYPE_CODE};
use tally_shared::types::EntryId;
use tally_core::ledger::{
    balance_for_totals, reversal_lines, signed_delta, validate_lines, CreateEntryInput,
    LedgerError, LineInput,
};

/// An entry header with its lines in input order.
#[derive(Debug, Clone)]
pub struct EntryWithLines {
    /// Entry header.
    pub entry: ledger_entries::Model,
    /// Lines ordered by line number.
    pub lines: Vec<ledger_lines::Model>,
}

/// Result of voiding a posted entry.
#[derive(Debug, Clone)]
pub struct VoidOutcome {
    /// The original entry, now void.
    pub voided: ledger_entries::Model,
    /// The posted reversing entry.
    pub reversal: EntryWithLines,
}

/// Filter options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Filter by status.
    pub status: Option<EntryStatus>,
    /// Filter by source.
    pub source: Option<EntrySource>,
    /// Filter by date range start (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Filter by date range end (inclusive).
    pub date_to: Option<NaiveDate>,
}

/// Result of rebuilding one account's running balance.
#[derive(Debug, Clone)]
pub struct RebuildResult {
    /// Account code.
    pub code: String,
    /// Balance before the rebuild.
    pub previous_balance: Decimal,
    /// Balance recomputed from posted lines.
    pub rebuilt_balance: Decimal,
    /// Whether the stored balance had drifted.
    pub changed: bool,
}

/// Comparison of an account's stored balance against its posted lines.
#[derive(Debug, Clone)]
pub struct BalanceCheck {
    /// Account code.
    pub code: String,
    /// The incrementally maintained balance on the account row.
    pub stored_balance: Decimal,
    /// The balance recomputed from posted lines.
    pub computed_balance: Decimal,
    /// Whether the two agree exactly.
    pub matches: bool,
}

/// Ledger repository for entry CRUD and posting.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a draft entry with validated lines and a document number.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the lines are rejected, or a
    /// database error.
    pub async fn create_entry(
        &self,
        input: CreateEntryInput,
        source: EntrySource,
    ) -> Result<EntryWithLines, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let created = Self::create_entry_on(&txn, input, source, None, EntryStatus::Draft).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::debug!(
            entry_id = %created.entry.id,
            entry_number = %created.entry.entry_number,
            lines = created.lines.len(),
            "draft entry created"
        );
        Ok(created)
    }

    /// Creates an entry on an open connection or transaction.
    ///
    /// Validates lines against the live chart of accounts, draws a
    /// document number, and inserts the header and lines. `status` lets
    /// internal callers (void, closing) insert already-posted entries;
    /// those callers apply balance deltas themselves.
    pub(crate) async fn create_entry_on<C: ConnectionTrait>(
        conn: &C,
        input: CreateEntryInput,
        source: EntrySource,
        reversal_of: Option<Uuid>,
        status: EntryStatus,
    ) -> Result<EntryWithLines, LedgerError> {
        let codes: Vec<String> = input
            .lines
            .iter()
            .map(|l| l.account_code.clone())
            .collect();
        let account_map = AccountRepository::load_for_codes(conn, &codes)
            .await
            .map_err(db_err)?;

        let totals = validate_lines(&input.lines, |code| {
            account_map
                .get(code)
                .map(accounts::Model::as_account_info)
                .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
        })?;

        let number = CounterRepository::generate_number_on(conn, JOURNAL_TYPE_CODE, input.entry_date)
            .await
            .map_err(db_err)?;

        let now = Utc::now();
        let entry_id = Uuid::new_v4();
        let posted = status == EntryStatus::Posted;

        let entry = ledger_entries::ActiveModel {
            id: Set(entry_id),
            entry_number: Set(number.document_number),
            entry_date: Set(input.entry_date),
            description: Set(input.description),
            reference: Set(input.reference),
            status: Set(status),
            source: Set(source),
            reversal_of: Set(reversal_of),
            reversed_by: Set(None),
            total_debit: Set(totals.total_debit),
            total_credit: Set(totals.total_credit),
            posted_at: Set(posted.then(|| now.into())),
            voided_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let entry = entry.insert(conn).await.map_err(db_err)?;

        let mut lines = Vec::with_capacity(input.lines.len());
        for (index, line) in input.lines.into_iter().enumerate() {
            // load_for_codes resolved every code or validation failed
            let account = account_map
                .get(&line.account_code)
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_code.clone()))?;

            let line_no = i32::try_from(index + 1)
                .map_err(|_| LedgerError::Database("line count overflow".to_string()))?;
            let row = ledger_lines::ActiveModel {
                id: Set(Uuid::new_v4()),
                entry_id: Set(entry_id),
                line_no: Set(line_no),
                account_id: Set(account.id),
                account_code: Set(line.account_code),
                debit: Set(line.debit),
                credit: Set(line.credit),
                memo: Set(line.memo),
                created_at: Set(now.into()),
            };
            lines.push(row.insert(conn).await.map_err(db_err)?);
        }

        Ok(EntryWithLines { entry, lines })
    }

    /// Posts a draft entry: re-validates it, flips the status, and
    /// applies balance deltas to every touched account, all in one
    /// database transaction.
    ///
    /// # Errors
    ///
    /// - `OnlyDraftCanPost` when the entry is already posted or void
    /// - `ConcurrentModification` when another caller posts it first
    pub async fn post_entry(&self, entry_id: Uuid) -> Result<EntryWithLines, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;
        let posted = Self::post_entry_on(&txn, entry_id).await?;
        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            entry_id = %posted.entry.id,
            entry_number = %posted.entry.entry_number,
            total = %posted.entry.total_debit,
            "entry posted"
        );
        Ok(posted)
    }

    /// Posts an entry on an open transaction.
    pub(crate) async fn post_entry_on<C: ConnectionTrait>(
        conn: &C,
        entry_id: Uuid,
    ) -> Result<EntryWithLines, LedgerError> {
        let entry = ledger_entries::Entity::find_by_id(entry_id)
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;

        let status: tally_core::ledger::EntryStatus = entry.status.clone().into();
        if !status.can_post() {
            return Err(LedgerError::OnlyDraftCanPost);
        }

        let lines = Self::load_lines(conn, entry_id).await?;

        // Accounts may have changed since the draft was created
        let inputs: Vec<LineInput> = lines.iter().map(line_to_input).collect();
        let codes: Vec<String> = lines.iter().map(|l| l.account_code.clone()).collect();
        let account_map = AccountRepository::load_for_codes(conn, &codes)
            .await
            .map_err(db_err)?;
        validate_lines(&inputs, |code| {
            account_map
                .get(code)
                .map(accounts::Model::as_account_info)
                .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))
        })?;

        // Conditional flip is the concurrency guard: zero rows means a
        // concurrent caller got here first
        let flipped = conn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"UPDATE ledger_entries
                  SET status = 'posted', posted_at = NOW()
                  WHERE id = $1 AND status = 'draft'",
                [entry_id.into()],
            ))
            .await
            .map_err(db_err)?;
        if flipped.rows_affected() == 0 {
            return Err(LedgerError::ConcurrentModification);
        }

        Self::apply_deltas(conn, &lines, &account_map, false).await?;

        let entry = ledger_entries::Entity::find_by_id(entry_id)
            .one(conn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;
        Ok(EntryWithLines { entry, lines })
    }

    /// Voids a posted entry by flipping it to void and posting a
    /// mirror-image reversing entry, atomically. `reason` is recorded
    /// in the reversal's description.
    ///
    /// # Errors
    ///
    /// - `OnlyPostedCanVoid` when the entry is still a draft
    /// - `AlreadyVoided` when it is already void
    /// - `ConcurrentModification` when another caller voids it first
    pub async fn void_entry(
        &self,
        entry_id: Uuid,
        reason: Option<&str>,
    ) -> Result<VoidOutcome, LedgerError> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let entry = ledger_entries::Entity::find_by_id(entry_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;

        match entry.status {
            EntryStatus::Posted => {}
            EntryStatus::Void => {
                return Err(LedgerError::AlreadyVoided(EntryId::from_uuid(entry_id)))
            }
            EntryStatus::Draft => return Err(LedgerError::OnlyPostedCanVoid),
        }

        let flipped = txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"UPDATE ledger_entries
                  SET status = 'void', voided_at = NOW()
                  WHERE id = $1 AND status = 'posted'",
                [entry_id.into()],
            ))
            .await
            .map_err(db_err)?;
        if flipped.rows_affected() == 0 {
            return Err(LedgerError::ConcurrentModification);
        }

        let lines = Self::load_lines(&txn, entry_id).await?;
        let inputs: Vec<LineInput> = lines.iter().map(line_to_input).collect();
        let mirror = CreateEntryInput {
            entry_date: entry.entry_date,
            description: match reason {
                Some(reason) => format!("Reversal of {}: {reason}", entry.entry_number),
                None => format!("Reversal of {}", entry.entry_number),
            },
            reference: Some(entry.entry_number.clone()),
            lines: reversal_lines(&inputs),
        };

        let reversal = Self::create_entry_on(
            &txn,
            mirror,
            EntrySource::Reversal,
            Some(entry_id),
            EntryStatus::Posted,
        )
        .await?;

        // The reversal's balance effect is exactly the original's, negated
        let codes: Vec<String> = lines.iter().map(|l| l.account_code.clone()).collect();
        let account_map = AccountRepository::load_for_codes(&txn, &codes)
            .await
            .map_err(db_err)?;
        Self::apply_deltas(&txn, &lines, &account_map, true).await?;

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "UPDATE ledger_entries SET reversed_by = $1 WHERE id = $2",
            [reversal.entry.id.into(), entry_id.into()],
        ))
        .await
        .map_err(db_err)?;

        let voided = ledger_entries::Entity::find_by_id(entry_id)
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;

        txn.commit().await.map_err(db_err)?;

        tracing::info!(
            entry_id = %entry_id,
            reversal_id = %reversal.entry.id,
            reversal_number = %reversal.entry.entry_number,
            "entry voided"
        );
        Ok(VoidOutcome { voided, reversal })
    }

    /// Cancels a draft entry without any balance effect.
    ///
    /// # Errors
    ///
    /// Returns `OnlyDraftCanCancel` when the entry has been posted or
    /// voided already.
    pub async fn cancel_draft(&self, entry_id: Uuid) -> Result<ledger_entries::Model, LedgerError> {
        let entry = ledger_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;

        let status: tally_core::ledger::EntryStatus = entry.status.clone().into();
        if !status.can_cancel() {
            return Err(LedgerError::OnlyDraftCanCancel);
        }

        let flipped = self
            .db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"UPDATE ledger_entries
                  SET status = 'void', voided_at = NOW()
                  WHERE id = $1 AND status = 'draft'",
                [entry_id.into()],
            ))
            .await
            .map_err(db_err)?;
        if flipped.rows_affected() == 0 {
            return Err(LedgerError::ConcurrentModification);
        }

        ledger_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))
    }

    /// Gets an entry with its lines.
    pub async fn get_entry(&self, entry_id: Uuid) -> Result<EntryWithLines, LedgerError> {
        let entry = ledger_entries::Entity::find_by_id(entry_id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(LedgerError::EntryNotFound(EntryId::from_uuid(entry_id)))?;
        let lines = Self::load_lines(&self.db, entry_id).await?;
        Ok(EntryWithLines { entry, lines })
    }

    /// Lists entries matching the filter, newest first.
    pub async fn list_entries(
        &self,
        filter: EntryFilter,
    ) -> Result<Vec<ledger_entries::Model>, LedgerError> {
        let mut query = ledger_entries::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(ledger_entries::Column::Status.eq(status));
        }
        if let Some(source) = filter.source {
            query = query.filter(ledger_entries::Column::Source.eq(source));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(ledger_entries::Column::EntryDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(ledger_entries::Column::EntryDate.lte(to));
        }

        query
            .order_by_desc(ledger_entries::Column::EntryDate)
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)
    }

    /// Recomputes one account's running balance from its posted lines
    /// and stores it.
    pub async fn rebuild_balance(&self, code: &str) -> Result<RebuildResult, LedgerError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;

        let rebuilt = Self::computed_balance(&self.db, &account).await?;
        let changed = rebuilt != account.balance;

        if changed {
            tracing::warn!(
                code = %account.code,
                stored = %account.balance,
                rebuilt = %rebuilt,
                "stored balance drifted, rebuilding"
            );
            self.db
                .execute(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    "UPDATE accounts SET balance = $1, updated_at = NOW() WHERE id = $2",
                    [rebuilt.into(), account.id.into()],
                ))
                .await
                .map_err(db_err)?;
        }

        Ok(RebuildResult {
            code: account.code,
            previous_balance: account.balance,
            rebuilt_balance: rebuilt,
            changed,
        })
    }

    /// Rebuilds every account's running balance from posted lines.
    pub async fn rebuild_all_balances(&self) -> Result<Vec<RebuildResult>, LedgerError> {
        let accounts = accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut results = Vec::with_capacity(accounts.len());
        for account in accounts {
            results.push(self.rebuild_balance(&account.code).await?);
        }
        Ok(results)
    }

    /// Compares an account's stored balance against its posted lines
    /// without writing anything.
    pub async fn check_account_balance(&self, code: &str) -> Result<BalanceCheck, LedgerError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::AccountNotFound(code.to_string()))?;

        let computed = Self::computed_balance(&self.db, &account).await?;

        Ok(BalanceCheck {
            code: account.code,
            stored_balance: account.balance,
            computed_balance: computed,
            matches: account.balance == computed,
        })
    }

    async fn load_lines<C: ConnectionTrait>(
        conn: &C,
        entry_id: Uuid,
    ) -> Result<Vec<ledger_lines::Model>, LedgerError> {
        ledger_lines::Entity::find()
            .filter(ledger_lines::Column::EntryId.eq(entry_id))
            .order_by_asc(ledger_lines::Column::LineNo)
            .all(conn)
            .await
            .map_err(db_err)
    }

    /// Applies each line's balance delta to its account, negated when
    /// reversing.
    async fn apply_deltas<C: ConnectionTrait>(
        conn: &C,
        lines: &[ledger_lines::Model],
        account_map: &std::collections::HashMap<String, accounts::Model>,
        negate: bool,
    ) -> Result<(), LedgerError> {
        for line in lines {
            let account = account_map
                .get(&line.account_code)
                .ok_or_else(|| LedgerError::AccountNotFound(line.account_code.clone()))?;
            let account_type: tally_core::ledger::AccountType = account.account_type.clone().into();

            let mut delta = signed_delta(account_type.normal_balance(), line.debit, line.credit);
            if negate {
                delta = -delta;
            }

            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                "UPDATE accounts SET balance = balance + $1, updated_at = NOW() WHERE id = $2",
                [delta.into(), account.id.into()],
            ))
            .await
            .map_err(db_err)?;
        }
        Ok(())
    }

    /// Recomputes an account's balance by summing its posted lines.
    async fn computed_balance<C: ConnectionTrait>(
        conn: &C,
        account: &accounts::Model,
    ) -> Result<Decimal, LedgerError> {
        let row = conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r"SELECT
                      COALESCE(SUM(l.debit), 0) AS total_debit,
                      COALESCE(SUM(l.credit), 0) AS total_credit
                  FROM ledger_lines l
                  JOIN ledger_entries e ON e.id = l.entry_id AND e.status = 'posted'
                  WHERE l.account_id = $1",
                [account.id.into()],
            ))
            .await
            .map_err(db_err)?
            .ok_or_else(|| LedgerError::Database("balance aggregate returned no row".to_string()))?;

        let total_debit: Decimal = row.try_get("", "total_debit").map_err(db_err)?;
        let total_credit: Decimal = row.try_get("", "total_credit").map_err(db_err)?;

        let account_type: tally_core::ledger::AccountType = account.account_type.clone().into();
        Ok(balance_for_totals(
            account_type.normal_balance(),
            total_debit,
            total_credit,
        ))
    }
}

fn line_to_input(line: &ledger_lines::Model) -> LineInput {
    LineInput {
        account_code: line.account_code.clone(),
        debit: line.debit,
        credit: line.credit,
        memo: line.memo.clone(),
    }
}

fn db_err(err: DbErr) -> LedgerError {
    LedgerError::Database(err.to_string())
}
