//! Initial database migration.
//!
//! Creates the ledger schema: enums, core tables, the document number
//! counters, the account_balances materialized view, triggers guarding
//! posted entries, and seed accounts.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL
        // ============================================================
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;
        db.execute_unprepared(LEDGER_LINES_SQL).await?;

        // ============================================================
        // PART 4: DOCUMENT NUMBER COUNTERS
        // ============================================================
        db.execute_unprepared(COUNTERS_SQL).await?;

        // ============================================================
        // PART 5: PERIOD CLOSING
        // ============================================================
        db.execute_unprepared(CLOSING_PERIODS_SQL).await?;

        // ============================================================
        // PART 6: REPORTING CACHE
        // ============================================================
        db.execute_unprepared(ACCOUNT_BALANCES_VIEW_SQL).await?;
        db.execute_unprepared(CACHE_REFRESH_LOG_SQL).await?;

        // ============================================================
        // PART 7: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 8: SEED DATA
        // ============================================================
        db.execute_unprepared(SEED_ACCOUNTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account classification
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

-- Entry lifecycle: draft -> posted -> void, plus draft -> void (cancel)
CREATE TYPE entry_status AS ENUM (
    'draft',
    'posted',
    'void'
);

-- Entry origin
CREATE TYPE entry_source AS ENUM (
    'manual',
    'closing',
    'reversal'
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    parent_code VARCHAR(20) REFERENCES accounts(code),
    balance NUMERIC(20, 4) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_accounts_type ON accounts(account_type);
CREATE INDEX idx_accounts_active ON accounts(is_active) WHERE is_active;
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    entry_number VARCHAR(50) NOT NULL UNIQUE,
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(100),
    status entry_status NOT NULL DEFAULT 'draft',
    source entry_source NOT NULL DEFAULT 'manual',
    reversal_of UUID REFERENCES ledger_entries(id),
    reversed_by UUID REFERENCES ledger_entries(id),
    total_debit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    total_credit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    posted_at TIMESTAMPTZ,
    voided_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_entry_totals_balanced CHECK (total_debit = total_credit)
);

CREATE INDEX idx_entries_status ON ledger_entries(status);
CREATE INDEX idx_entries_date ON ledger_entries(entry_date);
CREATE INDEX idx_entries_source ON ledger_entries(source);
";

const LEDGER_LINES_SQL: &str = r"
CREATE TABLE ledger_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES ledger_entries(id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    account_code VARCHAR(20) NOT NULL,
    debit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    credit NUMERIC(20, 4) NOT NULL DEFAULT 0,
    memo TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_lines_entry_line UNIQUE (entry_id, line_no),
    -- Exactly one side is set, and it is positive
    CONSTRAINT chk_line_single_side CHECK (
        (debit > 0 AND credit = 0) OR (credit > 0 AND debit = 0)
    )
);

CREATE INDEX idx_lines_entry ON ledger_lines(entry_id);
CREATE INDEX idx_lines_account ON ledger_lines(account_id);
";

const COUNTERS_SQL: &str = r"
CREATE TABLE counters (
    type_code VARCHAR(10) NOT NULL,
    year INTEGER NOT NULL,
    value BIGINT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    PRIMARY KEY (type_code, year)
);
";

const CLOSING_PERIODS_SQL: &str = r"
CREATE TABLE closing_periods (
    id UUID PRIMARY KEY,
    period_year INTEGER NOT NULL,
    period_month INTEGER NOT NULL CHECK (period_month BETWEEN 1 AND 12),
    period_end DATE NOT NULL,
    entry_id UUID NOT NULL REFERENCES ledger_entries(id),
    total_revenue NUMERIC(20, 4) NOT NULL,
    total_expense NUMERIC(20, 4) NOT NULL,
    net_income NUMERIC(20, 4) NOT NULL,
    closed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT uq_closing_period UNIQUE (period_year, period_month)
);
";

const ACCOUNT_BALANCES_VIEW_SQL: &str = r"
-- Reporting cache: balances recomputed from posted lines, refreshed on
-- demand by the report cache repository.
CREATE MATERIALIZED VIEW account_balances AS
SELECT
    a.id AS account_id,
    a.code,
    a.name,
    a.account_type,
    a.is_active,
    COALESCE(SUM(
        CASE WHEN a.account_type IN ('asset', 'expense')
             THEN ll.debit - ll.credit
             ELSE ll.credit - ll.debit
        END
    ), 0) AS balance
FROM accounts a
LEFT JOIN (ledger_lines ll
    JOIN ledger_entries le
      ON le.id = ll.entry_id AND le.status = 'posted')
  ON ll.account_id = a.id
GROUP BY a.id, a.code, a.name, a.account_type, a.is_active;

CREATE UNIQUE INDEX idx_account_balances_id ON account_balances(account_id);
";

const CACHE_REFRESH_LOG_SQL: &str = r"
CREATE TABLE cache_refresh_log (
    id BIGSERIAL PRIMARY KEY,
    refreshed_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    duration_ms BIGINT NOT NULL,
    row_count BIGINT NOT NULL
);
";

const TRIGGERS_SQL: &str = r"
-- Keep updated_at current on row updates
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_accounts_updated_at
    BEFORE UPDATE ON accounts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER trg_entries_updated_at
    BEFORE UPDATE ON ledger_entries
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

-- Lines of non-draft entries are immutable
CREATE OR REPLACE FUNCTION prevent_line_mutation()
RETURNS TRIGGER AS $$
DECLARE
    parent_status entry_status;
BEGIN
    IF TG_OP = 'DELETE' THEN
        SELECT status INTO parent_status FROM ledger_entries WHERE id = OLD.entry_id;
    ELSE
        SELECT status INTO parent_status FROM ledger_entries WHERE id = NEW.entry_id;
    END IF;

    -- NULL parent means the entry row is being cascade-deleted
    IF parent_status IS NOT NULL AND parent_status <> 'draft' THEN
        RAISE EXCEPTION 'cannot modify lines of a % entry', parent_status;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_lines_immutable
    BEFORE UPDATE OR DELETE ON ledger_lines
    FOR EACH ROW EXECUTE FUNCTION prevent_line_mutation();

-- Posted and void entries cannot be deleted
CREATE OR REPLACE FUNCTION prevent_entry_deletion()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.status <> 'draft' THEN
        RAISE EXCEPTION 'cannot delete a % entry', OLD.status;
    END IF;
    RETURN OLD;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_entries_no_delete
    BEFORE DELETE ON ledger_entries
    FOR EACH ROW EXECUTE FUNCTION prevent_entry_deletion();
";

const SEED_ACCOUNTS_SQL: &str = r"
-- Minimal chart of accounts; installations extend it as needed.
INSERT INTO accounts (id, code, name, account_type) VALUES
    (gen_random_uuid(), '1101', 'Cash', 'asset'),
    (gen_random_uuid(), '1201', 'Accounts Receivable', 'asset'),
    (gen_random_uuid(), '2101', 'Accounts Payable', 'liability'),
    (gen_random_uuid(), '2105', 'VAT Payable', 'liability'),
    (gen_random_uuid(), '3101', 'Owner Capital', 'equity'),
    (gen_random_uuid(), '3201', 'Retained Earnings', 'equity'),
    (gen_random_uuid(), '4101', 'Sales Revenue', 'revenue'),
    (gen_random_uuid(), '5101', 'Operating Expenses', 'expense')
ON CONFLICT (code) DO NOTHING;
";

const DROP_ALL_SQL: &str = r"
DROP MATERIALIZED VIEW IF EXISTS account_balances;
DROP TABLE IF EXISTS cache_refresh_log;
DROP TABLE IF EXISTS closing_periods;
DROP TABLE IF EXISTS counters;
DROP TABLE IF EXISTS ledger_lines;
DROP TABLE IF EXISTS ledger_entries;
DROP TABLE IF EXISTS accounts;
DROP FUNCTION IF EXISTS set_updated_at();
DROP FUNCTION IF EXISTS prevent_line_mutation();
DROP FUNCTION IF EXISTS prevent_entry_deletion();
DROP TYPE IF EXISTS entry_source;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS account_type;
";
