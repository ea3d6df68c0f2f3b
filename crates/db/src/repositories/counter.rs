//! Counter repository for atomic document number generation.
//!
//! Numbers come from a per-type, per-year counter row incremented with a
//! single upsert, so concurrent callers can never observe the same value.
//! Counters never reset or reuse values; a number consumed by a cancelled
//! draft simply leaves a gap.

use chrono::NaiveDate;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Statement,
};

use crate::entities::counters;
use tally_core::numbering::{counter_year, format_document_number};

/// Document type code for journal entries.
pub const JOURNAL_TYPE_CODE: &str = "JV";

/// A freshly generated document number.
#[derive(Debug, Clone)]
pub struct GeneratedNumber {
    /// The counter value backing this number.
    pub counter: i64,
    /// The formatted document number.
    pub document_number: String,
}

/// Counter repository for document numbering.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    db: DatabaseConnection,
}

impl CounterRepository {
    /// Creates a new counter repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Atomically generates the next document number for a type and date.
    pub async fn generate_number(
        &self,
        type_code: &str,
        date: NaiveDate,
    ) -> Result<GeneratedNumber, DbErr> {
        Self::generate_number_on(&self.db, type_code, date).await
    }

    /// Same as [`Self::generate_number`], but on a caller-supplied
    /// connection so it can join an open transaction.
    pub async fn generate_number_on<C: ConnectionTrait>(
        conn: &C,
        type_code: &str,
        date: NaiveDate,
    ) -> Result<GeneratedNumber, DbErr> {
        let year = counter_year(date);

        // Single-statement upsert: the row lock serializes concurrent
        // increments and RETURNING hands each caller a distinct value.
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"INSERT INTO counters (type_code, year, value, updated_at)
              VALUES ($1, $2, 1, NOW())
              ON CONFLICT (type_code, year)
              DO UPDATE SET value = counters.value + 1, updated_at = NOW()
              RETURNING value",
            [type_code.into(), year.into()],
        );

        let row = conn
            .query_one(stmt)
            .await?
            .ok_or_else(|| DbErr::Custom("counter upsert returned no row".to_string()))?;
        let counter: i64 = row.try_get("", "value")?;

        Ok(GeneratedNumber {
            counter,
            document_number: format_document_number(counter, type_code, date),
        })
    }

    /// Shows the number the next generate call would produce, without
    /// consuming it.
    ///
    /// Purely informational: a concurrent generate can take the value
    /// before the caller does.
    pub async fn preview_number(&self, type_code: &str, date: NaiveDate) -> Result<String, DbErr> {
        let year = counter_year(date);

        let current = counters::Entity::find_by_id((type_code.to_string(), year))
            .one(&self.db)
            .await?
            .map_or(0, |c| c.value);

        Ok(format_document_number(current + 1, type_code, date))
    }

    /// Lists counter rows for a document type, newest year first.
    pub async fn counter_history(&self, type_code: &str) -> Result<Vec<counters::Model>, DbErr> {
        counters::Entity::find()
            .filter(counters::Column::TypeCode.eq(type_code))
            .order_by_desc(counters::Column::Year)
            .all(&self.db)
            .await
    }
}
