//! `SeaORM` entity definitions for the ledger schema.

pub mod accounts;
pub mod balance_snapshots;
pub mod cache_refresh_log;
pub mod closing_periods;
pub mod counters;
pub mod ledger_entries;
pub mod ledger_lines;
pub mod sea_orm_active_enums;
