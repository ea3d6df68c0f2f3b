//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod closing;
pub mod counter;
pub mod ledger;
pub mod report_cache;
pub mod validation;

pub use account::{AccountError, AccountRepository, CreateAccountInput};
pub use closing::{ClosingError, ClosingOutcome, ClosingRepository, IncomeStatement, StatementRow};
pub use counter::{CounterRepository, GeneratedNumber, JOURNAL_TYPE_CODE};
pub use ledger::{BalanceCheck, EntryFilter, EntryWithLines, LedgerRepository, RebuildResult, VoidOutcome};
pub use report_cache::ReportCacheRepository;
pub use validation::ValidationRepository;
