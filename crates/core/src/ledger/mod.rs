//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Entry and line domain types
//! - The draft/posted/void status machine
//! - Balance calculation rules per account type
//! - Business rule validation for entry creation and posting
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{balance_for_totals, signed_delta, NormalBalance};
pub use error::LedgerError;
pub use types::{
    AccountInfo, AccountType, CreateEntryInput, EntryStatus, EntryTotals, LineInput,
};
pub use validation::{reversal_lines, validate_lines};
