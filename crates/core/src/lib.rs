//! Core business logic for Tally.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, and calculations
//! live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping rules and entry validation
//! - `equation` - Accounting equation checks (Assets = Liabilities + Equity + Net Income)
//! - `closing` - Period-end closing plan construction
//! - `numbering` - Document number formatting and counters
//! - `cache` - Reporting cache freshness policy

pub mod cache;
pub mod closing;
pub mod equation;
pub mod ledger;
pub mod numbering;
