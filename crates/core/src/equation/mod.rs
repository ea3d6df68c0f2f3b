//! Accounting equation checks.
//!
//! Computes the health of Assets = Liabilities + Equity + Net Income.
//! These checks are detective, not preventive: a failing check is a
//! structured invalid result, never an error, so callers (alerting,
//! period close) decide remediation.

pub mod check;
pub mod types;

pub use check::{default_epsilon, evaluate, recommendations};
pub use types::{AccountRow, DetailedReport, EquationCheck, TypeTotals};
