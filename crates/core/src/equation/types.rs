//! Result types for accounting equation checks.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::AccountType;

/// Per-account-type balance totals, the input to an equation check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeTotals {
    /// Sum of active asset account balances.
    pub assets: Decimal,
    /// Sum of active liability account balances.
    pub liabilities: Decimal,
    /// Sum of active equity account balances.
    pub equity: Decimal,
    /// Sum of active revenue account balances.
    pub revenue: Decimal,
    /// Sum of active expense account balances.
    pub expense: Decimal,
}

impl TypeTotals {
    /// Adds an account balance to the total for its type.
    pub fn add(&mut self, account_type: AccountType, balance: Decimal) {
        match account_type {
            AccountType::Asset => self.assets += balance,
            AccountType::Liability => self.liabilities += balance,
            AccountType::Equity => self.equity += balance,
            AccountType::Revenue => self.revenue += balance,
            AccountType::Expense => self.expense += balance,
        }
    }
}

/// Result of an accounting equation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationCheck {
    /// Whether |balance_diff| is within the epsilon.
    pub is_valid: bool,
    /// Total assets.
    pub total_assets: Decimal,
    /// Total liabilities.
    pub total_liabilities: Decimal,
    /// Total equity (excluding current-period net income).
    pub total_equity: Decimal,
    /// Net income (revenue - expense) for the open period.
    pub net_income: Decimal,
    /// Equity adjusted for net income (equity + net income).
    pub adjusted_equity: Decimal,
    /// Assets - (liabilities + adjusted equity).
    pub balance_diff: Decimal,
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
    /// Human-readable warnings (equation mismatch, net loss).
    pub messages: Vec<String>,
}

/// A non-zero account balance row in the detailed report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRow {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Current running balance.
    pub balance: Decimal,
}

/// Detailed validation report with per-account attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedReport {
    /// The summary equation check.
    pub summary: EquationCheck,
    /// All active accounts with non-zero balances, ordered by type and code.
    pub accounts: Vec<AccountRow>,
    /// Remediation hints derived from the summary.
    pub recommendations: Vec<String>,
}
