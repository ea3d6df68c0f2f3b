//! Ledger domain types for entry creation and validation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::balance::NormalBalance;

/// Account classification in the chart of accounts.
///
/// Determines the normal balance side:
/// - Asset/Expense accounts are debit-normal
/// - Liability/Equity/Revenue accounts are credit-normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned by the business.
    Asset,
    /// Obligations owed to others.
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountType {
    /// Returns the normal balance side for this account type.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        };
        write!(f, "{s}")
    }
}

/// Information about an account needed for validation.
///
/// Supplied by the external account directory; the ledger core never
/// creates or edits accounts.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    /// The account code.
    pub code: String,
    /// The account type.
    pub account_type: AccountType,
    /// Whether the account accepts postings.
    pub is_active: bool,
}

/// Ledger entry lifecycle status.
///
/// State machine: Draft -> Posted -> Void (terminal), plus
/// Draft -> Void for cancelling before posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted and has no balance effect.
    Draft,
    /// Entry has been posted to the ledger (immutable).
    Posted,
    /// Entry has been voided (immutable).
    Void,
}

impl EntryStatus {
    /// Returns true if the entry can transition to posted.
    #[must_use]
    pub fn can_post(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry can be voided via a reversing entry.
    #[must_use]
    pub fn can_void(&self) -> bool {
        matches!(self, Self::Posted)
    }

    /// Returns true if the entry can be cancelled without balance effects.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if the entry is immutable.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted | Self::Void)
    }
}

/// Input for a single ledger line.
///
/// Exactly one of `debit` or `credit` must be non-zero (and positive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// The account to post to.
    pub account_code: String,
    /// Debit amount (zero when this is a credit line).
    pub debit: Decimal,
    /// Credit amount (zero when this is a debit line).
    pub credit: Decimal,
    /// Optional memo for this line.
    pub memo: Option<String>,
}

impl LineInput {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            account_code: account_code.into(),
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Attaches a memo to the line.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Input for creating a new ledger entry.
#[derive(Debug, Clone)]
pub struct CreateEntryInput {
    /// Business date of the entry.
    pub entry_date: NaiveDate,
    /// Description of the entry.
    pub description: String,
    /// Optional source document reference (e.g., invoice number).
    pub reference: Option<String>,
    /// The ledger lines.
    pub lines: Vec<LineInput>,
}

/// Entry totals for validation and display.
#[derive(Debug, Clone)]
pub struct EntryTotals {
    /// Sum of all debit amounts.
    pub total_debit: Decimal,
    /// Sum of all credit amounts.
    pub total_credit: Decimal,
    /// Whether debits equal credits exactly.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates new entry totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_machine() {
        assert!(EntryStatus::Draft.can_post());
        assert!(!EntryStatus::Posted.can_post());
        assert!(!EntryStatus::Void.can_post());

        assert!(EntryStatus::Posted.can_void());
        assert!(!EntryStatus::Draft.can_void());
        assert!(!EntryStatus::Void.can_void());

        assert!(EntryStatus::Draft.can_cancel());
        assert!(!EntryStatus::Posted.can_cancel());
    }

    #[test]
    fn test_status_immutability() {
        assert!(!EntryStatus::Draft.is_immutable());
        assert!(EntryStatus::Posted.is_immutable());
        assert!(EntryStatus::Void.is_immutable());
    }

    #[test]
    fn test_normal_balance_sides() {
        assert_eq!(AccountType::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(
            AccountType::Liability.normal_balance(),
            NormalBalance::Credit
        );
        assert_eq!(AccountType::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_totals_balanced() {
        let totals = EntryTotals::new(dec!(100.00), dec!(100.00));
        assert!(totals.is_balanced);
        assert_eq!(totals.difference(), Decimal::ZERO);
    }

    #[test]
    fn test_totals_unbalanced() {
        let totals = EntryTotals::new(dec!(100.00), dec!(50.00));
        assert!(!totals.is_balanced);
        assert_eq!(totals.difference(), dec!(50.00));
    }

    #[test]
    fn test_line_constructors() {
        let line = LineInput::debit("1101", dec!(250)).with_memo("cash in");
        assert_eq!(line.debit, dec!(250));
        assert_eq!(line.credit, Decimal::ZERO);
        assert_eq!(line.memo.as_deref(), Some("cash in"));

        let line = LineInput::credit("4101", dec!(250));
        assert_eq!(line.debit, Decimal::ZERO);
        assert_eq!(line.credit, dec!(250));
    }
}
