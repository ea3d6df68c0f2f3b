//! Accounting equation evaluation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::types::{EquationCheck, TypeTotals};

/// Default tolerance for the equation check: one cent.
#[must_use]
pub fn default_epsilon() -> Decimal {
    Decimal::new(1, 2)
}

/// Evaluates the accounting equation from per-type totals.
///
/// Assets must equal Liabilities + Equity + Net Income within `epsilon`.
/// The result is always a structured value; an out-of-balance ledger is
/// reported, never raised as an error.
#[must_use]
pub fn evaluate(totals: &TypeTotals, epsilon: Decimal, checked_at: DateTime<Utc>) -> EquationCheck {
    let net_income = totals.revenue - totals.expense;
    let adjusted_equity = totals.equity + net_income;
    let balance_diff = totals.assets - (totals.liabilities + adjusted_equity);
    let is_valid = balance_diff.abs() < epsilon;

    let mut messages = Vec::new();
    if !is_valid {
        messages.push(format!(
            "Accounting equation not balanced: Assets ({}) != Liabilities + Equity + Net Income ({}). Difference: {}",
            totals.assets,
            totals.liabilities + adjusted_equity,
            balance_diff
        ));
    }
    if net_income < Decimal::ZERO {
        messages.push(format!(
            "Net loss detected: {} (Revenue: {}, Expenses: {})",
            net_income, totals.revenue, totals.expense
        ));
    }

    EquationCheck {
        is_valid,
        total_assets: totals.assets,
        total_liabilities: totals.liabilities,
        total_equity: totals.equity,
        net_income,
        adjusted_equity,
        balance_diff,
        checked_at,
        messages,
    }
}

/// Derives remediation hints from a check result.
///
/// Attribution is directional: the sign of the difference says which side
/// of the equation is short.
#[must_use]
pub fn recommendations(check: &EquationCheck) -> Vec<String> {
    let mut out = Vec::new();

    if !check.is_valid {
        if check.balance_diff > Decimal::ZERO {
            out.push(
                "Assets exceed Liabilities + Equity. Check for missing liabilities or understated equity."
                    .to_string(),
            );
        } else {
            out.push(
                "Liabilities + Equity exceed Assets. Check for missing assets or overstated liabilities."
                    .to_string(),
            );
        }
    }

    if !check.net_income.is_zero() {
        out.push(
            "Consider running period-end closing to move net income to retained earnings."
                .to_string(),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals(
        assets: Decimal,
        liabilities: Decimal,
        equity: Decimal,
        revenue: Decimal,
        expense: Decimal,
    ) -> TypeTotals {
        TypeTotals {
            assets,
            liabilities,
            equity,
            revenue,
            expense,
        }
    }

    #[test]
    fn test_balanced_ledger_is_valid() {
        // Assets 1000 = Liabilities 200 + Equity 700 + (Revenue 300 - Expense 200)
        let t = totals(dec!(1000), dec!(200), dec!(700), dec!(300), dec!(200));
        let check = evaluate(&t, default_epsilon(), Utc::now());

        assert!(check.is_valid);
        assert_eq!(check.net_income, dec!(100));
        assert_eq!(check.adjusted_equity, dec!(800));
        assert_eq!(check.balance_diff, Decimal::ZERO);
        assert!(check.messages.is_empty());
    }

    #[test]
    fn test_unbalanced_ledger_is_invalid_not_error() {
        let t = totals(dec!(1000), dec!(200), dec!(700), dec!(0), dec!(0));
        let check = evaluate(&t, default_epsilon(), Utc::now());

        assert!(!check.is_valid);
        assert_eq!(check.balance_diff, dec!(100));
        assert_eq!(check.messages.len(), 1);
    }

    #[test]
    fn test_within_epsilon_is_valid() {
        let t = totals(dec!(1000.009), dec!(200), dec!(800), dec!(0), dec!(0));
        let check = evaluate(&t, default_epsilon(), Utc::now());
        assert!(check.is_valid);
    }

    #[test]
    fn test_exactly_epsilon_is_invalid() {
        let t = totals(dec!(1000.01), dec!(200), dec!(800), dec!(0), dec!(0));
        let check = evaluate(&t, default_epsilon(), Utc::now());
        assert!(!check.is_valid);
    }

    #[test]
    fn test_net_loss_warning() {
        let t = totals(dec!(900), dec!(200), dec!(800), dec!(100), dec!(200));
        let check = evaluate(&t, default_epsilon(), Utc::now());

        assert!(check.is_valid);
        assert_eq!(check.net_income, dec!(-100));
        assert_eq!(check.messages.len(), 1);
        assert!(check.messages[0].contains("Net loss"));
    }

    #[test]
    fn test_recommendations_direction() {
        let t = totals(dec!(1100), dec!(200), dec!(800), dec!(0), dec!(0));
        let check = evaluate(&t, default_epsilon(), Utc::now());
        let recs = recommendations(&check);
        assert!(recs[0].contains("Assets exceed"));

        let t = totals(dec!(900), dec!(200), dec!(800), dec!(0), dec!(0));
        let check = evaluate(&t, default_epsilon(), Utc::now());
        let recs = recommendations(&check);
        assert!(recs[0].contains("exceed Assets"));
    }

    #[test]
    fn test_recommendations_suggest_closing() {
        let t = totals(dec!(1100), dec!(200), dec!(800), dec!(150), dec!(50));
        let check = evaluate(&t, default_epsilon(), Utc::now());
        let recs = recommendations(&check);
        assert!(recs.iter().any(|r| r.contains("period-end closing")));
    }

    #[test]
    fn test_type_totals_accumulation() {
        use crate::ledger::AccountType;

        let mut t = TypeTotals::default();
        t.add(AccountType::Asset, dec!(100));
        t.add(AccountType::Asset, dec!(50));
        t.add(AccountType::Liability, dec!(30));
        t.add(AccountType::Equity, dec!(70));
        t.add(AccountType::Revenue, dec!(80));
        t.add(AccountType::Expense, dec!(30));

        assert_eq!(t.assets, dec!(150));
        assert_eq!(t.liabilities, dec!(30));
        assert_eq!(t.equity, dec!(70));
        assert_eq!(t.revenue, dec!(80));
        assert_eq!(t.expense, dec!(30));
    }
}
