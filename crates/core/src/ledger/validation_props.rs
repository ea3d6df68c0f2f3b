//! Property tests for entry validation and reversal.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::balance::signed_delta;
use super::error::LedgerError;
use super::types::{AccountInfo, AccountType, LineInput};
use super::validation::{reversal_lines, validate_lines};

fn ok_lookup(code: &str) -> Result<AccountInfo, LedgerError> {
    Ok(AccountInfo {
        code: code.to_string(),
        account_type: AccountType::Asset,
        is_active: true,
    })
}

fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_00i64).prop_map(|n| Decimal::new(n, 2))
}

/// A balanced line set: each generated amount appears once as a debit and
/// once as a credit against distinct account codes.
fn balanced_lines_strategy() -> impl Strategy<Value = Vec<LineInput>> {
    prop::collection::vec(amount_strategy(), 1..10).prop_map(|amounts| {
        let mut lines = Vec::with_capacity(amounts.len() * 2);
        for (i, amount) in amounts.iter().enumerate() {
            lines.push(LineInput::debit(format!("1{i:03}"), *amount));
            lines.push(LineInput::credit(format!("4{i:03}"), *amount));
        }
        lines
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any balanced line set passes validation with equal totals.
    #[test]
    fn prop_balanced_sets_accepted(lines in balanced_lines_strategy()) {
        let totals = validate_lines(&lines, ok_lookup);
        prop_assert!(totals.is_ok());
        let totals = totals.unwrap();
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.difference(), Decimal::ZERO);
    }

    /// Perturbing any single line's amount breaks the balance and is rejected.
    #[test]
    fn prop_perturbed_sets_rejected(
        lines in balanced_lines_strategy(),
        extra in amount_strategy(),
    ) {
        let mut lines = lines;
        lines[0].debit += extra;

        let rejected = matches!(
            validate_lines(&lines, ok_lookup),
            Err(LedgerError::UnbalancedEntry { .. })
        );
        prop_assert!(rejected);
    }

    /// Reversal is an involution: reversing twice restores the original lines.
    #[test]
    fn prop_reversal_involution(lines in balanced_lines_strategy()) {
        let twice = reversal_lines(&reversal_lines(&lines));
        prop_assert_eq!(twice, lines);
    }

    /// Posting an entry and its reversal nets to zero on every account,
    /// for both normal balance sides.
    #[test]
    fn prop_reversal_cancels_balance_effect(lines in balanced_lines_strategy()) {
        let reversed = reversal_lines(&lines);

        for normal in [
            crate::ledger::balance::NormalBalance::Debit,
            crate::ledger::balance::NormalBalance::Credit,
        ] {
            for (original, mirror) in lines.iter().zip(reversed.iter()) {
                let net = signed_delta(normal, original.debit, original.credit)
                    + signed_delta(normal, mirror.debit, mirror.credit);
                prop_assert_eq!(net, Decimal::ZERO);
            }
        }
    }
}
