//! Account balance calculation rules.
//!
//! Running balances are maintained incrementally from posted lines and
//! can always be rebuilt from scratch; both paths share these rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The side on which an account's balance normally sits.
///
/// - Debit-normal (Asset, Expense): balance += debit - credit
/// - Credit-normal (Liability, Equity, Revenue): balance += credit - debit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Debits increase the balance.
    Debit,
    /// Credits increase the balance.
    Credit,
}

/// Calculates the signed balance change a line applies to an account.
#[must_use]
pub fn signed_delta(normal: NormalBalance, debit: Decimal, credit: Decimal) -> Decimal {
    match normal {
        NormalBalance::Debit => debit - credit,
        NormalBalance::Credit => credit - debit,
    }
}

/// Computes an account's balance from its posted debit/credit totals.
///
/// This is the rebuild path: summing every posted line must reproduce the
/// incrementally maintained running balance.
#[must_use]
pub fn balance_for_totals(
    normal: NormalBalance,
    total_debit: Decimal,
    total_credit: Decimal,
) -> Decimal {
    signed_delta(normal, total_debit, total_credit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_debit_normal_delta() {
        assert_eq!(
            signed_delta(NormalBalance::Debit, dec!(100), dec!(0)),
            dec!(100)
        );
        assert_eq!(
            signed_delta(NormalBalance::Debit, dec!(0), dec!(50)),
            dec!(-50)
        );
        assert_eq!(
            signed_delta(NormalBalance::Debit, dec!(100), dec!(30)),
            dec!(70)
        );
    }

    #[test]
    fn test_credit_normal_delta() {
        assert_eq!(
            signed_delta(NormalBalance::Credit, dec!(0), dec!(100)),
            dec!(100)
        );
        assert_eq!(
            signed_delta(NormalBalance::Credit, dec!(50), dec!(0)),
            dec!(-50)
        );
        assert_eq!(
            signed_delta(NormalBalance::Credit, dec!(30), dec!(100)),
            dec!(70)
        );
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Incremental deltas and rebuild-from-totals always agree.
        #[test]
        fn prop_incremental_matches_rebuild(
            pairs in prop::collection::vec((amount_strategy(), amount_strategy()), 1..20),
        ) {
            for normal in [NormalBalance::Debit, NormalBalance::Credit] {
                let mut running = Decimal::ZERO;
                let mut total_debit = Decimal::ZERO;
                let mut total_credit = Decimal::ZERO;

                for (debit, credit) in &pairs {
                    running += signed_delta(normal, *debit, *credit);
                    total_debit += *debit;
                    total_credit += *credit;
                }

                prop_assert_eq!(
                    running,
                    balance_for_totals(normal, total_debit, total_credit),
                    "incremental running balance must equal rebuild from totals"
                );
            }
        }

        /// The two normal sides are exact mirrors of each other.
        #[test]
        fn prop_sides_are_mirrors(debit in amount_strategy(), credit in amount_strategy()) {
            prop_assert_eq!(
                signed_delta(NormalBalance::Debit, debit, credit),
                -signed_delta(NormalBalance::Credit, debit, credit)
            );
        }
    }
}
