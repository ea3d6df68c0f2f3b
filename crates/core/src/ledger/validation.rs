//! Business rule validation for ledger entries.
//!
//! This is pure logic with no database dependencies: account information
//! is supplied through a lookup closure so the same validation runs at
//! creation time and again at posting time.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{AccountInfo, EntryTotals, LineInput};

/// Validates a set of ledger lines for a balanced entry.
///
/// Checks, in order:
/// 1. At least one line is present
/// 2. Each line has exactly one of debit/credit set, and it is positive
/// 3. Each referenced account exists and is active
/// 4. Total debits equal total credits exactly
///
/// # Errors
///
/// Returns `LedgerError` describing the first violation found.
pub fn validate_lines<A>(lines: &[LineInput], account_lookup: A) -> Result<EntryTotals, LedgerError>
where
    A: Fn(&str) -> Result<AccountInfo, LedgerError>,
{
    if lines.is_empty() {
        return Err(LedgerError::EmptyEntry);
    }

    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line: index });
        }

        let has_debit = !line.debit.is_zero();
        let has_credit = !line.credit.is_zero();
        if has_debit == has_credit {
            return Err(LedgerError::InvalidLine { line: index });
        }

        let account = account_lookup(&line.account_code)?;
        if !account.is_active {
            return Err(LedgerError::AccountInactive(line.account_code.clone()));
        }

        total_debit += line.debit;
        total_credit += line.credit;
    }

    let totals = EntryTotals::new(total_debit, total_credit);
    if !totals.is_balanced {
        return Err(LedgerError::UnbalancedEntry {
            debit: totals.total_debit,
            credit: totals.total_credit,
        });
    }

    Ok(totals)
}

/// Builds the mirror image of a set of lines for a reversing entry.
///
/// Each line's debit and credit are swapped; account codes, amounts and
/// ordering are preserved, so posting the result exactly negates the
/// original entry's balance effect per account.
#[must_use]
pub fn reversal_lines(lines: &[LineInput]) -> Vec<LineInput> {
    lines
        .iter()
        .map(|line| LineInput {
            account_code: line.account_code.clone(),
            debit: line.credit,
            credit: line.debit,
            memo: line.memo.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::AccountType;
    use rust_decimal_macros::dec;

    fn ok_lookup(code: &str) -> Result<AccountInfo, LedgerError> {
        Ok(AccountInfo {
            code: code.to_string(),
            account_type: AccountType::Asset,
            is_active: true,
        })
    }

    #[test]
    fn test_balanced_lines_accepted() {
        let lines = vec![
            LineInput::debit("1101", dec!(100.00)),
            LineInput::credit("4101", dec!(100.00)),
        ];

        let totals = validate_lines(&lines, ok_lookup).expect("balanced entry is valid");
        assert!(totals.is_balanced);
        assert_eq!(totals.total_debit, dec!(100.00));
        assert_eq!(totals.total_credit, dec!(100.00));
    }

    #[test]
    fn test_multi_line_split_accepted() {
        // Sale with VAT: debit Cash 100000; credit Sales 90000; credit VAT 10000
        let lines = vec![
            LineInput::debit("1101", dec!(100000)),
            LineInput::credit("4101", dec!(90000)),
            LineInput::credit("2105", dec!(10000)),
        ];

        let totals = validate_lines(&lines, ok_lookup).expect("split entry is valid");
        assert!(totals.is_balanced);
        assert_eq!(totals.total_debit, dec!(100000));
    }

    #[test]
    fn test_empty_lines_rejected() {
        let result = validate_lines(&[], ok_lookup);
        assert!(matches!(result, Err(LedgerError::EmptyEntry)));
    }

    #[test]
    fn test_unbalanced_rejected() {
        let lines = vec![
            LineInput::debit("1101", dec!(100.00)),
            LineInput::credit("4101", dec!(50.00)),
        ];

        assert!(matches!(
            validate_lines(&lines, ok_lookup),
            Err(LedgerError::UnbalancedEntry { .. })
        ));
    }

    #[test]
    fn test_both_sides_set_rejected() {
        let lines = vec![
            LineInput {
                account_code: "1101".into(),
                debit: dec!(10.00),
                credit: dec!(10.00),
                memo: None,
            },
            LineInput::credit("4101", dec!(10.00)),
        ];

        assert!(matches!(
            validate_lines(&lines, ok_lookup),
            Err(LedgerError::InvalidLine { line: 0 })
        ));
    }

    #[test]
    fn test_neither_side_set_rejected() {
        let lines = vec![
            LineInput::debit("1101", dec!(10.00)),
            LineInput {
                account_code: "4101".into(),
                debit: Decimal::ZERO,
                credit: Decimal::ZERO,
                memo: None,
            },
        ];

        assert!(matches!(
            validate_lines(&lines, ok_lookup),
            Err(LedgerError::InvalidLine { line: 1 })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let lines = vec![
            LineInput::debit("1101", dec!(-10.00)),
            LineInput::credit("4101", dec!(-10.00)),
        ];

        assert!(matches!(
            validate_lines(&lines, ok_lookup),
            Err(LedgerError::NegativeAmount { line: 0 })
        ));
    }

    #[test]
    fn test_missing_account_rejected() {
        let lines = vec![
            LineInput::debit("9999", dec!(10.00)),
            LineInput::credit("4101", dec!(10.00)),
        ];

        let lookup = |code: &str| -> Result<AccountInfo, LedgerError> {
            if code == "9999" {
                Err(LedgerError::AccountNotFound(code.to_string()))
            } else {
                ok_lookup(code)
            }
        };

        assert!(matches!(
            validate_lines(&lines, lookup),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_inactive_account_rejected() {
        let lines = vec![
            LineInput::debit("1101", dec!(10.00)),
            LineInput::credit("4101", dec!(10.00)),
        ];

        let lookup = |code: &str| -> Result<AccountInfo, LedgerError> {
            Ok(AccountInfo {
                code: code.to_string(),
                account_type: AccountType::Asset,
                is_active: code != "4101",
            })
        };

        assert!(matches!(
            validate_lines(&lines, lookup),
            Err(LedgerError::AccountInactive(code)) if code == "4101"
        ));
    }

    #[test]
    fn test_reversal_mirrors_lines() {
        let lines = vec![
            LineInput::debit("1101", dec!(100000)).with_memo("cash"),
            LineInput::credit("4101", dec!(90000)),
            LineInput::credit("2105", dec!(10000)),
        ];

        let reversed = reversal_lines(&lines);
        assert_eq!(reversed.len(), 3);
        assert_eq!(reversed[0].credit, dec!(100000));
        assert_eq!(reversed[0].debit, Decimal::ZERO);
        assert_eq!(reversed[0].memo.as_deref(), Some("cash"));
        assert_eq!(reversed[1].debit, dec!(90000));
        assert_eq!(reversed[2].debit, dec!(10000));

        // A reversal of a balanced entry is itself balanced.
        let totals = validate_lines(&reversed, ok_lookup).expect("reversal is valid");
        assert!(totals.is_balanced);
    }
}
