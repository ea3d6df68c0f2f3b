//! Period-end closing plans.
//!
//! Builds the closing entry that zeroes revenue and expense accounts and
//! moves net income to retained earnings. Planning is pure: live balances
//! come in as a snapshot, the plan goes out as ordinary ledger lines that
//! post through the same validation as any manual entry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::{AccountType, LineInput};

/// A live account balance, as read when planning a close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceView {
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Current running balance in the account's normal-balance sign.
    pub balance: Decimal,
}

/// A fully computed closing entry, ready to be created and posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosingPlan {
    /// Entry date for the closing entry (the period end).
    pub entry_date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// The closing lines, balanced by construction.
    pub lines: Vec<LineInput>,
    /// Total revenue being closed.
    pub total_revenue: Decimal,
    /// Total expense being closed.
    pub total_expense: Decimal,
    /// Net income moved into retained earnings.
    pub net_income: Decimal,
}

impl ClosingPlan {
    /// Builds a closing plan from a snapshot of live balances.
    ///
    /// One debit line per revenue account and one credit line per expense
    /// account, each for its full balance, plus retained earnings lines
    /// carrying the revenue and expense totals. Accounts with a zero
    /// balance are skipped. Returns `None` when net income is zero, in
    /// which case there is nothing to move to retained earnings.
    #[must_use]
    pub fn build(
        entry_date: NaiveDate,
        period_label: &str,
        accounts: &[AccountBalanceView],
        retained_earnings_code: &str,
    ) -> Option<Self> {
        let mut lines = Vec::new();
        let mut total_revenue = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;

        for account in accounts {
            if account.balance.is_zero() {
                continue;
            }
            match account.account_type {
                AccountType::Revenue => {
                    total_revenue += account.balance;
                    lines.push(
                        signed_line(&account.code, account.balance, Side::Debit)
                            .with_memo(format!("Close revenue: {}", account.name)),
                    );
                }
                AccountType::Expense => {
                    total_expense += account.balance;
                    lines.push(
                        signed_line(&account.code, account.balance, Side::Credit)
                            .with_memo(format!("Close expense: {}", account.name)),
                    );
                }
                AccountType::Asset | AccountType::Liability | AccountType::Equity => {}
            }
        }

        let net_income = total_revenue - total_expense;
        if lines.is_empty() || net_income.is_zero() {
            return None;
        }

        if !total_revenue.is_zero() {
            lines.push(
                signed_line(retained_earnings_code, total_revenue, Side::Credit)
                    .with_memo("Revenue closed to retained earnings"),
            );
        }
        if !total_expense.is_zero() {
            lines.push(
                signed_line(retained_earnings_code, total_expense, Side::Debit)
                    .with_memo("Expenses closed to retained earnings"),
            );
        }

        Some(Self {
            entry_date,
            description: format!("Period-end closing {period_label}"),
            lines,
            total_revenue,
            total_expense,
            net_income,
        })
    }

    /// Sum of debits across the plan's lines. Always equals the credit sum.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of credits across the plan's lines.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

enum Side {
    Debit,
    Credit,
}

/// Builds a line for a signed amount. A negative amount (a contra balance)
/// lands on the opposite side so every line stays strictly positive.
fn signed_line(code: &str, amount: Decimal, side: Side) -> LineInput {
    let positive = amount > Decimal::ZERO;
    match (side, positive) {
        (Side::Debit, true) | (Side::Credit, false) => LineInput::debit(code, amount.abs()),
        (Side::Credit, true) | (Side::Debit, false) => LineInput::credit(code, amount.abs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    const RETAINED_EARNINGS: &str = "3201";

    fn account(code: &str, account_type: AccountType, balance: Decimal) -> AccountBalanceView {
        AccountBalanceView {
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type,
            balance,
        }
    }

    fn period_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).expect("valid date")
    }

    #[test]
    fn test_plan_closes_revenue_and_expense() {
        let accounts = vec![
            account("1101", AccountType::Asset, dec!(500)),
            account("4101", AccountType::Revenue, dec!(300)),
            account("4102", AccountType::Revenue, dec!(200)),
            account("5101", AccountType::Expense, dec!(150)),
        ];

        let plan = ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS)
            .expect("non-zero balances produce a plan");

        assert_eq!(plan.total_revenue, dec!(500));
        assert_eq!(plan.total_expense, dec!(150));
        assert_eq!(plan.net_income, dec!(350));

        // Two revenue debits, one expense credit, two retained earnings lines.
        assert_eq!(plan.lines.len(), 5);
        assert_eq!(plan.lines[0].account_code, "4101");
        assert_eq!(plan.lines[0].debit, dec!(300));
        assert_eq!(plan.lines[2].account_code, "5101");
        assert_eq!(plan.lines[2].credit, dec!(150));

        let re_credit = plan
            .lines
            .iter()
            .find(|l| l.account_code == RETAINED_EARNINGS && !l.credit.is_zero())
            .expect("retained earnings credit line");
        assert_eq!(re_credit.credit, dec!(500));

        assert_eq!(plan.total_debit(), plan.total_credit());
    }

    #[test]
    fn test_zero_balances_skipped() {
        let accounts = vec![
            account("4101", AccountType::Revenue, dec!(100)),
            account("4102", AccountType::Revenue, Decimal::ZERO),
            account("5101", AccountType::Expense, Decimal::ZERO),
        ];

        let plan = ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS)
            .expect("plan exists");

        assert!(plan.lines.iter().all(|l| l.account_code != "4102"));
        assert!(plan.lines.iter().all(|l| l.account_code != "5101"));
    }

    #[test]
    fn test_nothing_to_close_returns_none() {
        let accounts = vec![
            account("1101", AccountType::Asset, dec!(500)),
            account("4101", AccountType::Revenue, Decimal::ZERO),
        ];

        assert!(ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS).is_none());
    }

    #[test]
    fn test_contra_revenue_lands_on_credit_side() {
        // Sales returns leave a revenue account with a negative balance.
        let accounts = vec![
            account("4101", AccountType::Revenue, dec!(1000)),
            account("4190", AccountType::Revenue, dec!(-50)),
            account("5101", AccountType::Expense, dec!(400)),
        ];

        let plan = ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS)
            .expect("plan exists");

        let contra = plan
            .lines
            .iter()
            .find(|l| l.account_code == "4190")
            .expect("contra line present");
        assert_eq!(contra.credit, dec!(50));
        assert_eq!(contra.debit, Decimal::ZERO);

        assert_eq!(plan.total_revenue, dec!(950));
        assert_eq!(plan.net_income, dec!(550));
        assert_eq!(plan.total_debit(), plan.total_credit());
    }

    #[test]
    fn test_net_loss_plan_is_balanced() {
        let accounts = vec![
            account("4101", AccountType::Revenue, dec!(100)),
            account("5101", AccountType::Expense, dec!(300)),
        ];

        let plan = ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS)
            .expect("plan exists");

        assert_eq!(plan.net_income, dec!(-200));
        assert_eq!(plan.total_debit(), plan.total_credit());
    }

    fn balance_strategy() -> impl Strategy<Value = Decimal> {
        (-1_000_000_00i64..1_000_000_00i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any snapshot of revenue and expense balances produces either no
        /// plan or a balanced one whose lines net retained earnings to
        /// exactly the net income.
        #[test]
        fn prop_plan_always_balanced(
            revenues in prop::collection::vec(balance_strategy(), 0..8),
            expenses in prop::collection::vec(balance_strategy(), 0..8),
        ) {
            let mut accounts = Vec::new();
            for (i, balance) in revenues.iter().enumerate() {
                accounts.push(account(&format!("4{i:03}"), AccountType::Revenue, *balance));
            }
            for (i, balance) in expenses.iter().enumerate() {
                accounts.push(account(&format!("5{i:03}"), AccountType::Expense, *balance));
            }

            if let Some(plan) =
                ClosingPlan::build(period_end(), "2026-01", &accounts, RETAINED_EARNINGS)
            {
                prop_assert_eq!(plan.total_debit(), plan.total_credit());

                let re_net: Decimal = plan
                    .lines
                    .iter()
                    .filter(|l| l.account_code == RETAINED_EARNINGS)
                    .map(|l| l.credit - l.debit)
                    .sum();
                prop_assert_eq!(re_net, plan.net_income);

                for line in &plan.lines {
                    let has_debit = !line.debit.is_zero();
                    let has_credit = !line.credit.is_zero();
                    prop_assert!(has_debit != has_credit);
                    prop_assert!(line.debit >= Decimal::ZERO);
                    prop_assert!(line.credit >= Decimal::ZERO);
                }
            }
        }
    }
}
