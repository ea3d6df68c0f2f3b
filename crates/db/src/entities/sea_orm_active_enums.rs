//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account classification, mirrors the `account_type` PostgreSQL enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned by the business.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Obligations owed to others.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Owner's residual interest.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Income earned.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Costs incurred.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<AccountType> for tally_core::ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<tally_core::ledger::AccountType> for AccountType {
    fn from(value: tally_core::ledger::AccountType) -> Self {
        match value {
            tally_core::ledger::AccountType::Asset => Self::Asset,
            tally_core::ledger::AccountType::Liability => Self::Liability,
            tally_core::ledger::AccountType::Equity => Self::Equity,
            tally_core::ledger::AccountType::Revenue => Self::Revenue,
            tally_core::ledger::AccountType::Expense => Self::Expense,
        }
    }
}

/// Entry lifecycle status, mirrors the `entry_status` PostgreSQL enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted, no balance effect.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Entry has been posted to the ledger.
    #[sea_orm(string_value = "posted")]
    Posted,
    /// Entry has been voided or cancelled.
    #[sea_orm(string_value = "void")]
    Void,
}

impl From<EntryStatus> for tally_core::ledger::EntryStatus {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Draft => Self::Draft,
            EntryStatus::Posted => Self::Posted,
            EntryStatus::Void => Self::Void,
        }
    }
}

/// Entry origin, mirrors the `entry_source` PostgreSQL enum.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_source")]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    /// Entered by a user through the journal.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Created by the period-closing engine.
    #[sea_orm(string_value = "closing")]
    Closing,
    /// Reversing entry created by voiding a posted entry.
    #[sea_orm(string_value = "reversal")]
    Reversal,
}
