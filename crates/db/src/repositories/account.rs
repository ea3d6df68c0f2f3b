//! Account repository for chart of accounts operations.

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{accounts, sea_orm_active_enums::AccountType};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(String),

    /// Account code already exists.
    #[error("Account code already exists: {0}")]
    DuplicateCode(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Unique account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account classification.
    pub account_type: AccountType,
    /// Optional parent account code.
    pub parent_code: Option<String>,
}

/// Account repository for chart of accounts CRUD.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with a zero opening balance.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is already taken.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, AccountError> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::Code.eq(&input.code))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountError::DuplicateCode(input.code));
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(input.code),
            name: Set(input.name),
            account_type: Set(input.account_type),
            parent_code: Set(input.parent_code),
            balance: Set(rust_decimal::Decimal::ZERO),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(account.insert(&self.db).await?)
    }

    /// Gets an account by its code.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has the code.
    pub async fn get_by_code(&self, code: &str) -> Result<accounts::Model, AccountError> {
        accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await?
            .ok_or_else(|| AccountError::NotFound(code.to_string()))
    }

    /// Lists all accounts ordered by code.
    pub async fn list(&self) -> Result<Vec<accounts::Model>, AccountError> {
        Ok(accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Lists active accounts ordered by code.
    pub async fn list_active(&self) -> Result<Vec<accounts::Model>, AccountError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::IsActive.eq(true))
            .order_by_asc(accounts::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Activates or deactivates an account.
    ///
    /// Deactivation only blocks new postings; history is untouched.
    pub async fn set_active(
        &self,
        code: &str,
        is_active: bool,
    ) -> Result<accounts::Model, AccountError> {
        let account = self.get_by_code(code).await?;
        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Loads the accounts referenced by the given codes, keyed by code.
    ///
    /// Used by validation paths that need account lookups without extra
    /// round trips per line.
    pub async fn load_for_codes<C: ConnectionTrait>(
        conn: &C,
        codes: &[String],
    ) -> Result<HashMap<String, accounts::Model>, DbErr> {
        let rows = accounts::Entity::find()
            .filter(accounts::Column::Code.is_in(codes.iter().cloned()))
            .all(conn)
            .await?;

        Ok(rows.into_iter().map(|a| (a.code.clone(), a)).collect())
    }
}
