//! Ledger error types for validation and state errors.

use rust_decimal::Decimal;
use thiserror::Error;
use tally_shared::types::EntryId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Entry has no lines.
    #[error("Entry must have at least one line")]
    EmptyEntry,

    /// A line must carry exactly one of debit or credit.
    #[error("Line {line} must have exactly one of debit or credit set")]
    InvalidLine {
        /// Zero-based index of the offending line.
        line: usize,
    },

    /// Line amount cannot be negative.
    #[error("Line {line} amount cannot be negative")]
    NegativeAmount {
        /// Zero-based index of the offending line.
        line: usize,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    UnbalancedEntry {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    // ========== Entry State Errors ==========
    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Only draft entries can be posted.
    #[error("Only draft entries can be posted")]
    OnlyDraftCanPost,

    /// Only posted entries can be voided.
    #[error("Only posted entries can be voided")]
    OnlyPostedCanVoid,

    /// Entry has already been voided.
    #[error("Entry {0} has already been voided")]
    AlreadyVoided(EntryId),

    /// Only draft entries can be cancelled.
    #[error("Only draft entries can be cancelled")]
    OnlyDraftCanCancel,

    // ========== Concurrency Errors ==========
    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Infrastructure Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyEntry => "EMPTY_ENTRY",
            Self::InvalidLine { .. } => "INVALID_LINE",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::OnlyDraftCanPost => "ONLY_DRAFT_CAN_POST",
            Self::OnlyPostedCanVoid => "ONLY_POSTED_CAN_VOID",
            Self::AlreadyVoided(_) => "ALREADY_VOIDED",
            Self::OnlyDraftCanCancel => "ONLY_DRAFT_CAN_CANCEL",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation and state errors
            Self::EmptyEntry
            | Self::InvalidLine { .. }
            | Self::NegativeAmount { .. }
            | Self::UnbalancedEntry { .. }
            | Self::AccountInactive(_)
            | Self::OnlyDraftCanPost
            | Self::OnlyPostedCanVoid
            | Self::AlreadyVoided(_)
            | Self::OnlyDraftCanCancel => 400,

            // 404 Not Found
            Self::AccountNotFound(_) | Self::EntryNotFound(_) => 404,

            // 409 Conflict - concurrency errors
            Self::ConcurrentModification => 409,

            // 500 Internal Server Error
            Self::Database(_) => 500,
        }
    }

    /// Returns true if this error is safe to retry with backoff.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }
}

impl From<LedgerError> for tally_shared::AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::AccountNotFound(_) | LedgerError::EntryNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LedgerError::ConcurrentModification => Self::Conflict(err.to_string()),
            LedgerError::Database(_) => Self::Database(err.to_string()),
            LedgerError::OnlyDraftCanPost
            | LedgerError::OnlyPostedCanVoid
            | LedgerError::AlreadyVoided(_)
            | LedgerError::OnlyDraftCanCancel => Self::BusinessRule(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_shared::AppError;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::EmptyEntry.error_code(), "EMPTY_ENTRY");
        assert_eq!(
            LedgerError::UnbalancedEntry {
                debit: dec!(100.00),
                credit: dec!(50.00),
            }
            .error_code(),
            "UNBALANCED_ENTRY"
        );
        assert_eq!(
            LedgerError::AlreadyVoided(EntryId::new()).error_code(),
            "ALREADY_VOIDED"
        );
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::EmptyEntry.http_status_code(), 400);
        assert_eq!(
            LedgerError::AccountNotFound("1101".into()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::ConcurrentModification.http_status_code(), 409);
        assert_eq!(
            LedgerError::Database("down".into()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(!LedgerError::EmptyEntry.is_retryable());
        assert!(!LedgerError::Database("down".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::UnbalancedEntry {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(
            err.to_string(),
            "Entry is not balanced. Debit: 100.00, Credit: 50.00"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let err: AppError = LedgerError::AccountNotFound("9999".into()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = LedgerError::ConcurrentModification.into();
        assert!(matches!(err, AppError::Conflict(_)));

        let err: AppError = LedgerError::EmptyEntry.into();
        assert!(matches!(err, AppError::Validation(_)));

        let err: AppError = LedgerError::AlreadyVoided(EntryId::new()).into();
        assert!(matches!(err, AppError::BusinessRule(_)));
    }
}
