//! Error types for orderflow infrastructure.
//!
//! These cover storage, locking, and configuration problems. Expected
//! business outcomes (duplicate token, inactive consumer, ...) are
//! [`crate::FailureReason`] values instead.
//!
//! All errors use the `OF_ERR_` prefix. Codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Party errors
//! - 3xx: Idempotency / lock store errors
//! - 4xx: Ledger / storage errors
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{BusinessKey, OrderId, PartyId};

/// Central error enum for all orderflow operations.
#[derive(Debug, Error)]
pub enum OrderflowError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    #[error("OF_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Unique `(title, supplier, consumer)` index rejected an insert.
    #[error("OF_ERR_101: Duplicate business key: {0}")]
    DuplicateBusinessKey(BusinessKey),

    /// A record with this ID already exists.
    #[error("OF_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    #[error("OF_ERR_103: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    // =================================================================
    // Party Errors (2xx)
    // =================================================================
    #[error("OF_ERR_200: Party not found: {0}")]
    PartyNotFound(PartyId),

    /// Unique email index rejected an insert or update.
    #[error("OF_ERR_201: Email already registered: {0}")]
    DuplicateEmail(String),

    /// The atomic commit found the consumer inactive.
    #[error("OF_ERR_202: Party inactive at commit: {0}")]
    PartyInactive(PartyId),

    /// Applying a balance delta would overflow the decimal range.
    #[error("OF_ERR_203: Balance overflow for {party}: {balance} + {delta}")]
    BalanceOverflow {
        party: PartyId,
        balance: Decimal,
        delta: Decimal,
    },

    // =================================================================
    // Idempotency / Lock Store Errors (3xx)
    // =================================================================
    /// The lock store could not be reached or refused the operation.
    #[error("OF_ERR_300: Lock store unavailable: {reason}")]
    LockStoreUnavailable { reason: String },

    // =================================================================
    // Ledger / Storage Errors (4xx)
    // =================================================================
    #[error("OF_ERR_400: Storage error: {reason}")]
    Storage { reason: String },

    #[error("OF_ERR_401: Ledger commit failed: {reason}")]
    LedgerCommitFailed { reason: String },

    /// Σ profit across parties drifted from the expected total.
    #[error("OF_ERR_402: Profit conservation violated: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    #[error("OF_ERR_900: Internal error: {0}")]
    Internal(String),

    #[error("OF_ERR_901: Serialization error: {0}")]
    Serialization(String),

    #[error("OF_ERR_902: Configuration error: {0}")]
    Configuration(String),

    #[error("OF_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OrderflowError>;

impl From<std::io::Error> for OrderflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = OrderflowError::PartyNotFound(PartyId::new());
        let msg = format!("{err}");
        assert!(msg.starts_with("OF_ERR_200"), "Got: {msg}");
    }

    #[test]
    fn duplicate_business_key_display() {
        let key = BusinessKey::new("Food", PartyId::new(), PartyId::new());
        let msg = OrderflowError::DuplicateBusinessKey(key).to_string();
        assert!(msg.contains("OF_ERR_101"));
        assert!(msg.contains("Food|"));
    }

    #[test]
    fn all_errors_have_of_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(OrderflowError::LockStoreUnavailable {
                reason: "connection refused".into(),
            }),
            Box::new(OrderflowError::Storage {
                reason: "disk".into(),
            }),
            Box::new(OrderflowError::Configuration("bad".into())),
            Box::new(OrderflowError::BalanceOverflow {
                party: PartyId::new(),
                balance: Decimal::MAX,
                delta: Decimal::ONE,
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OF_ERR_"),
                "Error missing OF_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json");
        let err: OrderflowError = io.into();
        assert!(matches!(err, OrderflowError::Io(_)));
    }
}
