//! Error types for the marketplace ledger

use crate::types::Wei;
use thiserror::Error;

/// Result type for marketplace operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marketplace errors
///
/// Any error returned by a mutating operation means the transaction was
/// rejected as a whole: no state change, no event.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller lacks the required role or ownership relation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced store or item does not exist or is not live
    #[error("Not found: {0}")]
    NotFound(String),

    /// Attempted duplicate role grant
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Purchase quantity exceeds live stock
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        /// Units requested
        requested: u64,
        /// Units in stock
        available: u64,
    },

    /// Attached value below the required total
    #[error("Insufficient payment: required {required} wei, attached {attached} wei")]
    InsufficientPayment {
        /// Exact amount due
        required: Wei,
        /// Amount attached to the call
        attached: Wei,
    },

    /// Empty name/description, non-positive price or quantity, oversized field
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invariant violation (balance conservation, arithmetic overflow, etc.)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Currency transfer channel failure
    #[error("Transfer error: {0}")]
    Transfer(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable kind label for logging and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::InsufficientStock { .. } => "insufficient_stock",
            Error::InsufficientPayment { .. } => "insufficient_payment",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Transfer(_) => "transfer",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_amounts() {
        let err = Error::InsufficientPayment {
            required: Wei::new(2000),
            attached: Wei::new(500),
        };
        let msg = err.to_string();
        assert!(msg.contains("2000"));
        assert!(msg.contains("500"));
        assert_eq!(err.kind(), "insufficient_payment");
    }

    #[test]
    fn test_stock_error_kind() {
        let err = Error::InsufficientStock {
            requested: 6,
            available: 5,
        };
        assert_eq!(err.kind(), "insufficient_stock");
    }
}
