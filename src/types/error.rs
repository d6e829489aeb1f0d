//! Error types for the ledger engine
//!
//! This module defines every error that can occur while setting up the ledger,
//! reading operation files, or executing operations.
//!
//! # Error Categories
//!
//! - **Setup Errors**: Duplicate accounts, invalid opening balances
//! - **Operation Errors**: Unknown accounts, malformed operations
//! - **Arithmetic Errors**: Overflow, underflow in balance calculations
//! - **Concurrency Errors**: Lock timeouts, poisoned locks, panicked workers
//! - **File I/O Errors**: File not found, CSV parse failures
//!
//! Insufficient funds is not an error. It is reported through
//! [`crate::types::Rejection`].

use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger engine
///
/// Errors raised while executing an operation never escape the executor; they
/// are converted into [`crate::types::OutcomeStatus::Failed`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// An account with this identifier already exists in the ledger
    ///
    /// Fatal to the single creation call only.
    #[error("Account '{account}' already exists")]
    DuplicateAccount {
        /// The duplicated account identifier
        account: String,
    },

    /// An operation referenced an account the ledger does not know
    #[error("Unknown account '{account}'")]
    UnknownAccount {
        /// The identifier that did not resolve
        account: String,
    },

    /// Malformed operation or setup input, detected before any lock is taken
    #[error("Invalid operation: {reason}")]
    InvalidOperation {
        /// Description of what is wrong with the input
        reason: String,
    },

    /// Arithmetic overflow would occur
    #[error("Arithmetic overflow in {operation} on account '{account}'")]
    ArithmeticOverflow {
        /// Operation that would overflow
        operation: String,
        /// Account identifier
        account: String,
    },

    /// Arithmetic underflow would occur (a debit below zero)
    #[error("Arithmetic underflow in {operation} on account '{account}'")]
    ArithmeticUnderflow {
        /// Operation that would underflow
        operation: String,
        /// Account identifier
        account: String,
    },

    /// Bounded lock acquisition expired
    #[error("Timed out after {waited_ms}ms waiting for the lock on account '{account}'")]
    LockTimeout {
        /// Account whose lock could not be acquired
        account: String,
        /// Configured wait in milliseconds
        waited_ms: u128,
    },

    /// A thread panicked while holding the account lock
    #[error("Lock on account '{account}' is poisoned")]
    LockPoisoned {
        /// Account whose lock is poisoned
        account: String,
    },

    /// The worker executing an operation panicked before producing an outcome
    #[error("Worker executing operation #{seq} panicked: {message}")]
    WorkerPanicked {
        /// Submission sequence number of the operation
        seq: usize,
        /// Panic or join error description
        message: String,
    },

    /// The worker pool could not be started
    #[error("Failed to start worker pool: {message}")]
    RuntimeUnavailable {
        /// Description of the runtime error
        message: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV parsing error occurred
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl LedgerError {
    /// Create a DuplicateAccount error
    pub fn duplicate_account(account: &str) -> Self {
        LedgerError::DuplicateAccount {
            account: account.to_string(),
        }
    }

    /// Create an UnknownAccount error
    pub fn unknown_account(account: &str) -> Self {
        LedgerError::UnknownAccount {
            account: account.to_string(),
        }
    }

    /// Create an InvalidOperation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        LedgerError::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Create an InvalidOperation error for a non-positive amount
    pub fn non_positive_amount(amount: Decimal) -> Self {
        Self::invalid_operation(format!("amount must be positive, got {}", amount))
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create an ArithmeticUnderflow error
    pub fn arithmetic_underflow(operation: &str, account: &str) -> Self {
        LedgerError::ArithmeticUnderflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(account: &str, waited: std::time::Duration) -> Self {
        LedgerError::LockTimeout {
            account: account.to_string(),
            waited_ms: waited.as_millis(),
        }
    }

    /// Create a LockPoisoned error
    pub fn lock_poisoned(account: &str) -> Self {
        LedgerError::LockPoisoned {
            account: account.to_string(),
        }
    }

    /// Create a WorkerPanicked error
    pub fn worker_panicked(seq: usize, message: impl Into<String>) -> Self {
        LedgerError::WorkerPanicked {
            seq,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    #[rstest]
    #[case::duplicate_account(
        LedgerError::DuplicateAccount { account: "A1".to_string() },
        "Account 'A1' already exists"
    )]
    #[case::unknown_account(
        LedgerError::UnknownAccount { account: "ZZ".to_string() },
        "Unknown account 'ZZ'"
    )]
    #[case::invalid_operation(
        LedgerError::InvalidOperation { reason: "transfer from 'A1' to itself".to_string() },
        "Invalid operation: transfer from 'A1' to itself"
    )]
    #[case::arithmetic_overflow(
        LedgerError::ArithmeticOverflow { operation: "deposit".to_string(), account: "A1".to_string() },
        "Arithmetic overflow in deposit on account 'A1'"
    )]
    #[case::lock_timeout(
        LedgerError::LockTimeout { account: "A2".to_string(), waited_ms: 50 },
        "Timed out after 50ms waiting for the lock on account 'A2'"
    )]
    #[case::worker_panicked(
        LedgerError::WorkerPanicked { seq: 7, message: "boom".to_string() },
        "Worker executing operation #7 panicked: boom"
    )]
    #[case::parse_error_with_line(
        LedgerError::ParseError { line: Some(42), message: "Invalid field".to_string() },
        "CSV parse error at line 42: Invalid field"
    )]
    #[case::parse_error_without_line(
        LedgerError::ParseError { line: None, message: "Invalid field".to_string() },
        "CSV parse error: Invalid field"
    )]
    #[case::file_not_found(
        LedgerError::FileNotFound { path: "accounts.csv".to_string() },
        "File not found: accounts.csv"
    )]
    fn test_error_display(#[case] error: LedgerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::duplicate_account(
        LedgerError::duplicate_account("A1"),
        LedgerError::DuplicateAccount { account: "A1".to_string() }
    )]
    #[case::unknown_account(
        LedgerError::unknown_account("A9"),
        LedgerError::UnknownAccount { account: "A9".to_string() }
    )]
    #[case::lock_timeout(
        LedgerError::lock_timeout("A1", Duration::from_millis(250)),
        LedgerError::LockTimeout { account: "A1".to_string(), waited_ms: 250 }
    )]
    #[case::non_positive_amount(
        LedgerError::non_positive_amount(Decimal::ZERO),
        LedgerError::InvalidOperation { reason: "amount must be positive, got 0".to_string() }
    )]
    fn test_helper_functions(#[case] result: LedgerError, #[case] expected: LedgerError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: LedgerError = io_error.into();
        assert!(matches!(error, LedgerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
