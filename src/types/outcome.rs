//! Outcome types for executed operations

use super::account::AccountId;
use super::error::LedgerError;
use super::operation::Operation;
use rust_decimal::Decimal;
use std::fmt;

/// Business-level reason an operation was not applied
///
/// A rejection is a normal result, not a system error. The ledger is left
/// exactly as it was before the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The debited account held less than the requested amount
    InsufficientFunds {
        account: AccountId,
        available: Decimal,
        requested: Decimal,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::InsufficientFunds {
                account,
                available,
                requested,
            } => write!(
                f,
                "Insufficient funds on account '{}': available {}, requested {}",
                account, available, requested
            ),
        }
    }
}

/// Result of executing one operation
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeStatus {
    /// Every effect of the operation was applied
    Applied,

    /// Refused for a business reason; no effect
    Rejected(Rejection),

    /// Refused because of invalid input or an unexpected condition; no effect
    Failed(LedgerError),
}

impl OutcomeStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, OutcomeStatus::Applied)
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied => "applied",
            OutcomeStatus::Rejected(_) => "rejected",
            OutcomeStatus::Failed(_) => "failed",
        }
    }

    /// Human-readable reason for a rejection or failure
    pub fn reason(&self) -> Option<String> {
        match self {
            OutcomeStatus::Applied => None,
            OutcomeStatus::Rejected(rejection) => Some(rejection.to_string()),
            OutcomeStatus::Failed(error) => Some(error.to_string()),
        }
    }
}

/// Outcome of one submitted operation
///
/// `seq` is the position of the operation in its submission, which is how an
/// outcome is traced back to its request when outcomes arrive out of order.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub seq: usize,
    pub operation: Operation,
    pub status: OutcomeStatus,
}

impl Outcome {
    pub fn new(seq: usize, operation: Operation, status: OutcomeStatus) -> Self {
        Self {
            seq,
            operation,
            status,
        }
    }
}
