//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: Account and its lock guard
//! - `operation`: Requested ledger mutations
//! - `outcome`: Per-operation results
//! - `error`: Error types for the ledger engine

pub mod account;
pub mod error;
pub mod operation;
pub mod outcome;

pub use account::{Account, AccountGuard, AccountId};
pub use error::LedgerError;
pub use operation::{Operation, OperationType};
pub use outcome::{Outcome, OutcomeStatus, Rejection};
