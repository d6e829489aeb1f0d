//! Core concurrency-control module
//!
//! This module contains the ledger processing components:
//! - `ledger` - Account registry (creation, lookup, consistent snapshots)
//! - `executor` - Applies one operation under the sorted-identifier locking protocol
//! - `dispatcher` - Runs batches of operations on a bounded worker pool

pub mod dispatcher;
pub mod executor;
pub mod ledger;

pub use dispatcher::Dispatcher;
pub use executor::Executor;
pub use ledger::Ledger;
