//! Rust Ledger Engine Library
//! # Overview
//!
//! This library provides a concurrent in-memory ledger: named accounts whose
//! balances are mutated by deposits, withdrawals and transfers executing in
//! parallel, without deadlock and without lost updates.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, Operation, Outcome, errors)
//! - [`core`] - Concurrency-control components:
//!   - [`core::ledger`] - Account registry and consistent snapshots
//!   - [`core::executor`] - Applies one operation under the sorted-identifier locking protocol
//!   - [`core::dispatcher`] - Runs batches of operations on a bounded worker pool
//! - [`strategy`] - Sequential and concurrent processing of operations files
//! - [`io`] - CSV setup, submission and report formats
//! - [`cli`] - CLI arguments parsing
//! - [`telemetry`] - Tracing subscriber setup
//!
//! # Operations
//!
//! - **Deposit**: Credit funds to one account
//! - **Withdraw**: Debit funds from one account (requires sufficient balance)
//! - **Transfer**: Move funds between two distinct accounts atomically
//!
//! # Outcomes
//!
//! Every submitted operation yields exactly one outcome:
//! - `Applied`: every effect took place
//! - `Rejected`: insufficient funds; nothing changed
//! - `Failed`: invalid input or an unexpected condition; nothing changed

pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use self::core::{Dispatcher, Executor, Ledger};
pub use io::{write_balances_csv, write_outcomes_csv};
pub use types::{
    Account, AccountGuard, AccountId, LedgerError, Operation, OperationType, Outcome,
    OutcomeStatus, Rejection,
};

use std::fs::File;
use std::io::Write;
use std::sync::Arc;

/// Run the command described by `args`, writing the balances report to `output`
///
/// Loads the ledger, processes the operations file with the selected
/// strategy, optionally writes the outcomes file, then writes a consistent
/// snapshot of every balance.
///
/// # Errors
///
/// Run-level failures only: unreadable input files, an unwritable report,
/// or a worker pool that cannot start. Per-operation problems are reported
/// in the outcomes.
pub fn run(args: &cli::CliArgs, output: &mut dyn Write) -> Result<(), LedgerError> {
    let ledger = Arc::new(io::load_ledger(&args.accounts_file)?);

    let config = matches!(args.strategy, cli::StrategyType::Concurrent)
        .then(|| args.to_batch_config());
    let strategy = strategy::create_strategy(args.strategy.clone(), config);

    let outcomes = strategy.process(Arc::clone(&ledger), &args.operations_file)?;

    if let Some(path) = &args.outcomes_file {
        let mut file = File::create(path)?;
        write_outcomes_csv(&outcomes, &mut file)?;
    }

    write_balances_csv(&ledger.snapshot()?, output)
}
