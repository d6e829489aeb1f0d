//! Processing strategy module
//!
//! This module defines the Strategy pattern for complete submission runs:
//! reading an operations file, executing every operation against a ledger,
//! and returning the outcomes. Strategies are selected at runtime.

use crate::cli::StrategyType;
use crate::core::Ledger;
use crate::types::{LedgerError, Outcome, OutcomeStatus};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod concurrent;
pub mod sequential;

pub use concurrent::{BatchConfig, ConcurrentStrategy};
pub use sequential::SequentialStrategy;

/// Processing strategy trait for complete submission runs
pub trait ProcessingStrategy: Send + Sync {
    /// Execute every operation in `operations_path` against `ledger`
    ///
    /// Returns one outcome per well-formed row, sorted by sequence number.
    /// Rows that cannot be parsed into an operation are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error only for run-level failures: the file cannot be
    /// opened, or the worker pool cannot start.
    fn process(
        &self,
        ledger: Arc<Ledger>,
        operations_path: &Path,
    ) -> Result<Vec<Outcome>, LedgerError>;
}

/// Create a processing strategy based on the specified strategy type
///
/// `config` is ignored by the sequential strategy.
pub fn create_strategy(
    strategy_type: StrategyType,
    config: Option<BatchConfig>,
) -> Box<dyn ProcessingStrategy> {
    match strategy_type {
        StrategyType::Sequential => Box::new(SequentialStrategy),
        StrategyType::Concurrent => {
            let config = config.unwrap_or_default();
            Box::new(ConcurrentStrategy::new(config))
        }
    }
}

/// Log applied / rejected / failed counts for a finished run
pub(crate) fn log_summary(strategy: &str, outcomes: &[Outcome]) {
    let (mut applied, mut rejected, mut failed) = (0usize, 0usize, 0usize);
    for outcome in outcomes {
        match outcome.status {
            OutcomeStatus::Applied => applied += 1,
            OutcomeStatus::Rejected(_) => rejected += 1,
            OutcomeStatus::Failed(_) => failed += 1,
        }
    }

    info!(strategy, applied, rejected, failed, "Run complete");
}
