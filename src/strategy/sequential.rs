//! Sequential processing strategy
//!
//! Executes operations one at a time, in file order, on the calling thread.
//! The same executor and locking protocol are used as in the concurrent
//! strategy; only the scheduling differs. Because serialization order equals
//! submission order the result is deterministic, which makes this strategy
//! the reference run for a submission file.

use crate::core::{Executor, Ledger};
use crate::io::sync_reader::SyncReader;
use crate::strategy::{log_summary, ProcessingStrategy};
use crate::types::{LedgerError, Outcome};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// Single-threaded, file-order processing strategy
#[derive(Debug, Clone, Copy)]
pub struct SequentialStrategy;

impl ProcessingStrategy for SequentialStrategy {
    fn process(
        &self,
        ledger: Arc<Ledger>,
        operations_path: &Path,
    ) -> Result<Vec<Outcome>, LedgerError> {
        let executor = Executor::new(ledger);
        let reader = SyncReader::new(operations_path)?;

        let mut outcomes = Vec::new();
        for result in reader {
            match result {
                Ok(operation) => {
                    outcomes.push(executor.execute_sequenced(outcomes.len(), operation));
                }
                Err(e) => warn!(error = %e, "Skipping operation row"),
            }
        }

        log_summary("sequential", &outcomes);
        Ok(outcomes)
    }
}
