//! Concurrent batch processing strategy
//!
//! This module provides a multi-threaded implementation of the
//! ProcessingStrategy trait. Operations are read in batches and each batch is
//! handed to the [`Dispatcher`], which executes it on a bounded worker pool.
//!
//! # Architecture
//!
//! ```text
//! ConcurrentStrategy
//!     ├── BatchConfig (batch_size, workers, lock_timeout)
//!     ├── AsyncReader (batch CSV reading)
//!     └── Dispatcher  (bounded worker pool)
//!         └── Executor (sorted-identifier locking, shared Ledger)
//! ```
//!
//! # Ordering
//!
//! Batches are processed one after another: every operation of a batch has
//! an outcome before the next batch is read. Inside a batch, operations that
//! share an account serialize in lock-race order, not file order.

use crate::core::{Dispatcher, Executor, Ledger};
use crate::io::async_reader::AsyncReader;
use crate::strategy::{log_summary, ProcessingStrategy};
use crate::types::{LedgerError, Outcome};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Configuration for concurrent batch processing
#[derive(Clone, Debug, PartialEq)]
pub struct BatchConfig {
    /// Number of operations read and dispatched together
    pub batch_size: usize,
    /// Worker threads in the dispatcher pool
    pub workers: usize,
    /// Bounded wait per account lock; `None` waits indefinitely
    pub lock_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            workers: num_cpus::get(),
            lock_timeout: None,
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig with custom values
    ///
    /// Zero sizes fall back to the defaults with a warning.
    pub fn new(batch_size: usize, workers: usize, lock_timeout: Option<Duration>) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(
                batch_size,
                default = default.batch_size,
                "Invalid batch_size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let workers = if workers == 0 {
            warn!(workers, default = default.workers, "Invalid workers, using default");
            default.workers
        } else {
            workers
        };

        Self {
            batch_size,
            workers,
            lock_timeout,
        }
    }
}

/// Batched, multi-threaded processing strategy
#[derive(Debug, Clone)]
pub struct ConcurrentStrategy {
    config: BatchConfig,
}

impl ConcurrentStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }
}

impl ProcessingStrategy for ConcurrentStrategy {
    fn process(
        &self,
        ledger: Arc<Ledger>,
        operations_path: &Path,
    ) -> Result<Vec<Outcome>, LedgerError> {
        let executor = Executor::new(ledger).with_lock_timeout(self.config.lock_timeout);
        let dispatcher = Dispatcher::new(executor, self.config.workers)?;

        let outcomes = dispatcher.block_on(async {
            let file = tokio::fs::File::open(operations_path)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
                        path: operations_path.display().to_string(),
                    },
                    _ => LedgerError::from(e),
                })?;

            // Wrap tokio file in a compatibility layer for csv-async
            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);

            let mut outcomes = Vec::new();
            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let first_seq = outcomes.len();
                let sequenced = batch
                    .into_iter()
                    .enumerate()
                    .map(|(offset, operation)| (first_seq + offset, operation))
                    .collect();

                // Wait for the whole batch before reading the next one
                outcomes.extend(dispatcher.dispatch(sequenced).await);
            }

            Ok::<_, LedgerError>(outcomes)
        })??;

        log_summary("concurrent", &outcomes);
        Ok(outcomes)
    }
}
