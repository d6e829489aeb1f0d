//! Concurrent dispatch of operation batches onto a bounded worker pool
//!
//! This module provides the `Dispatcher`, which fans a batch of operations out
//! to worker threads, waits for every one of them, and returns one
//! [`Outcome`] per submitted operation.
//!
//! # Architecture
//!
//! ```text
//! Dispatcher
//!     ├── Executor         (locking protocol, shared ledger)
//!     ├── tokio Runtime    (multi-thread, `workers` threads)
//!     └── Semaphore        (`workers` permits, bounds in-flight operations)
//! ```
//!
//! # Scheduling
//!
//! Each operation runs inside its own task from start to finish without an
//! await point, so a worker that holds account locks is always making
//! progress. Operations touching disjoint accounts run in parallel;
//! operations sharing an account are serialized in whatever order their lock
//! acquisitions race, which is not the submission order.
//!
//! # Completion
//!
//! `submit` returns only after every spawned task has been joined. A task that
//! panics still yields an outcome (`Failed(WorkerPanicked)`) so no operation
//! is ever dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Handle, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::Executor;
use crate::types::{LedgerError, Operation, Outcome, OutcomeStatus};

/// Bounded-parallelism operation dispatcher
#[derive(Debug)]
pub struct Dispatcher {
    executor: Executor,
    runtime: Runtime,
    permits: Arc<Semaphore>,
    workers: usize,
}

impl Dispatcher {
    /// Create a dispatcher with a pool of `workers` threads
    ///
    /// A worker count of zero is treated as one.
    ///
    /// # Errors
    ///
    /// * `LedgerError::RuntimeUnavailable` - the worker pool could not be started
    pub fn new(executor: Executor, workers: usize) -> Result<Self, LedgerError> {
        let workers = workers.max(1);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("ledger-worker")
            .build()
            .map_err(|e| LedgerError::RuntimeUnavailable {
                message: e.to_string(),
            })?;

        Ok(Self {
            executor,
            runtime,
            permits: Arc::new(Semaphore::new(workers)),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Run `future` to completion on the worker pool's runtime
    ///
    /// # Errors
    ///
    /// * `LedgerError::RuntimeUnavailable` - called from inside an async runtime,
    ///   where blocking the thread is not allowed
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, LedgerError> {
        if Handle::try_current().is_ok() {
            return Err(LedgerError::RuntimeUnavailable {
                message: "cannot block on the worker pool from inside an async runtime"
                    .to_string(),
            });
        }
        Ok(self.runtime.block_on(future))
    }

    /// Execute a batch and block until every operation has an outcome
    ///
    /// Outcome `seq` values are the operations' positions in `operations`.
    /// The returned outcomes are sorted by `seq`.
    ///
    /// # Errors
    ///
    /// * `LedgerError::RuntimeUnavailable` - called from inside an async runtime;
    ///   no operation is executed
    pub fn submit(&self, operations: Vec<Operation>) -> Result<Vec<Outcome>, LedgerError> {
        self.block_on(self.dispatch(operations.into_iter().enumerate().collect()))
    }

    /// Execute already-sequenced operations concurrently
    ///
    /// Must be awaited on this dispatcher's runtime (see [`Dispatcher::block_on`]).
    /// Returns exactly one outcome per input, sorted by `seq`.
    pub async fn dispatch(&self, batch: Vec<(usize, Operation)>) -> Vec<Outcome> {
        let mut tasks = Vec::with_capacity(batch.len());

        for (seq, operation) in batch {
            let executor = self.executor.clone();
            let permits = Arc::clone(&self.permits);
            let task_operation = operation.clone();

            let task = tokio::spawn(async move {
                // Never closed; a closed semaphore would run unthrottled
                let _permit = permits.acquire_owned().await.ok();
                executor.execute(&task_operation)
            });
            tasks.push((seq, operation, task));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (seq, operation, task) in tasks {
            let status = match task.await {
                Ok(status) => status,
                Err(e) => {
                    warn!(seq, %operation, error = %e, "Worker task did not complete");
                    OutcomeStatus::Failed(LedgerError::worker_panicked(seq, e.to_string()))
                }
            };
            outcomes.push(Outcome::new(seq, operation, status));
        }

        outcomes.sort_by_key(|outcome| outcome.seq);
        debug!(count = outcomes.len(), "Batch dispatched");
        outcomes
    }
}
