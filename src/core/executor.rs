//! Operation execution under the account locking protocol
//!
//! This module provides the `Executor`, which applies one [`Operation`] to the
//! ledger and reports its [`OutcomeStatus`].
//!
//! # Locking Protocol
//!
//! 1. Validate the operation (positive amount, distinct transfer accounts).
//! 2. Resolve every named account; any unknown identifier fails the whole
//!    operation before a lock is taken.
//! 3. Build the lock set: the distinct accounts touched, sorted by identifier.
//! 4. Acquire the locks one at a time in that order.
//! 5. Check and mutate with every lock held.
//! 6. Release every lock when the guards drop, on all paths.
//!
//! Acquiring in identifier order rather than in role order (`from` then `to`)
//! means two transfers in opposite directions request their locks in the same
//! sequence, so neither can hold one lock while waiting on the other.

use std::sync::Arc;
use std::time::Duration;

use crate::core::Ledger;
use crate::types::{
    Account, AccountGuard, LedgerError, Operation, Outcome, OutcomeStatus, Rejection,
};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Applies operations to a shared ledger
///
/// Cheap to clone; clones share the same ledger.
#[derive(Debug, Clone)]
pub struct Executor {
    ledger: Arc<Ledger>,

    /// Bounded wait per lock; `None` blocks until the lock is free
    lock_timeout: Option<Duration>,
}

impl Executor {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self {
            ledger,
            lock_timeout: None,
        }
    }

    /// Bound how long each lock acquisition may wait
    ///
    /// An expired wait produces `Failed(LockTimeout)` after every lock already
    /// acquired for that operation has been released.
    pub fn with_lock_timeout(mut self, lock_timeout: Option<Duration>) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Execute one operation and wrap the result with its sequence number
    pub fn execute_sequenced(&self, seq: usize, operation: Operation) -> Outcome {
        let status = self.execute(&operation);
        Outcome::new(seq, operation, status)
    }

    /// Execute one operation to completion
    ///
    /// Never panics on bad input and never returns an error: every failure is
    /// folded into the returned status.
    pub fn execute(&self, operation: &Operation) -> OutcomeStatus {
        let status = self
            .try_execute(operation)
            .unwrap_or_else(OutcomeStatus::Failed);

        match &status {
            OutcomeStatus::Failed(e) => warn!(%operation, error = %e, "Operation failed"),
            _ => debug!(%operation, status = status.label(), "Operation executed"),
        }

        status
    }

    fn try_execute(&self, operation: &Operation) -> Result<OutcomeStatus, LedgerError> {
        operation.validate()?;

        let lock_set = self.resolve_lock_set(operation)?;
        let mut guards = self.acquire_all(&lock_set)?;

        match operation {
            Operation::Deposit { account, amount } => {
                guard_for(&mut guards, account)?.credit(*amount)?;
                Ok(OutcomeStatus::Applied)
            }
            Operation::Withdraw { account, amount } => {
                let guard = guard_for(&mut guards, account)?;
                if guard.balance() < *amount {
                    return Ok(insufficient_funds(guard, *amount));
                }
                guard.debit(*amount)?;
                Ok(OutcomeStatus::Applied)
            }
            Operation::Transfer { from, to, amount } => {
                let (source, destination) = transfer_pair(&mut guards, from, to)?;
                if source.balance() < *amount {
                    return Ok(insufficient_funds(source, *amount));
                }
                // Checked before the debit so a failed credit cannot leave
                // the source debited.
                if destination.balance().checked_add(*amount).is_none() {
                    return Err(LedgerError::arithmetic_overflow("transfer", to));
                }
                source.debit(*amount)?;
                destination.credit(*amount)?;
                Ok(OutcomeStatus::Applied)
            }
        }
    }

    /// Resolve the operation's accounts into its sorted, deduplicated lock set
    fn resolve_lock_set(&self, operation: &Operation) -> Result<Vec<Arc<Account>>, LedgerError> {
        let mut lock_set = operation
            .accounts()
            .into_iter()
            .map(|id| self.ledger.lookup(id))
            .collect::<Result<Vec<_>, _>>()?;

        lock_set.sort_by(|a, b| a.id().cmp(b.id()));
        lock_set.dedup_by(|a, b| a.id() == b.id());

        Ok(lock_set)
    }

    /// Lock every account in order; on failure the guards collected so far drop
    fn acquire_all<'a>(
        &self,
        lock_set: &'a [Arc<Account>],
    ) -> Result<Vec<AccountGuard<'a>>, LedgerError> {
        lock_set
            .iter()
            .map(|account| match self.lock_timeout {
                Some(timeout) => account.lock_within(timeout),
                None => account.lock(),
            })
            .collect()
    }
}

fn insufficient_funds(guard: &AccountGuard<'_>, requested: Decimal) -> OutcomeStatus {
    OutcomeStatus::Rejected(Rejection::InsufficientFunds {
        account: guard.id().to_string(),
        available: guard.balance(),
        requested,
    })
}

fn guard_for<'g, 'a>(
    guards: &'g mut [AccountGuard<'a>],
    id: &str,
) -> Result<&'g mut AccountGuard<'a>, LedgerError> {
    guards
        .iter_mut()
        .find(|guard| guard.id() == id)
        .ok_or_else(|| LedgerError::unknown_account(id))
}

/// Split the two held guards of a transfer into (source, destination)
fn transfer_pair<'g, 'a>(
    guards: &'g mut [AccountGuard<'a>],
    from: &str,
    to: &str,
) -> Result<(&'g mut AccountGuard<'a>, &'g mut AccountGuard<'a>), LedgerError> {
    let mismatch = || {
        LedgerError::invalid_operation(format!(
            "transfer from '{}' to '{}' must lock exactly two accounts",
            from, to
        ))
    };

    match guards {
        [first, second] => {
            if first.id() == from && second.id() == to {
                Ok((first, second))
            } else if first.id() == to && second.id() == from {
                Ok((second, first))
            } else {
                Err(mismatch())
            }
        }
        _ => Err(mismatch()),
    }
}
