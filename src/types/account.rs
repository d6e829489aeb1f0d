//! Account-related types for the ledger engine
//!
//! An [`Account`] owns its balance behind an exclusive lock. The only way to
//! read or mutate the balance consistently is through an [`AccountGuard`],
//! which exists only while the lock is held and releases it when dropped.

use super::error::LedgerError;
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

/// Account identifier
///
/// Identifiers are compared lexicographically; that order is the global
/// lock-acquisition order.
pub type AccountId = String;

/// Pause between attempts when acquiring a lock with a bounded wait
const LOCK_RETRY_INTERVAL: Duration = Duration::from_micros(50);

/// Ledger entry with an immutable identifier and a lock-protected balance
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    balance: Mutex<Decimal>,
}

impl Account {
    /// Create a new account with the given opening balance
    pub fn new(id: impl Into<AccountId>, opening_balance: Decimal) -> Self {
        Account {
            id: id.into(),
            balance: Mutex::new(opening_balance),
        }
    }

    /// The account identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Acquire the account lock, blocking until it is available
    ///
    /// # Errors
    ///
    /// * `LedgerError::LockPoisoned` - a previous holder panicked
    pub fn lock(&self) -> Result<AccountGuard<'_>, LedgerError> {
        let balance = self
            .balance
            .lock()
            .map_err(|_| LedgerError::lock_poisoned(&self.id))?;

        Ok(AccountGuard {
            id: &self.id,
            balance,
        })
    }

    /// Acquire the account lock, waiting at most `timeout`
    ///
    /// # Errors
    ///
    /// * `LedgerError::LockTimeout` - the lock was still held when the wait expired
    /// * `LedgerError::LockPoisoned` - a previous holder panicked
    pub fn lock_within(&self, timeout: Duration) -> Result<AccountGuard<'_>, LedgerError> {
        let deadline = Instant::now() + timeout;

        loop {
            match self.balance.try_lock() {
                Ok(balance) => {
                    return Ok(AccountGuard {
                        id: &self.id,
                        balance,
                    })
                }
                Err(TryLockError::Poisoned(_)) => {
                    return Err(LedgerError::lock_poisoned(&self.id));
                }
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        return Err(LedgerError::lock_timeout(&self.id, timeout));
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
            }
        }
    }

    /// Read the balance under a short-lived lock
    ///
    /// Consistent for this single account only. Use
    /// [`crate::core::Ledger::snapshot`] for a consistent view across accounts.
    pub fn balance(&self) -> Result<Decimal, LedgerError> {
        Ok(self.lock()?.balance())
    }
}

/// Exclusive access to one account's balance
///
/// `credit` and `debit` live here rather than on [`Account`] so that a balance
/// can only be changed while its lock is held. Dropping the guard releases the
/// lock on every exit path.
#[derive(Debug)]
pub struct AccountGuard<'a> {
    id: &'a str,
    balance: MutexGuard<'a, Decimal>,
}

impl AccountGuard<'_> {
    /// Identifier of the locked account
    pub fn id(&self) -> &str {
        self.id
    }

    /// Current balance
    pub fn balance(&self) -> Decimal {
        *self.balance
    }

    /// Add `amount` to the balance
    ///
    /// # Errors
    ///
    /// * `LedgerError::ArithmeticOverflow` - the balance would overflow; it is left unchanged
    pub fn credit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        *self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", self.id))?;
        Ok(())
    }

    /// Subtract `amount` from the balance
    ///
    /// Callers check sufficiency first; this refuses to go below zero rather
    /// than trusting them.
    ///
    /// # Errors
    ///
    /// * `LedgerError::ArithmeticUnderflow` - the balance would become negative; it is left unchanged
    pub fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if *self.balance < amount {
            return Err(LedgerError::arithmetic_underflow("debit", self.id));
        }
        *self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| LedgerError::arithmetic_underflow("debit", self.id))?;
        Ok(())
    }
}
