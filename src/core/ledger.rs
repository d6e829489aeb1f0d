//! Thread-safe account registry
//!
//! This module provides the `Ledger` struct, the single point of account
//! creation and lookup.
//!
//! # Design
//!
//! The `Ledger` stores `Arc<Account>` values in a `DashMap`. The map's own
//! sharded locks guard only the identifier → account mapping; balances are
//! guarded by each account's lock. A lookup clones the `Arc` and releases the
//! map shard before returning, so no map lock is ever held while a balance
//! lock is held.
//!
//! # Thread Safety
//!
//! Lookups and insertions are race-free from any number of threads. Accounts
//! are never removed or replaced once inserted, so a resolved reference stays
//! valid and refers to the one shared instance for the life of the ledger.

use std::sync::Arc;

use crate::types::{Account, AccountId, LedgerError};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Registry mapping account identifiers to shared accounts
///
/// Constructed explicitly and shared through `Arc`; independent ledgers can
/// coexist in one process.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: DashMap<AccountId, Arc<Account>>,
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Build a ledger from a mapping of identifiers to opening balances
    ///
    /// Every entry is attempted. Entries that fail (duplicate identifier,
    /// negative balance) are logged and skipped without affecting the others;
    /// the errors are returned alongside the ledger.
    pub fn from_balances<I, K>(balances: I) -> (Self, Vec<LedgerError>)
    where
        I: IntoIterator<Item = (K, Decimal)>,
        K: Into<AccountId>,
    {
        let ledger = Self::new();
        let mut errors = Vec::new();

        for (id, balance) in balances {
            if let Err(e) = ledger.create_account(id, balance) {
                warn!(error = %e, "Skipping account during setup");
                errors.push(e);
            }
        }

        (ledger, errors)
    }

    /// Insert a new account with the given opening balance
    ///
    /// # Errors
    ///
    /// * `LedgerError::DuplicateAccount` - the identifier is already registered
    /// * `LedgerError::InvalidOperation` - the opening balance is negative
    pub fn create_account(
        &self,
        id: impl Into<AccountId>,
        initial_balance: Decimal,
    ) -> Result<Arc<Account>, LedgerError> {
        let id = id.into();

        if initial_balance < Decimal::ZERO {
            return Err(LedgerError::invalid_operation(format!(
                "opening balance for '{}' must not be negative, got {}",
                id, initial_balance
            )));
        }

        match self.accounts.entry(id) {
            Entry::Occupied(entry) => Err(LedgerError::duplicate_account(entry.key())),
            Entry::Vacant(entry) => {
                let account = Arc::new(Account::new(entry.key().clone(), initial_balance));
                debug!(account = %account.id(), balance = %initial_balance, "Account created");
                entry.insert(Arc::clone(&account));
                Ok(account)
            }
        }
    }

    /// Resolve an identifier to its shared account
    ///
    /// # Errors
    ///
    /// * `LedgerError::UnknownAccount` - no account has this identifier
    pub fn lookup(&self, id: &str) -> Result<Arc<Account>, LedgerError> {
        self.accounts
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::unknown_account(id))
    }

    /// Number of registered accounts
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// All accounts sorted by identifier, the global lock order
    fn sorted_accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<Arc<Account>> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        accounts
    }

    /// Consistent `(identifier, balance)` view of every account, sorted by identifier
    ///
    /// Every account lock is taken in identifier order (the same order
    /// operations use) before any balance is read, so the snapshot never
    /// shows half of an in-flight transfer.
    ///
    /// # Errors
    ///
    /// * `LedgerError::LockPoisoned` - an account lock is poisoned
    pub fn snapshot(&self) -> Result<Vec<(AccountId, Decimal)>, LedgerError> {
        let accounts = self.sorted_accounts();

        let guards = accounts
            .iter()
            .map(|account| account.lock())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(guards
            .iter()
            .map(|guard| (guard.id().to_string(), guard.balance()))
            .collect())
    }

    /// Sum of every balance, read from a consistent snapshot
    pub fn total_balance(&self) -> Result<Decimal, LedgerError> {
        Ok(self
            .snapshot()?
            .into_iter()
            .map(|(_, balance)| balance)
            .sum())
    }
}
