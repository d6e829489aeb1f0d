//! Operation-related types for the ledger engine
//!
//! This module defines the requested ledger mutations and the validation that
//! runs before any account lock is taken.

use super::account::AccountId;
use super::error::LedgerError;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// Operation kinds supported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// Credit funds to one account
    Deposit,

    /// Debit funds from one account (requires sufficient balance)
    Withdraw,

    /// Move funds between two distinct accounts (requires sufficient balance
    /// on the source)
    Transfer,
}

impl OperationType {
    /// Lowercase name used in logs and CSV output
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "deposit",
            OperationType::Withdraw => "withdraw",
            OperationType::Transfer => "transfer",
        }
    }
}

impl FromStr for OperationType {
    type Err = String;

    /// Parse the `type` column of a submission file
    ///
    /// Case-insensitive, surrounding whitespace ignored; `withdrawal` is
    /// accepted for `withdraw`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "deposit" => Ok(OperationType::Deposit),
            "withdraw" | "withdrawal" => Ok(OperationType::Withdraw),
            "transfer" => Ok(OperationType::Transfer),
            other => Err(format!("Invalid operation type: '{}'", other)),
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A requested ledger mutation
///
/// Operations name accounts by identifier only; the executor resolves them
/// against the ledger, so every mutation lands on the single shared
/// [`crate::types::Account`] instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Credit `amount` to `account`
    Deposit { account: AccountId, amount: Decimal },

    /// Debit `amount` from `account`
    Withdraw { account: AccountId, amount: Decimal },

    /// Debit `amount` from `from` and credit it to `to`
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    },
}

impl Operation {
    pub fn deposit(account: impl Into<AccountId>, amount: Decimal) -> Self {
        Operation::Deposit {
            account: account.into(),
            amount,
        }
    }

    pub fn withdraw(account: impl Into<AccountId>, amount: Decimal) -> Self {
        Operation::Withdraw {
            account: account.into(),
            amount,
        }
    }

    pub fn transfer(from: impl Into<AccountId>, to: impl Into<AccountId>, amount: Decimal) -> Self {
        Operation::Transfer {
            from: from.into(),
            to: to.into(),
            amount,
        }
    }

    pub fn kind(&self) -> OperationType {
        match self {
            Operation::Deposit { .. } => OperationType::Deposit,
            Operation::Withdraw { .. } => OperationType::Withdraw,
            Operation::Transfer { .. } => OperationType::Transfer,
        }
    }

    pub fn amount(&self) -> Decimal {
        match self {
            Operation::Deposit { amount, .. }
            | Operation::Withdraw { amount, .. }
            | Operation::Transfer { amount, .. } => *amount,
        }
    }

    /// Identifiers of every account the operation touches, in role order
    /// (`from` before `to`)
    pub fn accounts(&self) -> Vec<&str> {
        match self {
            Operation::Deposit { account, .. } | Operation::Withdraw { account, .. } => {
                vec![account.as_str()]
            }
            Operation::Transfer { from, to, .. } => vec![from.as_str(), to.as_str()],
        }
    }

    /// Check the input constraints that need no account state
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidOperation` - the amount is not positive, or a
    ///   transfer names the same account on both sides
    pub fn validate(&self) -> Result<(), LedgerError> {
        let amount = self.amount();
        if amount <= Decimal::ZERO {
            return Err(LedgerError::non_positive_amount(amount));
        }

        if let Operation::Transfer { from, to, .. } = self {
            if from == to {
                return Err(LedgerError::invalid_operation(format!(
                    "transfer from '{}' to itself",
                    from
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Deposit { account, amount } => write!(f, "deposit({}, {})", account, amount),
            Operation::Withdraw { account, amount } => {
                write!(f, "withdraw({}, {})", account, amount)
            }
            Operation::Transfer { from, to, amount } => {
                write!(f, "transfer({} -> {}, {})", from, to, amount)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::deposit(Operation::deposit("A1", Decimal::new(50, 0)))]
    #[case::withdraw(Operation::withdraw("A1", Decimal::new(1, 4)))]
    #[case::transfer(Operation::transfer("A1", "A2", Decimal::new(100, 0)))]
    fn test_validate_accepts_well_formed(#[case] operation: Operation) {
        assert!(operation.validate().is_ok());
    }

    #[rstest]
    #[case::zero_deposit(Operation::deposit("A1", Decimal::ZERO))]
    #[case::negative_withdraw(Operation::withdraw("A1", Decimal::new(-5, 0)))]
    #[case::negative_transfer(Operation::transfer("A1", "A2", Decimal::new(-1, 0)))]
    #[case::self_transfer(Operation::transfer("A1", "A1", Decimal::new(10, 0)))]
    fn test_validate_rejects_malformed(#[case] operation: Operation) {
        assert!(matches!(
            operation.validate(),
            Err(LedgerError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_accounts_lists_transfer_roles_in_order() {
        let operation = Operation::transfer("B", "A", Decimal::ONE);

        assert_eq!(operation.accounts(), vec!["B", "A"]);
        assert_eq!(operation.kind(), OperationType::Transfer);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Operation::transfer("A1", "A2", Decimal::new(100, 0)).to_string(),
            "transfer(A1 -> A2, 100)"
        );
        assert_eq!(
            Operation::deposit("A1", Decimal::new(50, 0)).to_string(),
            "deposit(A1, 50)"
        );
    }

    #[rstest]
    #[case::deposit("deposit", OperationType::Deposit)]
    #[case::upper_case("  DEPOSIT ", OperationType::Deposit)]
    #[case::withdraw("withdraw", OperationType::Withdraw)]
    #[case::withdrawal_alias("Withdrawal", OperationType::Withdraw)]
    #[case::transfer("Transfer", OperationType::Transfer)]
    fn test_operation_type_from_str(#[case] raw: &str, #[case] expected: OperationType) {
        assert_eq!(raw.parse::<OperationType>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<OperationType>().unwrap(), expected);
    }

    #[test]
    fn test_operation_type_from_str_rejects_unknown() {
        assert_eq!(
            "refund".parse::<OperationType>().unwrap_err(),
            "Invalid operation type: 'refund'"
        );
    }
}
