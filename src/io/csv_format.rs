//! CSV format handling for setup, submission and report files
//!
//! This module centralizes all CSV format concerns, providing:
//! - Row structures for deserialization (`account,balance` and
//!   `type,account,to,amount`)
//! - Conversion from rows to domain types
//! - Balance and outcome report serialization
//!
//! All functions are pure (no file access) for easy testing.

use crate::types::{AccountId, LedgerError, Operation, OperationType, Outcome};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Row of the setup file: one account and its opening balance
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AccountRow {
    pub account: String,
    pub balance: String,
}

/// Row of the submission file
///
/// `to` is only meaningful for transfers; for deposits and withdrawals
/// `account` is the single account touched and for transfers it is the source.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationRow {
    #[serde(rename = "type")]
    pub op_type: String,
    pub account: String,
    pub to: Option<String>,
    pub amount: Option<String>,
}

fn parse_amount(raw: &str, field: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| format!("Invalid {} '{}'", field, raw))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert a setup row to an `(identifier, opening balance)` pair
pub fn convert_account_row(row: AccountRow) -> Result<(AccountId, Decimal), String> {
    let account = row.account.trim().to_string();
    if account.is_empty() {
        return Err("Account identifier is empty".to_string());
    }

    let balance = parse_amount(&row.balance, "balance")?;
    Ok((account, balance))
}

/// Convert a submission row to an Operation
///
/// Only the row's shape is checked here (known type, parseable amount, a `to`
/// account for transfers). Semantic checks such as positive amounts belong to
/// [`Operation::validate`] so they surface as per-operation outcomes.
pub fn convert_operation_row(row: OperationRow) -> Result<Operation, String> {
    let account = row.account.trim().to_string();
    if account.is_empty() {
        return Err(format!("{} is missing its account", row.op_type));
    }

    let amount = match non_empty(row.amount) {
        Some(raw) => parse_amount(&raw, "amount")?,
        None => return Err(format!("{} on '{}' requires an amount", row.op_type, account)),
    };

    match row.op_type.parse::<OperationType>()? {
        OperationType::Deposit => Ok(Operation::deposit(account, amount)),
        OperationType::Withdraw => Ok(Operation::withdraw(account, amount)),
        OperationType::Transfer => match non_empty(row.to) {
            Some(to) => Ok(Operation::transfer(account, to, amount)),
            None => Err(format!("transfer from '{}' requires a 'to' account", account)),
        },
    }
}

/// Write balances as `account,balance` CSV
///
/// Rows are written in the order given; [`crate::core::Ledger::snapshot`]
/// already sorts by identifier. Balances are printed with 4 decimal places.
pub fn write_balances_csv(
    balances: &[(AccountId, Decimal)],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["account", "balance"])?;
    for (account, balance) in balances {
        writer.write_record([account.as_str(), format!("{:.4}", balance).as_str()])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write outcomes as `seq,type,account,to,amount,status,reason` CSV
pub fn write_outcomes_csv(outcomes: &[Outcome], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["seq", "type", "account", "to", "amount", "status", "reason"])?;
    for outcome in outcomes {
        let accounts = outcome.operation.accounts();
        writer.write_record([
            outcome.seq.to_string(),
            outcome.operation.kind().to_string(),
            accounts[0].to_string(),
            accounts.get(1).map(|to| to.to_string()).unwrap_or_default(),
            outcome.operation.amount().to_string(),
            outcome.status.label().to_string(),
            outcome.status.reason().unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
