//! I/O module
//!
//! Handles the CSV forms of the setup, submission and reporting interfaces.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, report serialization)
//! - `sync_reader` - Synchronous submission reader and setup-file loader
//! - `async_reader` - Asynchronous submission reader with batch interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_account_row, convert_operation_row, write_balances_csv, write_outcomes_csv,
    AccountRow, OperationRow,
};
pub use sync_reader::{load_ledger, SyncReader};
