//! Synchronous CSV readers
//!
//! Provides a streaming iterator over the operations in a submission file and
//! a loader for the setup file. Delegates CSV format concerns to the
//! csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding `Result<Operation, String>`
//! for each CSV row:
//!
//! ```no_run
//! use rust_ledger_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("operations.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(operation) => println!("Submitting {}", operation),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as Err variants with their line number

use crate::core::Ledger;
use crate::io::csv_format::{convert_account_row, convert_operation_row, AccountRow, OperationRow};
use crate::types::{LedgerError, Operation};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;
use tracing::warn;

fn open(path: &Path) -> Result<csv::Reader<File>, LedgerError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        },
    })?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

/// Synchronous reader over a submission file
///
/// Reads one row at a time; memory use does not grow with the file.
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a submission file for streaming iteration
    ///
    /// # Errors
    ///
    /// * `LedgerError::FileNotFound` - no file at `path`
    /// * `LedgerError::IoError` - the file could not be opened
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        Ok(Self {
            reader: open(path)?,
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Operation, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<OperationRow>();

        let item = deserializer.next()?;
        self.line_num += 1;
        // +1 for the header row
        let line = self.line_num + 1;

        Some(match item {
            Ok(row) => convert_operation_row(row).map_err(|e| format!("Line {}: {}", line, e)),
            Err(e) => Err(format!("Line {}: CSV parse error: {}", line, e)),
        })
    }
}

/// Populate a new ledger from an `account,balance` setup file
///
/// Malformed rows and rows the ledger refuses (duplicate identifier, negative
/// balance) are logged and skipped; the first occurrence of an identifier
/// wins.
///
/// # Errors
///
/// * `LedgerError::FileNotFound` / `LedgerError::IoError` - the file could not be opened
pub fn load_ledger(path: &Path) -> Result<Ledger, LedgerError> {
    let mut reader = open(path)?;
    let ledger = Ledger::new();

    for (index, item) in reader.deserialize::<AccountRow>().enumerate() {
        let line = index + 2;
        let converted = item
            .map_err(|e| e.to_string())
            .and_then(convert_account_row);

        match converted {
            Ok((account, balance)) => {
                if let Err(e) = ledger.create_account(account, balance) {
                    warn!(line, error = %e, "Skipping account row");
                }
            }
            Err(e) => warn!(line, error = %e, "Skipping malformed account row"),
        }
    }

    Ok(ledger)
}
