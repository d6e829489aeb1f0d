//! Rust Ledger Engine CLI
//!
//! Runs a file of ledger operations against opening balances and prints the
//! final balances.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --accounts accounts.csv operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --strategy sequential operations.csv > balances.csv
//! cargo run -- --accounts accounts.csv --workers 8 --lock-timeout-ms 500 \
//!     --outcomes outcomes.csv operations.csv > balances.csv
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, file not readable, etc.)

use rust_ledger_engine::{cli, telemetry};
use std::process;
use tracing::error;

fn main() {
    telemetry::init();

    let args = cli::parse_args();

    let mut output = std::io::stdout();
    if let Err(e) = rust_ledger_engine::run(&args, &mut output) {
        error!(error = %e, "Run aborted");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
