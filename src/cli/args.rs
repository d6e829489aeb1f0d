use crate::strategy::BatchConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Run deposits, withdrawals and transfers concurrently against an in-memory ledger
#[derive(Parser, Debug)]
#[command(name = "ledger-engine")]
#[command(about = "Run ledger operations concurrently against an in-memory ledger", long_about = None)]
pub struct CliArgs {
    /// Operations CSV file (type,account,to,amount)
    #[arg(value_name = "OPERATIONS", help = "Path to the operations CSV file")]
    pub operations_file: PathBuf,

    /// Accounts CSV file (account,balance) used to populate the ledger
    #[arg(
        long = "accounts",
        value_name = "FILE",
        help = "Path to the opening balances CSV file"
    )]
    pub accounts_file: PathBuf,

    /// Processing strategy
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "concurrent",
        help = "'sequential' for file-order execution or 'concurrent' for the worker pool"
    )]
    pub strategy: StrategyType,

    /// Number of operations per batch (concurrent mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of operations per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Worker threads (concurrent mode only)
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Worker threads executing operations (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Bounded wait per account lock in milliseconds (concurrent mode only)
    #[arg(
        long = "lock-timeout-ms",
        value_name = "MILLIS",
        help = "Fail an operation whose account lock is not acquired within this many milliseconds"
    )]
    pub lock_timeout_ms: Option<u64>,

    /// Optional outcomes CSV destination
    #[arg(
        long = "outcomes",
        value_name = "FILE",
        help = "Write one outcome row per operation to this file"
    )]
    pub outcomes_file: Option<PathBuf>,
}

/// Available processing strategies
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sequential,
    Concurrent,
}

impl CliArgs {
    /// Create a BatchConfig from CLI arguments, falling back to defaults
    pub fn to_batch_config(&self) -> BatchConfig {
        let default = BatchConfig::default();
        BatchConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.workers.unwrap_or(default.workers),
            self.lock_timeout_ms.map(Duration::from_millis),
        )
    }
}
