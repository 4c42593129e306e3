use std::{env, env::VarError};

use clap::Parser;

pub const DEFAULT_RUN_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/loyalty.db";

/// Command-line arguments. Every flag falls back to an environment variable, and flags win when both are given.
#[derive(Debug, Clone, Parser)]
#[command(version, about = "Loyalty points ledger server and accrual reconciliation engine")]
pub struct Arguments {
    /// The address the health endpoint listens on
    #[arg(short = 'a', long = "address", env = "RUN_ADDRESS", default_value = DEFAULT_RUN_ADDRESS)]
    pub run_address: String,
    /// The SQLite database URL
    #[arg(short = 'd', long = "database-uri", env = "DATABASE_URI", default_value = DEFAULT_DATABASE_URL)]
    pub database_uri: String,
    /// Base address of the accrual calculation service
    #[arg(short = 'r', long = "accrual-address", env = "ACCRUAL_SYSTEM_ADDRESS")]
    pub accrual_address: Option<String>,
    /// Print the tuning environment variables and exit
    #[arg(long = "print-env")]
    pub print_env: bool,
}

pub fn display_envs() {
    const DISPLAY_ENVS: [&str; 13] = [
        "RUST_LOG",
        "RUN_ADDRESS",
        "DATABASE_URI",
        "DATABASE_MAX_CONNECTIONS",
        "ACCRUAL_SYSTEM_ADDRESS",
        "ACCRUAL_REQUEST_TIMEOUT",
        "ACCRUAL_WORKERS",
        "ACCRUAL_QUEUE_SIZE",
        "ACCRUAL_POLL_INTERVAL",
        "LEDGER_RETRY_ATTEMPTS",
        "LEDGER_RETRY_BACKOFF_MS",
        "STORAGE_TIMEOUT",
        "STALE_ORDER_THRESHOLD",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
