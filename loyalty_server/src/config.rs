use std::{env, fmt::Display, str::FromStr, time::Duration};

use accrual_client::AccrualConfig;
use log::*;

use crate::{cli::Arguments, errors::ServerError};

const DEFAULT_MAX_DB_CONNECTIONS: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WORKERS: usize = 10;
const DEFAULT_QUEUE_CAPACITY: usize = 10;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(200);
const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_STALE_ORDER_THRESHOLD_HRS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `host:port` for the HTTP listener.
    pub run_address: String,
    pub database_url: String,
    pub max_db_connections: u32,
    pub accrual: AccrualConfig,
    pub reconciler: ReconcilerConfig,
}

impl ServerConfig {
    /// Combines the command line (which already falls back to the primary environment variables) with the tuning
    /// knobs that are only available as environment variables.
    pub fn from_args(args: Arguments) -> Result<Self, ServerError> {
        let address = args.accrual_address.ok_or_else(|| {
            ServerError::ConfigurationError(
                "The accrual service address is required. Use -r or set ACCRUAL_SYSTEM_ADDRESS.".to_string(),
            )
        })?;
        let request_timeout =
            Duration::from_secs(parse_env("ACCRUAL_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS, |n| *n > 0));
        let accrual = AccrualConfig::new(&address)
            .map_err(|e| ServerError::ConfigurationError(e.to_string()))?
            .with_request_timeout(request_timeout);
        let max_db_connections = parse_env("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_DB_CONNECTIONS, |n| *n > 0);
        Ok(Self {
            run_address: args.run_address,
            database_url: args.database_uri,
            max_db_connections,
            accrual,
            reconciler: ReconcilerConfig::from_env_or_default(),
        })
    }
}

//-----------------------------------------------  ReconcilerConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// Number of concurrent accrual workers.
    pub workers: usize,
    /// Capacity of the job queue between the discoverer and the workers.
    pub queue_capacity: usize,
    /// How often the database is polled for unresolved orders.
    pub poll_interval: Duration,
    /// Attempts at applying a verdict before giving up until the next discovery cycle.
    pub retry_attempts: u32,
    /// Pause between ledger retry attempts. The n-th retry waits `n * retry_backoff`.
    pub retry_backoff: Duration,
    /// Upper bound on every storage call made by the engine.
    pub storage_timeout: Duration,
    /// Unresolved orders older than this are reported as stale.
    pub stale_order_threshold: chrono::Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
            stale_order_threshold: chrono::Duration::hours(DEFAULT_STALE_ORDER_THRESHOLD_HRS),
        }
    }
}

impl ReconcilerConfig {
    pub fn from_env_or_default() -> Self {
        let workers = parse_env("ACCRUAL_WORKERS", DEFAULT_WORKERS, |n| *n > 0);
        let queue_capacity = parse_env("ACCRUAL_QUEUE_SIZE", DEFAULT_QUEUE_CAPACITY, |n| *n > 0);
        let poll_interval =
            Duration::from_secs(parse_env("ACCRUAL_POLL_INTERVAL", DEFAULT_POLL_INTERVAL.as_secs(), |n| *n > 0));
        let retry_attempts = parse_env("LEDGER_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS, |n| *n > 0);
        #[allow(clippy::cast_possible_truncation)]
        let retry_backoff = Duration::from_millis(parse_env(
            "LEDGER_RETRY_BACKOFF_MS",
            DEFAULT_RETRY_BACKOFF.as_millis() as u64,
            |_| true,
        ));
        let storage_timeout =
            Duration::from_secs(parse_env("STORAGE_TIMEOUT", DEFAULT_STORAGE_TIMEOUT.as_secs(), |n| *n > 0));
        let stale_order_threshold =
            chrono::Duration::hours(parse_env("STALE_ORDER_THRESHOLD", DEFAULT_STALE_ORDER_THRESHOLD_HRS, |n| *n > 0));
        let config = Self {
            workers,
            queue_capacity,
            poll_interval,
            retry_attempts,
            retry_backoff,
            storage_timeout,
            stale_order_threshold,
        };
        info!(
            "🪛️ Reconciler: {} workers, queue of {}, polling every {}s, stale after {} hrs",
            config.workers,
            config.queue_capacity,
            config.poll_interval.as_secs(),
            config.stale_order_threshold.num_hours()
        );
        config
    }
}

fn parse_env<T>(name: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    parse_value(name, env::var(name).ok(), default, valid)
}

fn parse_value<T>(name: &str, value: Option<String>, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(s) = value else {
        debug!("🪛️ {name} is not set. Using the default value of {default}.");
        return default;
    };
    match s.trim().parse::<T>() {
        Ok(v) if valid(&v) => v,
        Ok(v) => {
            warn!("🪛️ {v} is out of range for {name}. Using the default, {default}, instead.");
            default
        },
        Err(e) => {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        },
    }
}
