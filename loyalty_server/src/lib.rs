//! # Loyalty ledger server
//!
//! Hosts the order reconciliation engine, which keeps the loyalty ledger in step with the external accrual service:
//! unresolved orders are discovered by polling the database, their status is fetched from the accrual service by a
//! pool of workers, and final verdicts are applied atomically to the order and its owner's balance.
//! See [`reconciliation`] for the details.
//!
//! ## Configuration
//! The server is configured with command-line flags, which fall back to environment variables. Tuning knobs for the
//! engine are read from the environment only. See [`cli`] and [`config`].
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
pub mod cli;
pub mod config;
pub mod errors;
pub mod reconciliation;
pub mod routes;
pub mod server;

#[cfg(test)]
mod reconciler_tests;
