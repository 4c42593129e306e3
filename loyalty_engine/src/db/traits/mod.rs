//! # Storage contracts
//!
//! The traits in this module define what a storage backend must provide to host the loyalty ledger.
//!
//! * [`LedgerDatabase`] is the narrow contract used by the reconciliation engine: list the orders that still await a
//!   decision, read one order, and atomically apply an authoritative verdict (status change plus balance credit).
//! * [`AccountManagement`] covers everything else: accounts, order submission, balances and withdrawals.
//!
//! Both traits are object-safe and `Send + Sync`, so a single backend instance can be shared between request handlers
//! and background workers.
mod account_management;
mod data_objects;
mod ledger_database;

pub use account_management::{AccountApiError, AccountManagement};
pub use data_objects::InsertOrderResult;
pub use ledger_database::{LedgerDatabase, LedgerError};
