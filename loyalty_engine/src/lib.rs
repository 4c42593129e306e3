//! Loyalty Ledger Engine
//!
//! Users submit purchase-order numbers and accrue loyalty points once an external accrual authority confirms a payout.
//! Accrued points can later be spent as withdrawals. This library holds everything that touches the ledger's state:
//!
//! 1. Database management and control ([`mod@db`]). SQLite is the supported backend. The storage contracts are
//!    defined as traits so that the reconciliation engine and the API can be exercised against other implementations
//!    (including test doubles). The data types used in the database are defined in [`db_types`].
//! 2. The public API ([`mod@ledger_api`]) for creating accounts, submitting orders, reading balances and withdrawing
//!    points.
//!
//! The ledger enforces two invariants at the storage level: a balance is never negative, and an accrual is credited
//! exactly once, in the same transaction that moves its order to `PROCESSED`.
mod db;

pub mod db_types;
mod ledger_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use db::traits::{AccountApiError, AccountManagement, InsertOrderResult, LedgerDatabase, LedgerError};
pub use ledger_api::{accounts_api::AccountApi, order_flow_api::OrderFlowApi};
