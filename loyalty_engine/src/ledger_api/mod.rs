//! # Loyalty ledger public API
//!
//! * [`accounts_api`] reads account state: balances, submitted orders and withdrawal history.
//! * [`order_flow_api`] handles the two user-initiated writes: submitting a purchase order for points, and spending
//!   points through a withdrawal.
//!
//! Order *resolution* is not part of this API. It happens in the background, driven by the reconciliation engine
//! through the [`LedgerDatabase`](crate::LedgerDatabase) trait.
//!
//! ```rust,ignore
//! use loyalty_engine::{AccountApi, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/loyalty.db", 5).await?;
//! let accounts = AccountApi::new(db.clone());
//! let alice = accounts.create_account("alice").await?;
//! let orders = OrderFlowApi::new(db);
//! orders.submit_order(alice.id, "79927398713").await?;
//! ```
pub mod accounts_api;
pub mod order_flow_api;
