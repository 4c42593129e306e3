use async_trait::async_trait;
use loyalty_common::OrderNumber;
use thiserror::Error;

use crate::db_types::{Order, Verdict, VerdictApplied};

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Account #{0} does not exist")]
    AccountNotFound(i64),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}

/// The storage operations the reconciliation engine depends on.
#[async_trait]
pub trait LedgerDatabase: Send + Sync {
    /// Returns every order that is still `NEW` or `PROCESSING`. Terminal orders are never returned.
    async fn fetch_unresolved_orders(&self) -> Result<Vec<Order>, LedgerError>;

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError>;

    /// Applies an authoritative verdict to a single order in one transaction.
    ///
    /// * Terminal orders are never modified; the call returns [`VerdictApplied::Unchanged`].
    /// * [`Verdict::Processed`] with a positive amount moves the order to `PROCESSED` and credits the owner's balance.
    ///   Both changes commit together or not at all, so applying the same verdict twice credits exactly once.
    /// * [`Verdict::Processing`] only moves `NEW` orders.
    async fn apply_verdict(&self, number: &OrderNumber, verdict: Verdict) -> Result<VerdictApplied, LedgerError>;
}
