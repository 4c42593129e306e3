use async_trait::async_trait;
use loyalty_common::{OrderNumber, OrderNumberError, Points};
use thiserror::Error;

use crate::{
    db::traits::InsertOrderResult,
    db_types::{Balance, Order, UserAccount, Withdrawal},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Account #{0} does not exist")]
    AccountNotFound(i64),
    #[error("The login '{0}' is already taken")]
    AccountAlreadyExists(String),
    #[error("Order {0} was already submitted by another account")]
    OrderBelongsToAnotherAccount(OrderNumber),
    #[error("Insufficient funds. Requested {requested}, but only {available} is available")]
    InsufficientFunds { requested: Points, available: Points },
    #[error("Order {0} has already been used for a withdrawal")]
    DuplicateWithdrawal(OrderNumber),
    #[error("Invalid order number. {0}")]
    InvalidOrderNumber(#[from] OrderNumberError),
    #[error("Withdrawal amounts must be positive, not {0}")]
    InvalidAmount(Points),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Account, order submission and withdrawal persistence.
#[async_trait]
pub trait AccountManagement: Send + Sync {
    async fn create_account(&self, login: &str) -> Result<UserAccount, AccountApiError>;

    async fn fetch_account(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError>;

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError>;

    /// All orders submitted by the account, most recent first.
    async fn fetch_orders_for_account(&self, account_id: i64) -> Result<Vec<Order>, AccountApiError>;

    async fn fetch_balance(&self, account_id: i64) -> Result<Balance, AccountApiError>;

    /// All withdrawals made by the account, most recent first.
    async fn fetch_withdrawals_for_account(&self, account_id: i64) -> Result<Vec<Withdrawal>, AccountApiError>;

    /// Stores a new order with status `NEW`. Submitting the same number again from the same account is not an error.
    async fn insert_order(&self, account_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, AccountApiError>;

    /// Debits `sum` from the account and records the withdrawal, atomically.
    async fn withdraw(&self, account_id: i64, number: &OrderNumber, sum: Points) -> Result<Withdrawal, AccountApiError>;
}
