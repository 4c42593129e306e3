//! Read access to user accounts.

use std::fmt::Debug;

use log::trace;

use crate::{
    db::traits::{AccountApiError, AccountManagement},
    db_types::{Balance, Order, UserAccount, Withdrawal},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Creates a new account with zero balances. Logins are unique.
    pub async fn create_account(&self, login: &str) -> Result<UserAccount, AccountApiError> {
        let account = self.db.create_account(login).await?;
        trace!("👤️ Created account #{} for {login}", account.id);
        Ok(account)
    }

    pub async fn account_by_id(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account(account_id).await
    }

    pub async fn account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        self.db.fetch_account_by_login(login).await
    }

    /// The account's orders, newest first.
    pub async fn orders_for_account(&self, account_id: i64) -> Result<Vec<Order>, AccountApiError> {
        self.db.fetch_orders_for_account(account_id).await
    }

    pub async fn balance(&self, account_id: i64) -> Result<Balance, AccountApiError> {
        self.db.fetch_balance(account_id).await
    }

    pub async fn withdrawals_for_account(&self, account_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        self.db.fetch_withdrawals_for_account(account_id).await
    }
}
