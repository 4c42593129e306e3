use std::{fmt::Debug, str::FromStr, time::Duration};

use async_trait::async_trait;
use log::*;
use loyalty_common::{OrderNumber, Points};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

use super::{is_unique_violation, orders, user_accounts, withdrawals, SqliteDatabaseError};
use crate::{
    db::traits::{AccountApiError, AccountManagement, InsertOrderResult, LedgerDatabase, LedgerError},
    db_types::{Balance, Order, OrderStatusType, UserAccount, Verdict, VerdictApplied, Withdrawal},
};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Opens (creating it if necessary) the database at `url` in WAL mode with foreign keys enforced.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
        debug!("🗃️ Connected to {url} with up to {max_connections} connections");
        Ok(Self { url: url.to_string(), pool })
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("🗃️ Database connections to {} closed", self.url);
    }
}

#[async_trait]
impl LedgerDatabase for SqliteDatabase {
    async fn fetch_unresolved_orders(&self) -> Result<Vec<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let orders =
            orders::fetch_orders_with_status(&[OrderStatusType::New, OrderStatusType::Processing], &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(number, &mut conn).await?)
    }

    async fn apply_verdict(&self, number: &OrderNumber, verdict: Verdict) -> Result<VerdictApplied, LedgerError> {
        let accrual = match verdict {
            Verdict::Processed(amount) => Some(amount),
            _ => None,
        };
        // The first statement in the transaction is a write, so SQLite takes the write lock up front.
        let mut tx = self.pool.begin().await?;
        let updated =
            orders::transition_status(number, verdict.target_status(), accrual, verdict.source_statuses(), &mut tx)
                .await?;
        let result = match (updated, verdict) {
            (None, _) => {
                let order = orders::fetch_order(number, &mut tx)
                    .await?
                    .ok_or_else(|| LedgerError::OrderNotFound(number.clone()))?;
                trace!("🗃️ Verdict {verdict} leaves order {number} unchanged ({})", order.status);
                VerdictApplied::Unchanged(order)
            },
            (Some(order), Verdict::Processed(amount)) if amount.is_positive() => {
                let account = user_accounts::credit(order.user_id, amount, &mut tx)
                    .await?
                    .ok_or(LedgerError::AccountNotFound(order.user_id))?;
                debug!(
                    "🗃️ Order {number} processed. {amount} credited to account #{}. New balance: {}",
                    account.id, account.current_balance
                );
                VerdictApplied::Credited { order, amount }
            },
            (Some(order), _) => {
                debug!("🗃️ Order {number} is now {}", order.status);
                VerdictApplied::StatusChanged(order)
            },
        };
        tx.commit().await?;
        Ok(result)
    }
}

#[async_trait]
impl AccountManagement for SqliteDatabase {
    async fn create_account(&self, login: &str) -> Result<UserAccount, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::insert_account(login, &mut conn).await.map_err(|e| {
            if is_unique_violation(&e) {
                AccountApiError::AccountAlreadyExists(login.to_string())
            } else {
                e.into()
            }
        })
    }

    async fn fetch_account(&self, account_id: i64) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(user_accounts::fetch_account(account_id, &mut conn).await?)
    }

    async fn fetch_account_by_login(&self, login: &str) -> Result<Option<UserAccount>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(user_accounts::fetch_account_by_login(login, &mut conn).await?)
    }

    async fn fetch_orders_for_account(&self, account_id: i64) -> Result<Vec<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_user(account_id, &mut conn).await?)
    }

    async fn fetch_balance(&self, account_id: i64) -> Result<Balance, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        user_accounts::fetch_balance(account_id, &mut conn).await?.ok_or(AccountApiError::AccountNotFound(account_id))
    }

    async fn fetch_withdrawals_for_account(&self, account_id: i64) -> Result<Vec<Withdrawal>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(withdrawals::fetch_withdrawals_for_user(account_id, &mut conn).await?)
    }

    async fn insert_order(&self, account_id: i64, number: &OrderNumber) -> Result<InsertOrderResult, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let result = match orders::insert_order(account_id, number, &mut tx).await {
            Ok(Some(order)) => InsertOrderResult::Inserted(order),
            Ok(None) => {
                let existing = orders::fetch_order(number, &mut tx).await?.ok_or_else(|| {
                    AccountApiError::DatabaseError(format!("Order {number} vanished during insert"))
                })?;
                if existing.user_id != account_id {
                    return Err(AccountApiError::OrderBelongsToAnotherAccount(number.clone()));
                }
                InsertOrderResult::AlreadyExists(existing)
            },
            // Foreign key failure: the account does not exist
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => {
                return Err(AccountApiError::AccountNotFound(account_id));
            },
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        if let InsertOrderResult::Inserted(order) = &result {
            debug!("🗃️ Order {} saved for account #{account_id}", order.number);
        }
        Ok(result)
    }

    async fn withdraw(
        &self,
        account_id: i64,
        number: &OrderNumber,
        sum: Points,
    ) -> Result<Withdrawal, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        if user_accounts::debit(account_id, sum, &mut tx).await?.is_none() {
            let account = user_accounts::fetch_account(account_id, &mut tx)
                .await?
                .ok_or(AccountApiError::AccountNotFound(account_id))?;
            return Err(AccountApiError::InsufficientFunds { requested: sum, available: account.current_balance });
        }
        let withdrawal = withdrawals::insert_withdrawal(account_id, number, sum, &mut tx).await.map_err(|e| {
            if is_unique_violation(&e) {
                AccountApiError::DuplicateWithdrawal(number.clone())
            } else {
                e.into()
            }
        })?;
        tx.commit().await?;
        debug!("🗃️ Account #{account_id} withdrew {sum} against order {number}");
        Ok(withdrawal)
    }
}
