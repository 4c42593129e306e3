use loyalty_common::Points;
use sqlx::SqliteConnection;

use crate::db_types::{Balance, UserAccount};

const ACCOUNT_COLUMNS: &str = "id, login, current_balance, withdrawn, created_at, updated_at";

pub async fn insert_account(login: &str, conn: &mut SqliteConnection) -> Result<UserAccount, sqlx::Error> {
    let sql = format!("INSERT INTO user_accounts (login) VALUES ($1) RETURNING {ACCOUNT_COLUMNS}");
    sqlx::query_as::<_, UserAccount>(&sql).bind(login).fetch_one(conn).await
}

pub async fn fetch_account(id: i64, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE id = $1");
    sqlx::query_as::<_, UserAccount>(&sql).bind(id).fetch_optional(conn).await
}

pub async fn fetch_account_by_login(
    login: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<UserAccount>, sqlx::Error> {
    let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE login = $1");
    sqlx::query_as::<_, UserAccount>(&sql).bind(login).fetch_optional(conn).await
}

pub async fn fetch_balance(id: i64, conn: &mut SqliteConnection) -> Result<Option<Balance>, sqlx::Error> {
    sqlx::query_as::<_, Balance>("SELECT current_balance AS current, withdrawn FROM user_accounts WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Adds `amount` to the current balance in a single statement. Returns `None` if the account does not exist.
pub async fn credit(id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let sql = format!(
        "UPDATE user_accounts SET current_balance = current_balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = \
         $2 RETURNING {ACCOUNT_COLUMNS}"
    );
    sqlx::query_as::<_, UserAccount>(&sql).bind(amount).bind(id).fetch_optional(conn).await
}

/// Moves `amount` from the current balance to the withdrawn total.
///
/// Returns `None` without touching the row if the account does not exist or holds less than `amount`.
pub async fn debit(id: i64, amount: Points, conn: &mut SqliteConnection) -> Result<Option<UserAccount>, sqlx::Error> {
    let sql = format!(
        "UPDATE user_accounts SET current_balance = current_balance - $1, withdrawn = withdrawn + $1, updated_at = \
         CURRENT_TIMESTAMP WHERE id = $2 AND current_balance >= $1 RETURNING {ACCOUNT_COLUMNS}"
    );
    sqlx::query_as::<_, UserAccount>(&sql).bind(amount).bind(id).fetch_optional(conn).await
}
