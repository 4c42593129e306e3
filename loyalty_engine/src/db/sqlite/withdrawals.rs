use loyalty_common::{OrderNumber, Points};
use sqlx::SqliteConnection;

use crate::db_types::Withdrawal;

const WITHDRAWAL_COLUMNS: &str = "id, user_id, order_number, sum, processed_at";

pub async fn insert_withdrawal(
    user_id: i64,
    number: &OrderNumber,
    sum: Points,
    conn: &mut SqliteConnection,
) -> Result<Withdrawal, sqlx::Error> {
    let sql = format!(
        "INSERT INTO withdrawals (user_id, order_number, sum) VALUES ($1, $2, $3) RETURNING {WITHDRAWAL_COLUMNS}"
    );
    sqlx::query_as::<_, Withdrawal>(&sql).bind(user_id).bind(number.as_str()).bind(sum).fetch_one(conn).await
}

pub async fn fetch_withdrawals_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Withdrawal>, sqlx::Error> {
    let sql =
        format!("SELECT {WITHDRAWAL_COLUMNS} FROM withdrawals WHERE user_id = $1 ORDER BY processed_at DESC, id DESC");
    sqlx::query_as::<_, Withdrawal>(&sql).bind(user_id).fetch_all(conn).await
}
