use log::trace;
use loyalty_common::{OrderNumber, Points};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{Order, OrderStatusType};

const ORDER_COLUMNS: &str = "number, user_id, status, accrual, uploaded_at, updated_at";

pub async fn fetch_order(number: &OrderNumber, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1");
    sqlx::query_as::<_, Order>(&sql).bind(number.as_str()).fetch_optional(conn).await
}

/// Fetches all orders with one of the given statuses, oldest first.
pub async fn fetch_orders_with_status(
    statuses: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if statuses.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE status IN ("));
    let mut list = builder.separated(", ");
    for status in statuses {
        list.push_bind(*status);
    }
    list.push_unseparated(") ORDER BY uploaded_at ASC, rowid ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_all(conn).await
}

/// All orders for the user, most recent first.
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY uploaded_at DESC, rowid DESC");
    sqlx::query_as::<_, Order>(&sql).bind(user_id).fetch_all(conn).await
}

/// Inserts a new order. If the number already exists, nothing is written and `None` is returned.
pub async fn insert_order(
    user_id: i64,
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let sql = format!(
        "INSERT INTO orders (number, user_id, status) VALUES ($1, $2, 'NEW') ON CONFLICT (number) DO NOTHING RETURNING \
         {ORDER_COLUMNS}"
    );
    sqlx::query_as::<_, Order>(&sql).bind(number.as_str()).bind(user_id).fetch_optional(conn).await
}

/// Moves the order to `status`, but only if its current status is one of `from`. When `accrual` is given it is stored
/// alongside the new status.
///
/// Returns the updated order, or `None` if no row matched (unknown order, or an order not in any of the `from` states).
pub async fn transition_status(
    number: &OrderNumber,
    status: OrderStatusType,
    accrual: Option<Points>,
    from: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
    builder.push_bind(status);
    if let Some(accrual) = accrual {
        builder.push(", accrual = ").push_bind(accrual);
    }
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE number = ").push_bind(number.as_str().to_string());
    builder.push(" AND status IN (");
    let mut list = builder.separated(", ");
    for s in from {
        list.push_bind(*s);
    }
    list.push_unseparated(")");
    builder.push(format!(" RETURNING {ORDER_COLUMNS}"));
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_optional(conn).await
}
