mod errors;
mod sqlite_impl;

pub mod orders;
pub mod user_accounts;
pub mod withdrawals;

pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
