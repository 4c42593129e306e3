use accrual_client::AccrualApiError;
use loyalty_engine::SqliteDatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("Database error. {0}")]
    DatabaseError(#[from] SqliteDatabaseError),
    #[error("Could not create the accrual service client. {0}")]
    AccrualClientError(#[from] AccrualApiError),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
}
