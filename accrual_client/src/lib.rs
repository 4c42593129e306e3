//! Client for the external accrual authority.
//!
//! The authority is asked about one order at a time (`GET <base>/api/orders/<number>`) and every possible reply,
//! including transport failures, is folded into an [`AccrualOutcome`]. Callers never see a `Result` from
//! [`AccrualService::fetch_status`]: deciding what to do with a failure is the caller's job, not the client's.
mod api;
mod config;
mod data_objects;
mod error;

pub use api::{AccrualApi, AccrualService};
pub use config::AccrualConfig;
pub use data_objects::{AccrualOutcome, AccrualResponse, AccrualStatus, DEFAULT_RETRY_AFTER};
pub use error::AccrualApiError;
