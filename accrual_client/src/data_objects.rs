use std::{fmt::Display, time::Duration};

use loyalty_common::Points;
use serde::{Deserialize, Serialize};

/// Pause applied after a 429 response that carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// The order states reported by the accrual authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    /// The authority knows about the order but has not started calculating.
    Registered,
    /// The calculation is in progress.
    Processing,
    /// Final. No points will be awarded.
    Invalid,
    /// Final. The accrual amount is known.
    Processed,
}

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Registered => write!(f, "REGISTERED"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Processed => write!(f, "PROCESSED"),
        }
    }
}

/// The JSON body of a successful status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: AccrualStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Points>,
}

/// Everything a single status query can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum AccrualOutcome {
    /// The authority answered. `accrual` is only ever present for [`AccrualStatus::Processed`].
    Resolved { status: AccrualStatus, accrual: Option<Points> },
    /// 204: the authority has no record of the order.
    Unknown,
    /// 429: back off for `retry_after` before the next call.
    RateLimited { retry_after: Duration },
    /// 5xx from the authority.
    AuthorityUnavailable { status: u16 },
    /// The request never produced a usable answer.
    TransportFailure(String),
}

impl Display for AccrualOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolved { status, accrual: Some(a) } => write!(f, "{status} ({a} points)"),
            Self::Resolved { status, accrual: None } => write!(f, "{status}"),
            Self::Unknown => write!(f, "unknown order"),
            Self::RateLimited { retry_after } => write!(f, "rate limited for {}s", retry_after.as_secs()),
            Self::AuthorityUnavailable { status } => write!(f, "authority unavailable (HTTP {status})"),
            Self::TransportFailure(reason) => write!(f, "transport failure: {reason}"),
        }
    }
}
