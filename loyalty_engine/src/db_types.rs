use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use loyalty_common::{OrderNumber, Points};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been submitted, but the accrual authority has not been consulted yet.
    New,
    /// The accrual authority is still calculating the reward.
    Processing,
    /// Terminal. The authority rejected the order and no points will be credited.
    Invalid,
    /// Terminal. The accrual (if any) has been credited to the owner's balance.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "NEW"),
            Self::Processing => write!(f, "PROCESSING"),
            Self::Invalid => write!(f, "INVALID"),
            Self::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to New");
            OrderStatusType::New
        })
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    pub accrual: Option<Points>,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub current_balance: Points,
    pub withdrawn: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       Balance         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRow, Serialize)]
pub struct Balance {
    pub current: Points,
    pub withdrawn: Points,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub order_number: OrderNumber,
    pub sum: Points,
    pub processed_at: DateTime<Utc>,
}

//--------------------------------------        Verdict        ---------------------------------------------------------
/// An authoritative decision about a single order, as produced from an accrual authority reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Still being calculated. Moves `NEW` orders to `PROCESSING`.
    Processing,
    /// Final rejection.
    Invalid,
    /// Final acceptance with the amount to credit. A zero amount marks the order as processed without a credit.
    Processed(Points),
}

impl Verdict {
    pub fn target_status(&self) -> OrderStatusType {
        match self {
            Verdict::Processing => OrderStatusType::Processing,
            Verdict::Invalid => OrderStatusType::Invalid,
            Verdict::Processed(_) => OrderStatusType::Processed,
        }
    }

    /// The states an order may be in for this verdict to change it.
    pub fn source_statuses(&self) -> &'static [OrderStatusType] {
        const FROM_NEW: &[OrderStatusType] = &[OrderStatusType::New];
        const FROM_UNRESOLVED: &[OrderStatusType] = &[OrderStatusType::New, OrderStatusType::Processing];
        match self {
            Verdict::Processing => FROM_NEW,
            Verdict::Invalid | Verdict::Processed(_) => FROM_UNRESOLVED,
        }
    }
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Processed(amount) => write!(f, "PROCESSED ({amount})"),
            v => write!(f, "{}", v.target_status()),
        }
    }
}

/// The effect of applying a [`Verdict`] to an order.
#[derive(Debug, Clone, PartialEq)]
pub enum VerdictApplied {
    /// The order became `PROCESSED` and `amount` was added to the owner's balance in the same transaction.
    Credited { order: Order, amount: Points },
    /// The order status changed, with no balance effect.
    StatusChanged(Order),
    /// The verdict did not change anything. Either the order was already in a terminal state, or it was already in
    /// the requested state.
    Unchanged(Order),
}

impl VerdictApplied {
    pub fn order(&self) -> &Order {
        match self {
            VerdictApplied::Credited { order, .. } => order,
            VerdictApplied::StatusChanged(order) => order,
            VerdictApplied::Unchanged(order) => order,
        }
    }
}
