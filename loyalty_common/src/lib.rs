//! Value types shared by every crate in the loyalty ledger workspace.
//!
//! * [`Points`] is the fixed-point amount used for accruals, balances and withdrawals.
//! * [`OrderNumber`] is a purchase-order number that is guaranteed to pass the Luhn checksum.
mod order_number;
mod points;

pub use order_number::{luhn_valid, OrderNumber, OrderNumberError};
pub use points::{Points, PointsConversionError, POINTS_SCALE};
