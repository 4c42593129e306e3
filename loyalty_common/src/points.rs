use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

/// Number of stored units per whole point. Amounts are kept in hundredths.
pub const POINTS_SCALE: i64 = 100;

macro_rules! points_ops {
    ($($op:ident $op_fn:ident $assign:ident $assign_fn:ident),*) => {
        $(
            impl $op for Points {
                type Output = Self;

                fn $op_fn(self, rhs: Self) -> Self::Output {
                    Self(self.0.$op_fn(rhs.0))
                }
            }

            impl $assign for Points {
                fn $assign_fn(&mut self, rhs: Self) {
                    self.0.$assign_fn(rhs.0)
                }
            }
        )*
    };
}

//--------------------------------------       Points        ---------------------------------------------------------
/// A loyalty point amount, stored exactly as an integer number of hundredths.
///
/// On the wire (JSON) points are plain decimal numbers, e.g. `500` or `729.98`.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash)]
#[sqlx(transparent)]
pub struct Points(i64);

points_ops!(Add add AddAssign add_assign, Sub sub SubAssign sub_assign);

impl Neg for Points {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Value cannot be represented as points: {0}")]
pub struct PointsConversionError(String);

impl Points {
    pub fn zero() -> Self {
        Self(0)
    }

    /// Creates an amount from a raw count of hundredths.
    pub fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    pub fn from_points(points: i64) -> Self {
        Self(points * POINTS_SCALE)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / POINTS_SCALE as f64
    }
}

impl TryFrom<f64> for Points {
    type Error = PointsConversionError;

    /// Rounds to the nearest hundredth.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let scaled = (value * POINTS_SCALE as f64).round();
        if scaled > i64::MAX as f64 || scaled < i64::MIN as f64 {
            return Err(PointsConversionError(format!("{value} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = POINTS_SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from(value).map_err(D::Error::custom)
    }
}
