use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

/// Returns true if `digits` is a non-empty string of ASCII digits that satisfies the Luhn checksum.
///
/// Starting from the rightmost digit, every second digit is doubled (subtracting 9 when the result exceeds 9) and the
/// sum of all digits must be divisible by 10.
pub fn luhn_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, c) in digits.bytes().rev().enumerate() {
        if !c.is_ascii_digit() {
            return false;
        }
        let mut d = u32::from(c - b'0');
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderNumberError {
    #[error("The order number is empty")]
    Empty,
    #[error("The order number may only contain digits: {0}")]
    NonDigit(String),
    #[error("The order number must be a positive number: {0}")]
    Zero(String),
    #[error("The order number {0} fails the Luhn checksum")]
    Checksum(String),
}

//--------------------------------------     OrderNumber     ---------------------------------------------------------
/// A purchase-order number. Instances can only be created via [`FromStr`], so every `OrderNumber` is known to be a
/// positive, Luhn-valid string of digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(OrderNumberError::Empty);
        }
        if !s.bytes().all(|c| c.is_ascii_digit()) {
            return Err(OrderNumberError::NonDigit(s.to_string()));
        }
        if s.bytes().all(|c| c == b'0') {
            return Err(OrderNumberError::Zero(s.to_string()));
        }
        if !luhn_valid(s) {
            return Err(OrderNumberError::Checksum(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = OrderNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
