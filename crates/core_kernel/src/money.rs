//! Money amounts with precise decimal arithmetic
//!
//! The clinic bills in a single currency (rupees), so `Money` carries only
//! the amount. rust_decimal keeps the arithmetic exact; the remote API sends
//! and receives amounts as plain JSON numbers.
//!
//! Arithmetic saturates at the bounds of `Decimal` instead of panicking, so
//! totals over absurd amounts sent by the API stay well-defined.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Symbol used when rendering amounts
pub const CURRENCY_SYMBOL: &str = "₹";

/// Decimal places used for display and rounding
pub const DECIMAL_PLACES: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// A monetary amount
///
/// Amounts are stored with 4 decimal places internally. Serialization emits a
/// JSON number; deserialization accepts numbers or numeric strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    amount: Decimal,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount: amount.round_dp(4),
        }
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self { amount: dec!(0) }
    }

    /// Creates Money from a whole number of rupees
    pub fn from_major(units: i64) -> Self {
        Self::new(Decimal::from(units))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    /// Returns the amount, or zero when it is negative
    pub fn max_zero(&self) -> Self {
        if self.is_negative() {
            Self::zero()
        } else {
            *self
        }
    }

    /// Subtracts `other`, flooring the result at zero
    pub fn saturating_sub(&self, other: Money) -> Self {
        (*self - other).max_zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:.dp$}",
            CURRENCY_SYMBOL,
            self.amount,
            dp = DECIMAL_PLACES as usize
        )
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(CURRENCY_SYMBOL).trim();
        Decimal::from_str(trimmed)
            .map(Self::new)
            .map_err(|_| MoneyError::InvalidAmount(s.to_string()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.amount.saturating_add(other.amount))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.amount.saturating_sub(other.amount))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}
