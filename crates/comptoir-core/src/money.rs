//! # Money Module
//!
//! Provides the `Money` type used by every aggregate in comptoir.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing euro floats:                                                   │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A month of 400 sales summed in floats drifts by a few 1e-12 €, and     │
//! │  "bénéfice réel" on a card no longer equals the one in the modal.       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    The backend sends euros (10.5), we convert ONCE on decode (1050)     │
//! │    and every sum / difference after that is exact.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ratios (margins, growth, rotation) stay `f64`: they are display values,
//! never summed back into money.
//!
//! ## Usage
//! ```rust
//! use comptoir_core::money::Money;
//!
//! let price = Money::from_cents(1099); // 10.99 €
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.cents(), 3297);
//!
//! // Backend amounts are converted once, at the boundary
//! assert_eq!(Money::from_euros(10.5).cents(), 1050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in euro cents.
///
/// ## Design Decisions
/// - **i64 (signed)**: profits and "solde net" go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as cents**: derived structures handed to the UI carry
///   integer cents, the UI formats them ("1 234 €")
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  SaleRecord.sellingPrice (euros) ──► decode ──► Money ──► normalize     │
/// │                                                            │            │
/// │  ExpenseRecord.totalCost (euros) ──► decode ──► Money      ▼            │
/// │                                          │           PeriodAggregate    │
/// │                                          └──────► AccountingSummary     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a euro amount coming from the backend into cents.
    ///
    /// Rounds to the nearest cent. Non-finite input (NaN, infinities) is
    /// treated as a missing value and yields zero.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// assert_eq!(Money::from_euros(12.346).cents(), 1235);
    /// assert_eq!(Money::from_euros(-0.5).cents(), -50);
    /// assert_eq!(Money::from_euros(f64::NAN), Money::zero());
    /// ```
    pub fn from_euros(euros: f64) -> Self {
        if !euros.is_finite() {
            return Money::zero();
        }
        Money((euros * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in euros (display and ratio math only).
    #[inline]
    pub fn to_euros(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the whole-euro portion.
    #[inline]
    pub const fn euros_part(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cents portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Scales by a floating factor, rounding to the nearest cent.
    ///
    /// Used by the forecaster (`avg × 0.25 × (1 + growth)`).
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// let monthly = Money::from_cents(1000);
    /// assert_eq!(monthly.scale(0.25).cents(), 250);
    /// assert_eq!(monthly.scale(f64::NAN), Money::zero());
    /// ```
    pub fn scale(&self, factor: f64) -> Money {
        let scaled = self.0 as f64 * factor;
        if !scaled.is_finite() {
            return Money::zero();
        }
        Money(scaled.round() as i64)
    }

    /// Divides by a count, rounding half away from zero.
    ///
    /// A zero divisor yields zero: averages over empty sets are zero.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1000).div_round(3).cents(), 333);
    /// assert_eq!(Money::from_cents(1001).div_round(2).cents(), 501);
    /// assert_eq!(Money::from_cents(-1001).div_round(2).cents(), -501);
    /// assert_eq!(Money::from_cents(1000).div_round(0), Money::zero());
    /// ```
    pub fn div_round(&self, divisor: i64) -> Money {
        if divisor == 0 {
            return Money::zero();
        }
        let num = self.0 as i128;
        let den = divisor as i128;
        let magnitude = (2 * num.abs() + den.abs()) / (2 * den.abs());
        let q = if (num < 0) != (den < 0) { -magnitude } else { magnitude };
        Money(q as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display ("12.34 €").
///
/// ## Note
/// Localized formatting ("1 234 €") is the presentation layer's job.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:02} €",
            sign,
            self.euros_part().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Serde Helpers (euro amounts on the wire)
// =============================================================================

/// Serde adapter for euro amounts sent by the backend as JSON numbers
/// (numeric strings such as `"50"` are accepted too).
///
/// ```rust,ignore
/// #[serde(with = "crate::money::euros")]
/// pub total_cost: Money,
/// ```
pub mod euros {
    use super::Money;
    use crate::numeric::Numeric;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.to_euros())
    }

    /// `null` and non-numeric values decode as zero.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = Option::<Numeric>::deserialize(deserializer)?;
        Ok(raw
            .and_then(|n| n.as_f64())
            .map(Money::from_euros)
            .unwrap_or_default())
    }
}

/// Same as [`euros`] for optional fields; absent, `null` and non-numeric
/// values stay `None`.
pub mod euros_opt {
    use super::Money;
    use crate::numeric::Numeric;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Money>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(money) => serializer.serialize_some(&money.to_euros()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Money>, D::Error> {
        let raw = Option::<Numeric>::deserialize(deserializer)?;
        Ok(raw.and_then(|n| n.as_f64()).map(Money::from_euros))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
