//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Discount stacking needs sub-cent intermediates:                        │
//! │    $19.99 × 5% = $0.9995  → must NOT be rounded before tax             │
//! │                                                                         │
//! │  OUR SOLUTION: Exact decimals, rounded only for display                 │
//! │    0.1 + 0.2 = 0.3 exactly                                              │
//! │    $0.9995 stays $0.9995 until the receipt prints "$1.00"              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(1099);   // $10.99
//! let doubled = price * 2u32;            // $21.98
//! let total = price + Money::from_cents(500);
//! assert_eq!(total.to_string(), "$15.99");
//! ```

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::types::TaxRate;

/// Number of decimal places used when an amount is shown or settled.
pub const CURRENCY_PRECISION: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// An exact monetary amount in major currency units (dollars for USD).
///
/// ## Design Decisions
/// - **Decimal, not f64**: prices like $19.99 are represented exactly
/// - **Signed**: change-due and remaining-balance math can go negative
/// - **No implicit rounding**: arithmetic keeps every digit; call
///   [`Money::round_to_cents`] at the display or settlement boundary
/// - **JSON number on the wire**: stored blobs and catalog exports use plain
///   numbers (`4.5`), matching what spreadsheets and other tools expect
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartItem.line_total ──► subtotal
///                                              │
///                 bulk discount ◄──────────────┤
///                 coupon discount ◄────────────┘
///                                              │
///                 final_total × (1 + tax) ──► grand_total ──► Payments
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.to_cents(), 1099);
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, CURRENCY_PRECISION))
    }

    /// Creates a Money value from a whole number of major units.
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Converts a float into Money, keeping the shortest decimal that
    /// round-trips (so `4.5` becomes exactly `4.5`).
    ///
    /// Returns `None` for NaN and infinities.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Decimal::from_str(&value.to_string())
            .ok()
            .or_else(|| Decimal::from_f64(value))
            .map(Money)
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative amounts to zero.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let owed = Money::from_cents(500) - Money::from_cents(800);
    /// assert_eq!(owed.non_negative(), Money::zero());
    /// ```
    #[inline]
    pub fn non_negative(self) -> Self {
        self.max(Money::zero())
    }

    /// Rounds to whole cents, half away from zero (`0.005` → `0.01`).
    ///
    /// This is the only rounding in the system. It is applied when an
    /// amount is displayed or when deciding whether a balance is settled,
    /// never between pricing steps.
    pub fn round_to_cents(&self) -> Self {
        Money(
            self.0
                .round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns the amount in whole cents, rounded like [`Money::round_to_cents`].
    pub fn to_cents(&self) -> i64 {
        (self.round_to_cents().0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or_default()
    }

    /// Returns the amount as a float, for interchange with tools that want one.
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Calculates tax on this amount.
    ///
    /// ## No Rounding
    /// Unlike a till that rounds tax per line, the tax here stays exact:
    /// `$9.0955 × 10% = $0.90955`. The receipt rounds the grand total once.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::TaxRate;
    ///
    /// let amount = Money::from_cents(1000); // $10.00
    /// let tax = amount.calculate_tax(TaxRate::from_bps(825)); // 8.25%
    /// assert_eq!(tax.to_string(), "$0.83"); // displayed rounded
    /// assert_eq!(tax.amount().normalize().to_string(), "0.825");
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.as_fraction())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299); // $2.99
    /// assert_eq!(unit_price.multiply_quantity(3).to_cents(), 897);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `percent`% of this amount (e.g. `percent = 10` → a tenth).
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use till_core::money::Money;
    ///
    /// let subtotal = Money::from_major(100);
    /// assert_eq!(subtotal.percentage(Decimal::from(10)), Money::from_major(10));
    /// ```
    pub fn percentage(&self, percent: Decimal) -> Money {
        Money(self.0 * percent / Decimal::ONE_HUNDRED)
    }

    /// Formats with a currency symbol, rounded to cents (`"€4.50"`).
    pub fn format_with(&self, symbol: &str) -> String {
        let cents = self.to_cents();
        let sign = if cents < 0 { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            symbol,
            (cents / 100).abs(),
            (cents % 100).abs()
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows dollars rounded to cents.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_with("$"))
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    /// Parses `"4.50"`, `"-3"` or scientific notation like `"1e2"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Decimal::from_str(s)
            .or_else(|_| Decimal::from_scientific(s))
            .map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Money)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
