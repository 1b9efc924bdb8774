//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A pawn redemption compounds this: principal × rate × periods on       │
//! │  floats drifts, and the drift lands on a customer's loan statement.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of cents. Rates are basis points.      │
//! │    Rounding happens exactly once per rate application, half-up.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use karat_core::money::Money;
//! use karat_core::types::Rate;
//!
//! let principal = Money::from_cents(100_000); // $1,000.00
//!
//! // 2.9% of the principal (one interest period)
//! let interest = principal.apply_bps(Rate::from_bps(290).bps());
//! assert_eq!(interest.cents(), 2_900);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: the settlement cart needs negative values - `buy` and
///   `pawn` lines are money leaving the drawer
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  PawnItem.price ──► ticket principal ──► interest/insurance accrual    │
/// │                                                                         │
/// │  CartLine.amount ──► signed line value ──► cart total                   │
/// │                                        └──► remaining_balance          │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use karat_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -$5.50, not -$4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
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

    /// Applies a basis-point rate and returns the resulting fraction,
    /// rounded half-up on the magnitude.
    ///
    /// ## Implementation
    /// Integer math on i128 to prevent overflow: `(cents × bps + 5000) / 10000`.
    /// The +5000 provides the half-up rounding (5000/10000 = 0.5). Negative
    /// amounts round on the magnitude so that `(-x).apply_bps(r) ==
    /// -(x.apply_bps(r))`.
    ///
    /// ## Example
    /// ```rust
    /// use karat_core::money::Money;
    ///
    /// let base = Money::from_cents(23_000); // $230.00
    /// let tax = base.apply_bps(1300);       // 13%
    /// assert_eq!(tax.cents(), 2_990);       // $29.90
    /// ```
    pub fn apply_bps(&self, bps: u32) -> Money {
        let scaled = self.0 as i128 * bps as i128;
        let rounded = if scaled >= 0 {
            (scaled + 5_000) / 10_000
        } else {
            -((-scaled + 5_000) / 10_000)
        };
        Money::from_cents(rounded as i64)
    }

    /// Adds a percentage of self on top of self (`self × (1 + rate)`).
    ///
    /// This is the single building block for every markup in the settlement
    /// pipeline: protection plan (+15%) and sales tax (+13%) both go through
    /// here, so they round identically.
    ///
    /// ## Example
    /// ```rust
    /// use karat_core::money::Money;
    /// use karat_core::types::Rate;
    ///
    /// let base = Money::from_cents(20_000);              // $200.00
    /// let with_plan = base.with_markup(Rate::from_bps(1500)); // +15%
    /// assert_eq!(with_plan.cents(), 23_000);             // $230.00
    /// ```
    pub fn with_markup(&self, rate: Rate) -> Money {
        *self + self.apply_bps(rate.bps())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use karat_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(10_000); // $100.00
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 20_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for debugging and log lines. The frontend formats for display
/// to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation - flips money-in to money-out (buy/pawn sign convention).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by integer (for quantity and period calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Multiplication by u32 (interest periods are small counts).
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, periods: u32) -> Self {
        Money(self.0 * periods as i64)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
