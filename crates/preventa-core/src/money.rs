//! # Money
//!
//! Amounts in integer cents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Promotions are re-run on every cart edit, so the same line is         │
//! │  discounted many times per order. Float math drifts:                   │
//! │    300.00 × 0.07 = 21.000000000000004                                   │
//! │  and the drift surfaces as a one-cent gap between screen and invoice.  │
//! │                                                                         │
//! │  In cents and basis points:                                            │
//! │    30000 × 700 / 10000 = 2100                                           │
//! │  Rounding happens once per line, half up, inside apply_rate().         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use preventa_core::money::Money;
//!
//! let case_price = Money::from_cents(4550);
//! assert_eq!(case_price.multiply_quantity(4).cents(), 18200);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::DiscountRate;

/// An amount of money in cents.
///
/// Signed so intermediate differences can be represented; line nets are
/// clamped at zero by [`Money::clamp_to`]. Arithmetic saturates instead of
/// overflowing. Serialized as a bare integer,
/// which is what the host stores.
///
/// ```text
/// Product.price ─► OrderItem.unit_price ─► gross ─┬─► discount ─► net
///                         tier percent × gross ───┤
///                         fixed amount × quantity ┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount from an offer record, rounding to the cent.
    ///
    /// `None` for NaN or infinite input.
    ///
    /// ```rust
    /// use preventa_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(1.5).map(|m| m.cents()), Some(150));
    /// assert_eq!(Money::from_decimal(0.125).map(|m| m.cents()), Some(13));
    /// assert_eq!(Money::from_decimal(f64::NAN), None);
    /// ```
    pub fn from_decimal(amount: f64) -> Option<Self> {
        if !amount.is_finite() {
            return None;
        }
        // Snap representation noise first so 2.345 rounds to 235, not 234
        let scaled = (amount * 100.0 * 1_000_000.0).round() / 1_000_000.0;
        Some(Money(scaled.round() as i64))
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Limits `self` to `[0, ceiling]`.
    ///
    /// ```rust
    /// use preventa_core::money::Money;
    ///
    /// let gross = Money::from_cents(1000);
    /// assert_eq!(Money::from_cents(1500).clamp_to(gross), gross);
    /// assert_eq!(Money::from_cents(-20).clamp_to(gross), Money::zero());
    /// ```
    pub fn clamp_to(self, ceiling: Money) -> Money {
        self.min(ceiling).max(Money::zero())
    }

    /// `self × rate`, rounded half up to the cent.
    ///
    /// Computed as `(cents × bps + 5000) / 10000` in 128-bit integers and
    /// saturated back into `i64`.
    ///
    /// ## User Workflow
    /// ```text
    /// Line: 30 × $10.00 = $300.00
    ///      │
    ///      ▼
    /// Tier 24-47 → 7%
    ///      │
    ///      ▼
    /// apply_rate(7%) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line discount: $21.00
    /// ```
    pub fn apply_rate(&self, rate: DiscountRate) -> Money {
        let cents = (i128::from(self.0) * i128::from(rate.bps()) + 5000) / 10000;
        Money(cents.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
    }

    /// Unit amount times a quantity, saturating at the `i64` bounds.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

/// `$1234.50`-style text for logs. The host formats amounts for display
/// itself.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_decimal_rounds_to_the_cent() {
        assert_eq!(Money::from_decimal(10.0), Some(Money::from_cents(1000)));
        assert_eq!(Money::from_decimal(2.345), Some(Money::from_cents(235)));
        assert_eq!(Money::from_decimal(-1.5), Some(Money::from_cents(-150)));
        assert_eq!(Money::from_decimal(f64::INFINITY), None);
    }

    #[test]
    fn test_display_for_logs() {
        assert_eq!(Money::from_cents(2100).to_string(), "$21.00");
        assert_eq!(Money::from_cents(7).to_string(), "$0.07");
        assert_eq!(Money::from_cents(-1250).to_string(), "-$12.50");
    }

    #[test]
    fn test_line_sums() {
        let nets = [Money::from_cents(9000), Money::from_cents(4650)];
        let total: Money = nets.iter().sum();
        assert_eq!(total.cents(), 13650);

        let mut discount = Money::zero();
        discount += Money::from_cents(350);
        assert_eq!((total - discount).cents(), 13300);
    }

    #[test]
    fn test_volume_tier_rate() {
        let gross = Money::from_cents(1000).multiply_quantity(30);
        assert_eq!(gross.apply_rate(DiscountRate::from_bps(700)).cents(), 2100);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // $4.50 at 2.5% = $0.1125 → $0.11; $3.30 at 2.5% = $0.0825 → $0.08
        assert_eq!(Money::from_cents(450).apply_rate(DiscountRate::from_bps(250)).cents(), 11);
        assert_eq!(Money::from_cents(330).apply_rate(DiscountRate::from_bps(250)).cents(), 8);
        // $0.30 at 5% = $0.015 → $0.02
        assert_eq!(Money::from_cents(30).apply_rate(DiscountRate::from_bps(500)).cents(), 2);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(10).cents(), i64::MAX);
        assert_eq!(huge.multiply_quantity(-10).cents(), i64::MIN);
        assert_eq!((huge + huge + huge).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN) - huge).cents(), i64::MIN);

        let total: Money = [huge, huge, Money::from_cents(100)].iter().sum();
        assert_eq!(total.cents(), i64::MAX);

        let maxed = Money::from_cents(i64::MAX).apply_rate(DiscountRate::from_bps(20_000));
        assert_eq!(maxed.cents(), i64::MAX);
    }

    #[test]
    fn test_clamp_to_line_gross() {
        let gross = Money::from_cents(1000);
        assert_eq!(Money::from_cents(400).clamp_to(gross).cents(), 400);
        assert_eq!(Money::from_cents(4000).clamp_to(gross).cents(), 1000);
        assert_eq!(Money::from_cents(-1).clamp_to(gross).cents(), 0);
    }
}
