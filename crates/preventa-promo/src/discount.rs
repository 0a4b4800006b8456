//! # Discount Calculator
//!
//! Computes what a `discount` offer takes off its matched lines.
//!
//! ## Rate Selection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tiers empty?  ── yes ──► flat percent + fixed amount on every line    │
//! │       │                                                                 │
//! │       no                                                                │
//! │       ▼                                                                 │
//! │  per line?     ── yes ──► each line: first tier containing its qty     │
//! │       │                                                                 │
//! │       no (pooled)                                                       │
//! │       ▼                                                                 │
//! │  Σ qty of matched lines → one tier → applied to each line's own gross  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Line Discount
//! ```text
//! discount = gross × percent + fixed_per_unit × quantity
//!            rounded to the cent, clamped to [0, gross]
//! ```
//!
//! ## Example
//! Tiers 12-23 → 5%, 24-47 → 7%, 48+ → 9%; one line of 30 × $10.00:
//! ```text
//! gross $300.00 → tier 24-47 → 7% → discount $21.00
//! ```

use preventa_core::{DiscountRate, Money, OrderItem};
use tracing::trace;

use crate::config::DiscountSettings;
use crate::offer::{DiscountConfig, DiscountTier};

/// The rate one offer applies to one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRate {
    pub percent: DiscountRate,
    pub fixed_per_unit: Money,
}

impl LineRate {
    pub fn is_zero(&self) -> bool {
        self.percent.is_zero() && self.fixed_per_unit.is_zero()
    }
}

/// True when the offer is evaluated line by line rather than pooled.
pub fn evaluates_per_line(config: &DiscountConfig, settings: &DiscountSettings) -> bool {
    config.per_line || (settings.tiers_force_per_line && !config.tiers.is_empty())
}

/// First tier (by ascending `from`) whose bounds contain `quantity`.
pub fn select_tier(tiers: &[DiscountTier], quantity: i64) -> Option<&DiscountTier> {
    tiers.iter().find(|tier| tier.contains(quantity))
}

fn rate_for_quantity(config: &DiscountConfig, quantity: i64) -> LineRate {
    if config.tiers.is_empty() {
        return LineRate {
            percent: config.percent,
            fixed_per_unit: config.amount,
        };
    }

    select_tier(&config.tiers, quantity)
        .map(|tier| LineRate {
            percent: tier.percent,
            fixed_per_unit: tier.amount,
        })
        .unwrap_or_default()
}

/// The rate the offer applies to each of `items`, in the same order.
pub fn line_rates(
    config: &DiscountConfig,
    items: &[OrderItem],
    settings: &DiscountSettings,
) -> Vec<LineRate> {
    if evaluates_per_line(config, settings) {
        items
            .iter()
            .map(|item| {
                let rate = rate_for_quantity(config, item.quantity);
                trace!(line = %item.id, quantity = item.quantity, bps = rate.percent.bps(), "Per-line rate");
                rate
            })
            .collect()
    } else {
        let pooled = items
            .iter()
            .fold(0i64, |acc, item| acc.saturating_add(item.quantity));
        let rate = rate_for_quantity(config, pooled);
        trace!(pooled, lines = items.len(), bps = rate.percent.bps(), "Pooled rate");
        vec![rate; items.len()]
    }
}

/// Discount of one line at one rate.
pub fn line_discount(item: &OrderItem, rate: &LineRate) -> Money {
    let gross = item.line_gross();
    let amount = gross.apply_rate(rate.percent) + rate.fixed_per_unit.multiply_quantity(item.quantity);
    amount.clamp_to(gross)
}

/// Total discount of the offer over its matched lines.
///
/// Zero means the offer is not eligible for these lines.
pub fn calculate(config: &DiscountConfig, items: &[OrderItem], settings: &DiscountSettings) -> Money {
    line_rates(config, items, settings)
        .iter()
        .zip(items)
        .map(|(rate, item)| line_discount(item, rate))
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
