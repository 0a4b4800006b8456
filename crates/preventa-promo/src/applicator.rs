//! # Sequential Applicator
//!
//! Applies the seller's chosen offers to the cart.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  toggle on / cart edit / customer change  ┌────────────┐ │
//! │   │  CLEAN  │ ─────────────────────────────────────────►│ DISCOUNTED │ │
//! │   │ (gross) │ ◄───────────────────────────────────────── │            │ │
//! │   └─────────┘        strip_to_gross (always first)       └────────────┘ │
//! │                                                                         │
//! │  Every transition starts from gross. Nets are never derived from a     │
//! │  previous net, so toggling an offer off and on again, or recomputing   │
//! │  the same applied set twice, lands on identical amounts.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recompute (single additive pass)
//! ```text
//! for each line:
//!   percent  = Σ percent of every applied discount offer matching it  (≤ 100%)
//!   fixed    = Σ fixed-per-unit of those offers
//!   discount = gross × percent + fixed × quantity                    (≤ gross)
//!   net      = gross − discount
//! ```
//!
//! ## User Workflow
//! ```text
//! Seller taps offer B in the picker
//!      │
//!      ▼
//! toggle(applied, "B") ← THIS MODULE
//!      │
//!      ├── B already applied       → Removed
//!      ├── B not eligible now      → NotApplicable
//!      ├── B beats every conflict  → Added (conflicts replaced)
//!      └── some conflict beats B   → Rejected (nothing changes)
//!      │
//!      ▼
//! recompute() → PricedCart shown on the order screen
//! ```

use std::collections::HashMap;

use preventa_core::{DiscountRate, Money, Order, OrderItem, OrderTotals};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::discount;
use crate::matcher::{evaluate_offer, find_applicable_offers, ApplicableOffer, OfferContext};
use crate::offer::OfferTerms;
use crate::stacking::beats;

// =============================================================================
// Output Types
// =============================================================================

/// A free-goods line produced by an applied bonus offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BonusLine {
    pub offer_id: String,
    /// Product handed out; `None` until the seller picks one.
    pub product_id: Option<String>,
    pub quantity: i64,
    pub source_item_ids: Vec<String>,
    pub requires_selection: bool,
}

/// The cart after applying offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub items: Vec<OrderItem>,
    pub bonus_lines: Vec<BonusLine>,
    /// Applied offers that currently have an effect.
    pub applied_offer_ids: Vec<String>,
    pub totals: OrderTotals,
}

impl PricedCart {
    /// The cart at gross, with no offers applied.
    pub fn plain(items: &[OrderItem]) -> Self {
        let items = strip_to_gross(items);
        PricedCart {
            totals: OrderTotals::from(items.as_slice()),
            items,
            ..Default::default()
        }
    }
}

/// What a toggle did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Offer applied; `replaced` lists the conflicting offers it displaced.
    Added { offer_id: String, replaced: Vec<String> },
    /// Offer was applied and has been taken off.
    Removed { offer_id: String },
    /// A conflicting applied offer ranks higher; nothing changed.
    Rejected { offer_id: String, blocked_by: Vec<String> },
    /// The order does not qualify for the offer right now.
    NotApplicable { offer_id: String },
}

/// Result of [`toggle`]: the new applied set and the cart it prices to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub applied: Vec<String>,
    pub outcome: ToggleOutcome,
    pub cart: PricedCart,
}

// =============================================================================
// Operations
// =============================================================================

/// Returns every line back at gross: `gross = quantity × unit_price`,
/// no discount, `net = gross`.
pub fn strip_to_gross(items: &[OrderItem]) -> Vec<OrderItem> {
    items.iter().map(OrderItem::stripped).collect()
}

fn clean_copy(order: &Order, items: &[OrderItem]) -> Order {
    Order {
        company_code: order.company_code.clone(),
        seller_code: order.seller_code.clone(),
        items: strip_to_gross(items),
    }
}

/// Toggles `candidate_id` on or off.
///
/// Conflicts are applied offers that share a product with the candidate
/// where either side is non-stackable. The candidate goes in only if it
/// [`beats`] every one of them; those conflicts are then taken off.
pub fn toggle(
    applied: &[String],
    candidate_id: &str,
    order: &Order,
    ctx: &OfferContext<'_>,
) -> ToggleResult {
    let clean = clean_copy(order, &order.items);

    let (next, outcome) = if applied.iter().any(|id| id == candidate_id) {
        let next: Vec<String> = applied.iter().filter(|id| *id != candidate_id).cloned().collect();
        (
            next,
            ToggleOutcome::Removed {
                offer_id: candidate_id.to_string(),
            },
        )
    } else {
        match ctx
            .offer(candidate_id)
            .and_then(|offer| evaluate_offer(offer, &clean, ctx))
        {
            None => (
                applied.to_vec(),
                ToggleOutcome::NotApplicable {
                    offer_id: candidate_id.to_string(),
                },
            ),
            Some(candidate) => add_candidate(applied, &candidate, &clean, ctx),
        }
    };

    debug!(offer_id = candidate_id, outcome = ?outcome, "Offer toggled");
    let cart = recompute(&order.items, &next, order, ctx);
    ToggleResult {
        applied: next,
        outcome,
        cart,
    }
}

fn add_candidate(
    applied: &[String],
    candidate: &ApplicableOffer,
    clean: &Order,
    ctx: &OfferContext<'_>,
) -> (Vec<String>, ToggleOutcome) {
    let candidate_position = ctx.position(candidate.id());

    let conflicts: Vec<ApplicableOffer> = applied
        .iter()
        .filter_map(|id| ctx.offer(id))
        .filter_map(|offer| evaluate_offer(offer, clean, ctx))
        .filter(|current| candidate.conflicts_with(current))
        .collect();

    let blocked_by: Vec<String> = conflicts
        .iter()
        .filter(|current| {
            let listed_first = candidate_position < ctx.position(current.id());
            !beats(candidate, current, listed_first)
        })
        .map(|current| current.id().to_string())
        .collect();

    if !blocked_by.is_empty() {
        return (
            applied.to_vec(),
            ToggleOutcome::Rejected {
                offer_id: candidate.id().to_string(),
                blocked_by,
            },
        );
    }

    let replaced: Vec<String> = conflicts.iter().map(|c| c.id().to_string()).collect();
    let mut next: Vec<String> = applied
        .iter()
        .filter(|id| !replaced.contains(id))
        .cloned()
        .collect();
    next.push(candidate.id().to_string());

    (
        next,
        ToggleOutcome::Added {
            offer_id: candidate.id().to_string(),
            replaced,
        },
    )
}

/// Prices `items` with the `applied` offers, from gross, in one additive
/// pass. Applied offers that no longer qualify stay in `applied` but have no
/// effect until they qualify again.
pub fn recompute(
    items: &[OrderItem],
    applied: &[String],
    order: &Order,
    ctx: &OfferContext<'_>,
) -> PricedCart {
    let clean = clean_copy(order, items);
    let mut rates: HashMap<&str, (DiscountRate, Money)> = HashMap::new();
    let mut bonus_lines = Vec::new();
    let mut effective = Vec::new();

    let evaluated: Vec<ApplicableOffer> = applied
        .iter()
        .filter_map(|id| match ctx.offer(id) {
            Some(offer) => evaluate_offer(offer, &clean, ctx),
            None => {
                debug!(offer_id = %id, "Applied offer no longer in catalog");
                None
            }
        })
        .collect();

    for offer in &evaluated {
        match &offer.offer.terms {
            OfferTerms::Discount(config) => {
                let line_rates = discount::line_rates(config, &offer.applicable_items, &ctx.config.discount);
                for (item, rate) in offer.applicable_items.iter().zip(line_rates) {
                    let entry = rates
                        .entry(item.id.as_str())
                        .or_insert((DiscountRate::zero(), Money::zero()));
                    entry.0 = entry.0.saturating_add(rate.percent);
                    entry.1 += rate.fixed_per_unit;
                }
            }
            OfferTerms::Bonus(_) => {
                for application in offer.bonus_applications.iter().flatten() {
                    bonus_lines.push(BonusLine {
                        offer_id: offer.id().to_string(),
                        product_id: application.target_product_id.clone(),
                        quantity: application.bonus_qty,
                        source_item_ids: application.source_item_ids.clone(),
                        requires_selection: application.requires_selection,
                    });
                }
            }
            OfferTerms::Combo | OfferTerms::Kit | OfferTerms::PriceList => continue,
        }
        effective.push(offer.id().to_string());
    }

    let items: Vec<OrderItem> = clean
        .items
        .iter()
        .map(|item| match rates.get(item.id.as_str()) {
            Some((percent, fixed)) => {
                let discount = item.gross.apply_rate(*percent) + fixed.multiply_quantity(item.quantity);
                item.with_discount(discount)
            }
            None => item.clone(),
        })
        .collect();

    PricedCart {
        totals: OrderTotals::from(items.as_slice()),
        items,
        bonus_lines,
        applied_offer_ids: effective,
    }
}

/// After a customer change: keeps only the applied offers the new customer
/// is still eligible for.
pub fn prune_for_customer(applied: &[String], order: &Order, ctx: &OfferContext<'_>) -> Vec<String> {
    let eligible = find_applicable_offers(order, ctx);
    let kept: Vec<String> = applied
        .iter()
        .filter(|id| eligible.iter().any(|offer| offer.id() == id.as_str()))
        .cloned()
        .collect();

    if kept.len() != applied.len() {
        info!(
            removed = applied.len() - kept.len(),
            "Applied offers dropped after customer change"
        );
    }
    kept
}

// =============================================================================
// Equality Guards
// =============================================================================

/// True when any line differs in quantity, unit price, gross, discount or
/// net (or lines were added, removed or reordered).
pub fn pricing_changed(prev: &[OrderItem], next: &[OrderItem]) -> bool {
    prev.len() != next.len()
        || prev.iter().zip(next).any(|(a, b)| {
            a.id != b.id
                || a.quantity != b.quantity
                || a.unit_price != b.unit_price
                || a.gross != b.gross
                || a.discount != b.discount
                || a.net != b.net
        })
}

/// True when the applied offer id lists differ.
pub fn offers_changed(prev: &[String], next: &[String]) -> bool {
    prev != next
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{DiscountTier, OfferTerms};
    use crate::stacking::resolve;
    use crate::testing::{bonus_offer, customer, discount_offer, exclusive, item, list, Fixture};

    fn ids(values: &[&str]) -> Vec<String> {
        list(values)
    }

    fn nets(cart: &PricedCart) -> Vec<i64> {
        cart.items.iter().map(|i| i.net.cents()).collect()
    }

    #[test]
    fn test_strip_to_gross() {
        let line = item("i1", "P1", 3, 1000).with_discount(Money::from_cents(500));
        let clean = strip_to_gross(&[line]);
        assert_eq!(clean[0].gross.cents(), 3000);
        assert!(clean[0].discount.is_zero());
        assert_eq!(clean[0].net.cents(), 3000);
    }

    #[test]
    fn test_toggle_on_and_off() {
        let fx = Fixture::new(vec![discount_offer("A", 1000)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);
        let ctx = fx.context();

        let on = toggle(&[], "A", &order, &ctx);
        assert_eq!(on.applied, ids(&["A"]));
        assert_eq!(nets(&on.cart), vec![9000]);
        assert_eq!(on.cart.totals.discount.cents(), 1000);

        let off = toggle(&on.applied, "A", &order, &ctx);
        assert_eq!(off.outcome, ToggleOutcome::Removed { offer_id: "A".to_string() });
        assert!(off.applied.is_empty());
        assert_eq!(nets(&off.cart), vec![10000]);
    }

    #[test]
    fn test_exclusive_offers_keep_the_better_one_in_any_order() {
        let fx = Fixture::new(vec![exclusive(discount_offer("A", 5000)), exclusive(discount_offer("B", 3000))]);
        let order = fx.order(vec![item("i1", "P1", 1, 10000)]);
        let ctx = fx.context();

        let a = toggle(&[], "A", &order, &ctx);
        let a_then_b = toggle(&a.applied, "B", &order, &ctx);
        assert_eq!(a_then_b.applied, ids(&["A"]));
        assert!(matches!(a_then_b.outcome, ToggleOutcome::Rejected { .. }));

        let b = toggle(&[], "B", &order, &ctx);
        let b_then_a = toggle(&b.applied, "A", &order, &ctx);
        assert_eq!(b_then_a.applied, ids(&["A"]));
        assert_eq!(
            b_then_a.outcome,
            ToggleOutcome::Added {
                offer_id: "A".to_string(),
                replaced: ids(&["B"])
            }
        );

        assert_eq!(a_then_b.cart, b_then_a.cart);
        assert_eq!(nets(&a_then_b.cart), vec![5000]);
    }

    fn toggle_all(order: &Order, ctx: &OfferContext<'_>, offer_ids: &[&str]) -> Vec<String> {
        offer_ids
            .iter()
            .fold(Vec::new(), |applied, id| toggle(&applied, id, order, ctx).applied)
    }

    fn survivors(order: &Order, ctx: &OfferContext<'_>) -> Vec<String> {
        resolve(find_applicable_offers(order, ctx))
            .iter()
            .map(|offer| offer.id().to_string())
            .collect()
    }

    #[test]
    fn test_toggle_and_resolver_agree_with_mixed_stackability() {
        let fx = Fixture::new(vec![
            discount_offer("A", 5000),
            discount_offer("B", 3000),
            exclusive(discount_offer("C", 4000)),
        ]);
        let order = fx.order(vec![item("i1", "P1", 1, 10000)]);
        let ctx = fx.context();

        assert_eq!(survivors(&order, &ctx), ids(&["A", "B"]));
        assert_eq!(toggle_all(&order, &ctx, &["A", "B", "C"]), ids(&["A", "B"]));
        assert_eq!(toggle_all(&order, &ctx, &["A", "C", "B"]), ids(&["A", "B"]));

        let c = toggle(&ids(&["A", "B"]), "C", &order, &ctx);
        assert_eq!(
            c.outcome,
            ToggleOutcome::Rejected {
                offer_id: "C".to_string(),
                blocked_by: ids(&["A"])
            }
        );
    }

    #[test]
    fn test_toggle_and_resolver_agree_when_exclusive_offer_wins() {
        let fx = Fixture::new(vec![
            discount_offer("A", 3000),
            discount_offer("B", 2000),
            exclusive(discount_offer("C", 4000)),
        ]);
        let order = fx.order(vec![item("i1", "P1", 1, 10000)]);
        let ctx = fx.context();

        assert_eq!(survivors(&order, &ctx), ids(&["C"]));
        assert_eq!(toggle_all(&order, &ctx, &["C", "A", "B"]), ids(&["C"]));
        assert_eq!(toggle_all(&order, &ctx, &["A", "B", "C"]), ids(&["C"]));
    }

    #[test]
    fn test_off_then_on_does_not_double_count() {
        let fx = Fixture::new(vec![exclusive(discount_offer("A", 5000)), exclusive(discount_offer("B", 3000))]);
        let order = fx.order(vec![item("i1", "P1", 1, 10000)]);
        let ctx = fx.context();

        let first = toggle(&[], "A", &order, &ctx);
        let priced = Order {
            items: first.cart.items.clone(),
            ..order.clone()
        };
        let off = toggle(&first.applied, "A", &priced, &ctx);
        let priced = Order {
            items: off.cart.items.clone(),
            ..order.clone()
        };
        let on = toggle(&off.applied, "A", &priced, &ctx);

        assert_eq!(nets(&on.cart), nets(&first.cart));
        assert_eq!(on.cart.totals.discount.cents(), 5000);
    }

    #[test]
    fn test_reapplying_the_same_set_is_idempotent() {
        let fx = Fixture::new(vec![discount_offer("A", 1000), discount_offer("B", 500)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000), item("i2", "P2", 3, 333)]);
        let ctx = fx.context();
        let applied = ids(&["A", "B"]);

        let once = recompute(&order.items, &applied, &order, &ctx);
        let twice = recompute(&once.items, &applied, &order, &ctx);
        assert_eq!(once, twice);
        assert!(!pricing_changed(&once.items, &twice.items));
    }

    #[test]
    fn test_percentages_add_on_gross_without_compounding() {
        let fx = Fixture::new(vec![discount_offer("A", 1000), discount_offer("B", 500)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);
        let cart = recompute(&order.items, &ids(&["A", "B"]), &order, &fx.context());
        // 15% of 100.00, not 10% then 5% of the remainder
        assert_eq!(cart.items[0].discount.cents(), 1500);
        assert_eq!(cart.applied_offer_ids, ids(&["A", "B"]));
    }

    #[test]
    fn test_percent_sum_is_capped_at_gross() {
        let fx = Fixture::new(vec![discount_offer("A", 8000), discount_offer("B", 8000)]);
        let order = fx.order(vec![item("i1", "P1", 2, 1000)]);
        let cart = recompute(&order.items, &ids(&["A", "B"]), &order, &fx.context());
        assert_eq!(cart.items[0].discount.cents(), 2000);
        assert!(cart.items[0].net.is_zero());
    }

    #[test]
    fn test_offer_not_eligible_is_not_applicable() {
        let mut offer = discount_offer("A", 1000);
        offer.scope.codigos_producto = list(&["P9"]);
        let fx = Fixture::new(vec![offer]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);

        let result = toggle(&[], "A", &order, &fx.context());
        assert_eq!(result.outcome, ToggleOutcome::NotApplicable { offer_id: "A".to_string() });
        assert!(result.applied.is_empty());

        let unknown = toggle(&[], "NOPE", &order, &fx.context());
        assert!(matches!(unknown.outcome, ToggleOutcome::NotApplicable { .. }));
    }

    #[test]
    fn test_dormant_offer_returns_when_cart_qualifies_again() {
        let mut offer = discount_offer("T", 0);
        offer.terms = OfferTerms::Discount(crate::offer::DiscountConfig {
            tiers: vec![DiscountTier {
                from: 12,
                to: None,
                percent: DiscountRate::from_percentage(10.0),
                amount: Money::zero(),
            }],
            ..Default::default()
        });
        let fx = Fixture::new(vec![offer]);
        let ctx = fx.context();
        let applied = ids(&["T"]);

        let small = fx.order(vec![item("i1", "P1", 5, 1000)]);
        let cart = recompute(&small.items, &applied, &small, &ctx);
        assert!(cart.totals.discount.is_zero());
        assert!(cart.applied_offer_ids.is_empty());

        let large = fx.order(vec![item("i1", "P1", 12, 1000)]);
        let cart = recompute(&large.items, &applied, &large, &ctx);
        assert_eq!(cart.totals.discount.cents(), 1200);
        assert_eq!(cart.applied_offer_ids, applied);
    }

    #[test]
    fn test_bonus_offer_produces_bonus_lines() {
        let fx = Fixture::new(vec![bonus_offer("B", 12, 1)]);
        let order = fx.order(vec![item("i1", "P1", 30, 1000)]);
        let result = toggle(&[], "B", &order, &fx.context());

        assert_eq!(result.cart.bonus_lines.len(), 1);
        let line = &result.cart.bonus_lines[0];
        assert_eq!(line.quantity, 2);
        assert_eq!(line.product_id.as_deref(), Some("P1"));
        assert_eq!(line.source_item_ids, ids(&["i1"]));
        assert!(result.cart.totals.discount.is_zero());
    }

    #[test]
    fn test_customer_change_prunes_ineligible_offers() {
        let mut channel_offer = discount_offer("CANAL", 1000);
        channel_offer.scope.canales = list(&["02"]);
        let fx = Fixture::new(vec![channel_offer, discount_offer("OPEN", 500)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);
        let applied = ids(&["CANAL", "OPEN"]);

        let other = customer("C-2", "05");
        let ctx = fx.context().with_customer(Some(&other));
        assert_eq!(prune_for_customer(&applied, &order, &ctx), ids(&["OPEN"]));

        let none = fx.context().with_customer(None);
        assert!(prune_for_customer(&applied, &order, &none).is_empty());
    }

    #[test]
    fn test_equality_guards() {
        let a = vec![item("i1", "P1", 1, 1000)];
        let mut b = a.clone();
        assert!(!pricing_changed(&a, &b));

        b[0] = b[0].with_discount(Money::from_cents(1));
        assert!(pricing_changed(&a, &b));
        assert!(pricing_changed(&a, &[]));

        assert!(!offers_changed(&ids(&["A"]), &ids(&["A"])));
        assert!(offers_changed(&ids(&["A"]), &ids(&["A", "B"])));
    }
}
