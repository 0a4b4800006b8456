//! # Offer Matcher
//!
//! Produces the list of offers an order qualifies for right now.
//!
//! ## Matching Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      find_applicable_offers()                           │
//! │                                                                         │
//! │  customer absent or cart empty ──────────────────────► []               │
//! │                                                                         │
//! │  for each offer (catalog order):                                        │
//! │    ├── combo / kit / pricelist           → skipped                      │
//! │    ├── not live / other company          → skipped                      │
//! │    ├── customer out of scope             → skipped                      │
//! │    ├── matched lines = clean lines in item scope                        │
//! │    │     none                            → skipped                      │
//! │    ├── discount: potential_discount      (zero → skipped)               │
//! │    └── bonus:    potential_bonus_qty     (zero → skipped)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are always evaluated at gross, so whatever offers are currently
//! applied never change what another offer is worth.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate};
use preventa_core::{Customer, Money, Order, OrderItem};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::bonus::{self, BonusApplication};
use crate::catalog::ProductCatalog;
use crate::config::EngineConfig;
use crate::discount;
use crate::normalize::key;
use crate::offer::{OfferDef, OfferTerms};
use crate::scope::{company_matches, customer_in_scope, item_in_scope, offer_is_live};

// =============================================================================
// Evaluation Context
// =============================================================================

/// Everything an evaluation reads besides the order itself.
#[derive(Debug, Clone, Copy)]
pub struct OfferContext<'a> {
    pub customer: Option<&'a Customer>,
    pub catalog: &'a ProductCatalog,
    pub offers: &'a [OfferDef],
    pub today: NaiveDate,
    pub config: &'a EngineConfig,
}

impl<'a> OfferContext<'a> {
    pub fn new(
        customer: Option<&'a Customer>,
        catalog: &'a ProductCatalog,
        offers: &'a [OfferDef],
        today: NaiveDate,
        config: &'a EngineConfig,
    ) -> Self {
        OfferContext {
            customer,
            catalog,
            offers,
            today,
            config,
        }
    }

    /// Context dated with the device's local calendar day.
    pub fn for_local_today(
        customer: Option<&'a Customer>,
        catalog: &'a ProductCatalog,
        offers: &'a [OfferDef],
        config: &'a EngineConfig,
    ) -> Self {
        Self::new(customer, catalog, offers, Local::now().date_naive(), config)
    }

    /// Same context for another customer.
    pub fn with_customer(self, customer: Option<&'a Customer>) -> Self {
        OfferContext { customer, ..self }
    }

    /// Looks up an offer definition by id.
    pub fn offer(&self, offer_id: &str) -> Option<&'a OfferDef> {
        self.offers.iter().find(|offer| offer.id == offer_id)
    }

    /// Catalog position of an offer, used as the last tie-break.
    pub fn position(&self, offer_id: &str) -> usize {
        self.offers
            .iter()
            .position(|offer| offer.id == offer_id)
            .unwrap_or(usize::MAX)
    }
}

// =============================================================================
// Applicable Offer
// =============================================================================

/// An offer the current order qualifies for, with what it is worth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableOffer {
    pub offer: OfferDef,
    /// Matched lines, at gross.
    pub applicable_items: Vec<OrderItem>,
    /// Total discount the offer would give on its own. Zero for bonus offers.
    pub potential_discount: Money,
    pub potential_bonus_qty: Option<i64>,
    pub bonus_applications: Option<Vec<BonusApplication>>,
}

impl ApplicableOffer {
    pub fn id(&self) -> &str {
        &self.offer.id
    }

    pub fn is_stackable(&self) -> bool {
        self.offer.stackable_with_same_product
    }

    /// Normalized product ids of the matched lines.
    pub fn product_keys(&self) -> BTreeSet<String> {
        self.applicable_items
            .iter()
            .map(|item| key(&item.product_id))
            .collect()
    }

    /// True when both offers touch at least one common product.
    pub fn overlaps(&self, other: &ApplicableOffer) -> bool {
        !self.product_keys().is_disjoint(&other.product_keys())
    }

    /// True when the two offers may not both apply: they share a product and
    /// at least one of them refuses to combine on the same product.
    pub fn conflicts_with(&self, other: &ApplicableOffer) -> bool {
        (!self.is_stackable() || !other.is_stackable()) && self.overlaps(other)
    }
}

// =============================================================================
// Matching
// =============================================================================

/// Returns every offer the order currently qualifies for, in catalog order.
///
/// No customer or no lines means no offers.
pub fn find_applicable_offers(order: &Order, ctx: &OfferContext<'_>) -> Vec<ApplicableOffer> {
    if ctx.customer.is_none() || order.is_empty() {
        return Vec::new();
    }

    let clean = clean_order(order);
    let applicable: Vec<ApplicableOffer> = ctx
        .offers
        .iter()
        .filter_map(|offer| evaluate_clean(offer, &clean, ctx))
        .collect();

    debug!(
        offers = ctx.offers.len(),
        applicable = applicable.len(),
        "Matched offers against order"
    );
    applicable
}

/// Evaluates a single offer against the order.
pub fn evaluate_offer(
    offer: &OfferDef,
    order: &Order,
    ctx: &OfferContext<'_>,
) -> Option<ApplicableOffer> {
    evaluate_clean(offer, &clean_order(order), ctx)
}

fn clean_order(order: &Order) -> Order {
    Order {
        items: order.items.iter().map(OrderItem::stripped).collect(),
        ..order.clone()
    }
}

fn evaluate_clean(offer: &OfferDef, order: &Order, ctx: &OfferContext<'_>) -> Option<ApplicableOffer> {
    let customer = ctx.customer?;

    if !offer.terms.is_evaluated() {
        debug!(offer_id = %offer.id, kind = offer.terms.kind(), "Offer type not evaluated here");
        return None;
    }
    if !offer_is_live(offer, ctx.today, &ctx.config.offers) {
        debug!(offer_id = %offer.id, status = ?offer.status, "Offer not live");
        return None;
    }
    if !company_matches(offer, order) {
        debug!(offer_id = %offer.id, "Offer belongs to another company");
        return None;
    }
    if !customer_in_scope(offer, customer, order) {
        debug!(offer_id = %offer.id, "Customer out of offer scope");
        return None;
    }

    let matched: Vec<OrderItem> = order
        .items
        .iter()
        .filter(|item| item.quantity > 0 && item_in_scope(offer, item, ctx.catalog))
        .cloned()
        .collect();
    if matched.is_empty() {
        debug!(offer_id = %offer.id, "No order line in offer scope");
        return None;
    }

    match &offer.terms {
        OfferTerms::Discount(config) => {
            let potential = discount::calculate(config, &matched, &ctx.config.discount);
            if potential.is_zero() {
                debug!(offer_id = %offer.id, "Discount offer yields nothing");
                return None;
            }
            Some(ApplicableOffer {
                offer: offer.clone(),
                applicable_items: matched,
                potential_discount: potential,
                potential_bonus_qty: None,
                bonus_applications: None,
            })
        }
        OfferTerms::Bonus(config) => {
            let outcome = bonus::calculate(config, &matched, ctx.catalog);
            if outcome.is_empty() {
                debug!(offer_id = %offer.id, "Bonus offer yields nothing");
                return None;
            }
            Some(ApplicableOffer {
                offer: offer.clone(),
                applicable_items: matched,
                potential_discount: Money::zero(),
                potential_bonus_qty: Some(outcome.total_bonus_qty),
                bonus_applications: Some(outcome.applications),
            })
        }
        OfferTerms::Combo | OfferTerms::Kit | OfferTerms::PriceList => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offer::{DiscountConfig, OfferStatus};
    use crate::testing::{bonus_offer, customer, discount_offer, item, list, Fixture};

    #[test]
    fn test_no_customer_means_no_offers() {
        let fx = Fixture::new(vec![discount_offer("A", 1000)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);
        let ctx = fx.context().with_customer(None);
        assert!(find_applicable_offers(&order, &ctx).is_empty());
    }

    #[test]
    fn test_empty_cart_means_no_offers() {
        let fx = Fixture::new(vec![discount_offer("A", 1000)]);
        assert!(find_applicable_offers(&fx.order(vec![]), &fx.context()).is_empty());
    }

    #[test]
    fn test_discount_and_bonus_offers_are_listed_in_catalog_order() {
        let fx = Fixture::new(vec![bonus_offer("B", 12, 1), discount_offer("A", 1000)]);
        let order = fx.order(vec![item("i1", "P1", 30, 1000)]);

        let found = find_applicable_offers(&order, &fx.context());
        let ids: Vec<&str> = found.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(found[0].potential_bonus_qty, Some(2));
        assert!(found[0].potential_discount.is_zero());
        assert_eq!(found[1].potential_discount.cents(), 3000);
    }

    #[test]
    fn test_excluded_offers_are_skipped() {
        let mut draft = discount_offer("DRAFT", 1000);
        draft.status = OfferStatus::Draft;
        let mut scoped = discount_offer("OTHER-CHANNEL", 1000);
        scoped.scope.canales = list(&["99"]);
        let mut combo = discount_offer("COMBO", 1000);
        combo.terms = OfferTerms::Combo;
        let mut other_product = discount_offer("OTHER-PRODUCT", 1000);
        other_product.scope.codigos_producto = list(&["P9"]);

        let fx = Fixture::new(vec![draft, scoped, combo, other_product, discount_offer("OK", 1000)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);

        let found = find_applicable_offers(&order, &fx.context());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), "OK");
    }

    #[test]
    fn test_applied_discounts_do_not_change_potential() {
        let fx = Fixture::new(vec![discount_offer("A", 1000)]);
        let mut line = item("i1", "P1", 10, 1000);
        line = line.with_discount(Money::from_cents(5000));
        let order = fx.order(vec![line]);

        let found = find_applicable_offers(&order, &fx.context());
        assert_eq!(found[0].potential_discount.cents(), 1000);
        assert_eq!(found[0].applicable_items[0].discount, Money::zero());
    }

    #[test]
    fn test_oversized_offer_amounts_do_not_abort_matching() {
        let mut fixed = discount_offer("F", 0);
        fixed.terms = OfferTerms::Discount(DiscountConfig {
            amount: Money::from_cents(i64::MAX / 4),
            ..Default::default()
        });
        let fx = Fixture::new(vec![fixed, bonus_offer("B", 1, i64::MAX / 4)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);

        let found = find_applicable_offers(&order, &fx.context());
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].potential_discount.cents(), 10000);
        assert_eq!(found[1].potential_bonus_qty, Some(i64::MAX));
    }

    #[test]
    fn test_customer_scope_normalizes_codes() {
        let mut offer = discount_offer("A", 1000);
        offer.scope.codigos_cliente = list(&["007"]);
        let mut fx = Fixture::new(vec![offer]);
        fx.customer = customer("7", "02");

        let order = fx.order(vec![item("i1", "P1", 1, 1000)]);
        assert_eq!(find_applicable_offers(&order, &fx.context()).len(), 1);
    }

    #[test]
    fn test_conflicts_require_overlap_and_a_non_stackable_side() {
        let fx = Fixture::new(vec![discount_offer("A", 1000), discount_offer("B", 500)]);
        let order = fx.order(vec![item("i1", "P1", 10, 1000)]);
        let found = find_applicable_offers(&order, &fx.context());

        assert!(found[0].overlaps(&found[1]));
        assert!(!found[0].conflicts_with(&found[1]));

        let mut exclusive = found[1].clone();
        exclusive.offer.stackable_with_same_product = false;
        assert!(found[0].conflicts_with(&exclusive));
    }
}
