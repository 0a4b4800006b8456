//! # Order Session
//!
//! The order being taken, the offers the seller applied to it, and the
//! priced cart the order screen shows.
//!
//! ## User Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Seller picks customer ─► OrderSession::new(order)                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  add_product / set_quantity / remove_item                               │
//! │        │   strip → edit → recompute with the same applied set           │
//! │        ▼                                                                │
//! │  available_offers ─► picker ─► toggle_offer                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  change_customer ─► drop offers the new customer can not have           │
//! │                                                                         │
//! │  Each call returns true only if the cart or the applied set changed,   │
//! │  so the screen re-renders only on real changes.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session does not own the customer or the offer catalog: every call
//! receives an [`OfferContext`] describing them as they are now.

use preventa_core::validation::{validate_order_size, validate_product_code, validate_quantity};
use preventa_core::{CoreError, Order, OrderItem, OrderTotals, MAX_LINE_QUANTITY, MAX_ORDER_LINES};
use tracing::{debug, info};

use crate::applicator::{
    offers_changed, pricing_changed, prune_for_customer, recompute, toggle, PricedCart,
    ToggleOutcome,
};
use crate::error::PromoResult;
use crate::matcher::{find_applicable_offers, ApplicableOffer, OfferContext};

/// An order in progress with its applied offers.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSession {
    order: Order,
    applied: Vec<String>,
    cart: PricedCart,
}

impl OrderSession {
    /// Starts a session with no offers applied.
    pub fn new(order: Order) -> Self {
        let cart = PricedCart::plain(&order.items);
        let order = Order {
            items: cart.items.clone(),
            ..order
        };
        OrderSession {
            order,
            applied: Vec::new(),
            cart,
        }
    }

    /// The order with its lines as currently priced.
    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn cart(&self) -> &PricedCart {
        &self.cart
    }

    /// Offers the seller has applied, including ones that currently have no
    /// effect because the cart stopped qualifying.
    pub fn applied_offer_ids(&self) -> &[String] {
        &self.applied
    }

    pub fn totals(&self) -> OrderTotals {
        self.cart.totals
    }

    /// Offers the order qualifies for right now, for the picker.
    pub fn available_offers(&self, ctx: &OfferContext<'_>) -> Vec<ApplicableOffer> {
        find_applicable_offers(&self.order, ctx)
    }

    /// Toggles an offer on or off.
    pub fn toggle_offer(&mut self, offer_id: &str, ctx: &OfferContext<'_>) -> ToggleOutcome {
        let result = toggle(&self.applied, offer_id, &self.order, ctx);
        self.commit(result.applied, result.cart);
        result.outcome
    }

    /// Adds a product by id or code.
    ///
    /// Adding a product that already has a line increases that line's
    /// quantity instead of creating a second line.
    pub fn add_product(
        &mut self,
        product_code: &str,
        quantity: i64,
        ctx: &OfferContext<'_>,
    ) -> PromoResult<bool> {
        validate_product_code(product_code)?;
        validate_quantity(quantity)?;
        let product = ctx
            .catalog
            .get(product_code)
            .ok_or_else(|| CoreError::ProductNotFound(product_code.to_string()))?;

        let mut items = self.order.items.clone();
        if let Some(line) = items.iter_mut().find(|i| i.product_id == product.order_key()) {
            let requested = line.quantity + quantity;
            if requested > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_LINE_QUANTITY,
                }
                .into());
            }
            line.quantity = requested;
        } else {
            validate_order_size(items.len())
                .map_err(|_| CoreError::OrderTooLarge { max: MAX_ORDER_LINES })?;
            items.push(OrderItem::from_product(product, quantity));
        }

        debug!(product = %product.order_key(), quantity, "Product added to order");
        Ok(self.edit(items, ctx))
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn set_quantity(
        &mut self,
        item_id: &str,
        quantity: i64,
        ctx: &OfferContext<'_>,
    ) -> PromoResult<bool> {
        if quantity == 0 {
            return self.remove_item(item_id, ctx);
        }
        validate_quantity(quantity)?;

        let mut items = self.order.items.clone();
        let line = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        line.quantity = quantity;

        Ok(self.edit(items, ctx))
    }

    /// Removes a line.
    pub fn remove_item(&mut self, item_id: &str, ctx: &OfferContext<'_>) -> PromoResult<bool> {
        if self.order.find_item(item_id).is_none() {
            return Err(CoreError::ItemNotFound(item_id.to_string()).into());
        }
        let items: Vec<OrderItem> = self
            .order
            .items
            .iter()
            .filter(|i| i.id != item_id)
            .cloned()
            .collect();
        Ok(self.edit(items, ctx))
    }

    /// Re-evaluates the applied offers for the customer in `ctx`, dropping
    /// the ones that customer is not eligible for.
    pub fn change_customer(&mut self, ctx: &OfferContext<'_>) -> bool {
        let applied = prune_for_customer(&self.applied, &self.order, ctx);
        let cart = recompute(&self.order.items, &applied, &self.order, ctx);
        self.commit(applied, cart)
    }

    /// Strip, edit, recompute with the same applied set.
    fn edit(&mut self, items: Vec<OrderItem>, ctx: &OfferContext<'_>) -> bool {
        let edited = Order {
            items,
            ..self.order.clone()
        };
        let cart = recompute(&edited.items, &self.applied, &edited, ctx);
        let applied = self.applied.clone();
        self.commit(applied, cart)
    }

    fn commit(&mut self, applied: Vec<String>, cart: PricedCart) -> bool {
        let changed = pricing_changed(&self.cart.items, &cart.items)
            || offers_changed(&self.applied, &applied)
            || self.cart.bonus_lines != cart.bonus_lines;
        if !changed {
            return false;
        }

        info!(
            lines = cart.items.len(),
            applied = applied.len(),
            net = %cart.totals.net,
            "Order repriced"
        );
        self.order.items = cart.items.clone();
        self.applied = applied;
        self.cart = cart;
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
