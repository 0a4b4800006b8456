//! # Scope Matching
//!
//! Decides whether an offer is live today, belongs to the order's company,
//! covers the customer, and covers a given order line.
//!
//! ## Evaluation Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  offer_is_live        status not excluded, valid_from ≤ today ≤ valid_to│
//! │        │                                                                │
//! │        ▼                                                                │
//! │  company_matches      either side absent, or equal ignoring case       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  customer_in_scope    every populated customer dimension shares a token │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  item_in_scope        (per line) product/provider/family/line key hit  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Customer dimensions compare token sets (`"02 - Mayorista"` matches either
//! `"2"` or `"MAYORISTA"`); product dimensions compare whole normalized keys.
//! A populated dimension with nothing to compare fails closed.

use chrono::NaiveDate;
use preventa_core::{Customer, Order, OrderItem};

use crate::catalog::ProductCatalog;
use crate::config::OfferSettings;
use crate::normalize::{fold, key_in, tokens_intersect};
use crate::offer::{OfferDef, OfferStatus};

/// True when the offer's status allows evaluation and `today` falls inside
/// its (inclusive) validity window.
pub fn offer_is_live(offer: &OfferDef, today: NaiveDate, settings: &OfferSettings) -> bool {
    status_allows(&offer.status, settings)
        && offer.valid_from.map_or(true, |from| from <= today)
        && offer.valid_to.map_or(true, |to| today <= to)
}

fn status_allows(status: &OfferStatus, settings: &OfferSettings) -> bool {
    if status.is_excluded() {
        return false;
    }
    match status {
        OfferStatus::Other(word) => !settings
            .extra_excluded_statuses
            .iter()
            .any(|extra| fold(extra) == *word),
        _ => true,
    }
}

/// Company check: both codes present means they must be equal (ignoring case
/// and surrounding blanks); either one missing means no restriction.
pub fn company_matches(offer: &OfferDef, order: &Order) -> bool {
    let offer_company = offer.company.as_deref().map(fold).filter(|c| !c.is_empty());
    let order_company = order.company_code.as_deref().map(fold).filter(|c| !c.is_empty());
    match (offer_company, order_company) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    }
}

/// True when the customer (and the order's seller) satisfy every populated
/// customer-side allow-list of the offer.
pub fn customer_in_scope(offer: &OfferDef, customer: &Customer, order: &Order) -> bool {
    let scope = &offer.scope;
    let seller: Vec<&str> = order
        .seller_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .into_iter()
        .collect();

    // Zone data is loose in the field: region and department are both
    // tried against either list.
    let regions = customer.region_candidates();

    dimension_matches(&scope.codigos_cliente, &customer.code_candidates())
        && dimension_matches(&scope.canales, &customer.channel_candidates())
        && dimension_matches(&scope.sub_canales, &customer.sub_channel_candidates())
        && dimension_matches(&scope.regiones, &regions)
        && dimension_matches(&scope.departamentos, &regions)
        && dimension_matches(&scope.vendedores, &seller)
}

fn dimension_matches(allow_list: &[String], candidates: &[&str]) -> bool {
    allow_list.is_empty() || tokens_intersect(candidates, allow_list)
}

/// True when the order line's product is covered by the offer.
///
/// A product matches on its own code (or id), or on its provider, family,
/// sub-family or line code. Sub-family and line lists are interchangeable.
/// A line whose product is not in the catalog can only match on its
/// product id.
pub fn item_in_scope(offer: &OfferDef, item: &OrderItem, catalog: &ProductCatalog) -> bool {
    let scope = &offer.scope;
    if scope.is_product_open() {
        return true;
    }

    if key_in(&item.product_id, &scope.codigos_producto) {
        return true;
    }

    let Some(product) = catalog.get(&item.product_id) else {
        return false;
    };

    let in_list = |value: &Option<String>, list: &[String]| {
        value.as_deref().map_or(false, |v| key_in(v, list))
    };

    key_in(&product.code, &scope.codigos_producto)
        || key_in(&product.id, &scope.codigos_producto)
        || in_list(&product.provider_code, &scope.codigos_proveedor)
        || in_list(&product.family_code, &scope.codigos_familia)
        || [&product.sub_family_code, &product.line_code]
            .into_iter()
            .any(|code| {
                in_list(code, &scope.codigos_subfamilia) || in_list(code, &scope.codigos_linea)
            })
}
