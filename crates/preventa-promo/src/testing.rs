//! Builders shared by the unit tests.

use chrono::NaiveDate;
use preventa_core::{Customer, DiscountRate, Money, Order, OrderItem, Product};

use crate::catalog::ProductCatalog;
use crate::config::EngineConfig;
use crate::matcher::{ApplicableOffer, OfferContext};
use crate::offer::{BonusConfig, DiscountConfig, OfferDef, OfferScope, OfferStatus, OfferTerms};

pub fn list(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn item(id: &str, product_id: &str, quantity: i64, unit_cents: i64) -> OrderItem {
    OrderItem::new(id, product_id, quantity, Money::from_cents(unit_cents))
}

pub fn product(code: &str, price_cents: i64, family: Option<&str>, line: Option<&str>) -> Product {
    Product {
        id: code.to_string(),
        code: code.to_string(),
        name: format!("Producto {}", code),
        family_code: family.map(str::to_string),
        line_code: line.map(str::to_string),
        price: Money::from_cents(price_cents),
        ..Default::default()
    }
}

pub fn customer(code: &str, channel_code: &str) -> Customer {
    Customer {
        code: Some(code.to_string()),
        channel_code: Some(channel_code.to_string()),
        ..Default::default()
    }
}

fn offer(id: &str, terms: OfferTerms) -> OfferDef {
    OfferDef {
        id: id.to_string(),
        name: format!("Oferta {}", id),
        status: OfferStatus::Active,
        valid_from: None,
        valid_to: None,
        company: None,
        scope: OfferScope::default(),
        stackable_with_same_product: true,
        priority: 5,
        terms,
    }
}

/// Open, stackable flat-percentage discount.
pub fn discount_offer(id: &str, bps: u32) -> OfferDef {
    offer(
        id,
        OfferTerms::Discount(DiscountConfig {
            percent: DiscountRate::from_bps(bps),
            ..Default::default()
        }),
    )
}

/// Open, stackable pooled "every N gives M" bonus on the same product.
pub fn bonus_offer(id: &str, every_n: i64, gives_m: i64) -> OfferDef {
    offer(
        id,
        OfferTerms::Bonus(BonusConfig {
            every_n,
            gives_m,
            ..Default::default()
        }),
    )
}

pub fn exclusive(mut offer: OfferDef) -> OfferDef {
    offer.stackable_with_same_product = false;
    offer
}

pub fn applicable(
    id: &str,
    stackable: bool,
    discount_cents: i64,
    priority: i32,
    items: Vec<OrderItem>,
) -> ApplicableOffer {
    let mut def = discount_offer(id, 0);
    def.stackable_with_same_product = stackable;
    def.priority = priority;
    ApplicableOffer {
        offer: def,
        applicable_items: items,
        potential_discount: Money::from_cents(discount_cents),
        potential_bonus_qty: None,
        bonus_applications: None,
    }
}

/// A customer, a small catalog (P, P1..P3) and an offer list.
pub struct Fixture {
    pub customer: Customer,
    pub catalog: ProductCatalog,
    pub offers: Vec<OfferDef>,
    pub config: EngineConfig,
    pub today: NaiveDate,
}

impl Fixture {
    pub fn new(offers: Vec<OfferDef>) -> Self {
        Fixture {
            customer: customer("C-1", "02"),
            catalog: ProductCatalog::new(vec![
                product("P", 10000, None, None),
                product("P1", 1000, Some("F1"), Some("L1")),
                product("P2", 1000, Some("F1"), Some("L2")),
                product("P3", 500, Some("F2"), Some("L2")),
            ]),
            offers,
            config: EngineConfig::default(),
            today: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
        }
    }

    pub fn context(&self) -> OfferContext<'_> {
        OfferContext::new(
            Some(&self.customer),
            &self.catalog,
            &self.offers,
            self.today,
            &self.config,
        )
    }

    pub fn order(&self, items: Vec<OrderItem>) -> Order {
        Order {
            company_code: None,
            seller_code: None,
            items,
        }
    }
}
