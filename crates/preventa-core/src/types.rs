//! # Domain Types
//!
//! Core domain types shared by the order-entry host and the promotions engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id / code      │   │  company_code   │   │  code           │       │
//! │  │  provider_code  │   │  seller_code    │   │  channel        │       │
//! │  │  family_code    │   │  items ───────┐ │   │  sub_channel    │       │
//! │  │  line_code      │   └───────────────┼─┘   │  region         │       │
//! │  └─────────────────┘                   ▼     └─────────────────┘       │
//! │                        ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │   OrderItem     │   │  DiscountRate   │       │
//! │                        │  ─────────────  │   │  ─────────────  │       │
//! │                        │  quantity       │   │  bps (u32)      │       │
//! │                        │  unit_price     │   │  700 = 7%       │       │
//! │                        │  gross/disc/net │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Products and customers arrive from the offline catalog cache, which has
//! gone through several field-naming generations (`codigoCliente`,
//! `codCliente`, `codigo`, ...). The legacy names are accepted as serde
//! aliases so the engine only ever sees one field per attribute.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// A discount rate in basis points: 700 = 7%, a typical case-volume tier.
///
/// Two offers of 10% and 5% on the same line add up to 1500 bps exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100%.
    pub const FULL: DiscountRate = DiscountRate(10_000);

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a percentage as authored in the back office.
    ///
    /// Negative and non-finite values collapse to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return DiscountRate::zero();
        }
        DiscountRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Percentage for logs and the picker label.
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two rates, never exceeding 100%.
    ///
    /// Stacked offers on the same line add their percentages on the same
    /// gross base; the sum is capped so a line can never go below zero
    /// through percentages alone.
    pub fn saturating_add(self, other: DiscountRate) -> DiscountRate {
        DiscountRate(self.0.saturating_add(other.0).min(Self::FULL.0))
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product as delivered by the offline catalog cache.
///
/// Only the attributes offers can be scoped on are modeled here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Local identifier. Often equal to `code`.
    #[serde(default)]
    pub id: String,

    /// Business product code (what order lines reference).
    #[serde(default, alias = "codigoProducto", alias = "codigo")]
    pub code: String,

    /// Display name.
    #[serde(default, alias = "nombre", alias = "descripcion")]
    pub name: String,

    #[serde(default, alias = "codigoProveedor", alias = "proveedor")]
    pub provider_code: Option<String>,

    #[serde(default, alias = "codigoFamilia", alias = "familia")]
    pub family_code: Option<String>,

    #[serde(
        default,
        alias = "codigoSubfamilia",
        alias = "codigoSubFamilia",
        alias = "subfamilia"
    )]
    pub sub_family_code: Option<String>,

    #[serde(default, alias = "codigoLinea", alias = "linea")]
    pub line_code: Option<String>,

    /// List price in cents.
    #[serde(default, alias = "precio")]
    pub price: Money,
}

impl Product {
    /// The identifier order lines should carry for this product.
    ///
    /// Prefers the business code; falls back to the local id.
    pub fn order_key(&self) -> &str {
        if self.code.trim().is_empty() {
            &self.id
        } else {
            &self.code
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer (point of sale on the route).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(
        default,
        alias = "codigoCliente",
        alias = "codCliente",
        alias = "codigo",
        alias = "clienteId"
    )]
    pub code: Option<String>,

    #[serde(default, alias = "nombre", alias = "razonSocial")]
    pub name: Option<String>,

    /// Channel name (e.g. "Mayorista").
    #[serde(default, alias = "canal", alias = "canalVenta")]
    pub channel: Option<String>,

    /// Channel code (e.g. "02").
    #[serde(default, alias = "codigoCanal", alias = "codCanal")]
    pub channel_code: Option<String>,

    #[serde(default, alias = "subCanal", alias = "subcanal")]
    pub sub_channel: Option<String>,

    #[serde(default, alias = "codigoSubCanal", alias = "codigoSubcanal")]
    pub sub_channel_code: Option<String>,

    #[serde(default, alias = "zona")]
    pub region: Option<String>,

    #[serde(default, alias = "departamento")]
    pub department: Option<String>,
}

impl Customer {
    /// Values to test against a `codigosCliente` allow-list.
    pub fn code_candidates(&self) -> Vec<&str> {
        present([&self.code])
    }

    /// Values to test against a `canales` allow-list (code and name).
    pub fn channel_candidates(&self) -> Vec<&str> {
        present([&self.channel_code, &self.channel])
    }

    /// Values to test against a `subCanales` allow-list (code and name).
    pub fn sub_channel_candidates(&self) -> Vec<&str> {
        present([&self.sub_channel_code, &self.sub_channel])
    }

    /// Values to test against `regiones` / `departamentos` allow-lists.
    pub fn region_candidates(&self) -> Vec<&str> {
        present([&self.region, &self.department])
    }
}

fn present<'a, const N: usize>(fields: [&'a Option<String>; N]) -> Vec<&'a str> {
    fields
        .into_iter()
        .filter_map(|f| f.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

// =============================================================================
// Order Item
// =============================================================================

/// A cart line.
///
/// ## Ownership of the Pricing Fields
/// `quantity`, `unit_price` belong to the host (cart edits). `gross`,
/// `discount` and `net` belong to the promotions engine and are always
/// recomputed from `quantity × unit_price`, never from a previous net, so
/// re-running the engine can not compound discounts.
///
/// ```text
/// gross    = quantity × unit_price
/// discount = Σ offer contributions (≤ gross)
/// net      = gross − discount      (≥ 0)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Line amount before discounts.
    #[serde(default)]
    pub gross: Money,
    /// Discount attributed to this line by applied offers.
    #[serde(default)]
    pub discount: Money,
    /// Line amount after discounts.
    #[serde(default)]
    pub net: Money,
}

impl OrderItem {
    /// Creates a clean line (no discount).
    pub fn new(
        id: impl Into<String>,
        product_id: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> Self {
        let gross = unit_price.multiply_quantity(quantity);
        OrderItem {
            id: id.into(),
            product_id: product_id.into(),
            quantity,
            unit_price,
            gross,
            discount: Money::zero(),
            net: gross,
        }
    }

    /// Creates a new line from a catalog product, freezing its price.
    ///
    /// The line gets a fresh UUID v4 so two lines of the same product
    /// (e.g. a paid line and a manually entered sample) stay distinct.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        OrderItem::new(
            Uuid::new_v4().to_string(),
            product.order_key(),
            quantity,
            product.price,
        )
    }

    /// `quantity × unit_price`, independent of whatever is stored in `gross`.
    #[inline]
    pub fn line_gross(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Returns this line back at gross with every discount removed.
    pub fn stripped(&self) -> Self {
        OrderItem::new(
            self.id.clone(),
            self.product_id.clone(),
            self.quantity,
            self.unit_price,
        )
    }

    /// Returns this line (rebased on its gross) carrying `discount`.
    ///
    /// The discount is clamped to `[0, gross]`, so `gross = discount + net`
    /// always holds.
    pub fn with_discount(&self, discount: Money) -> Self {
        let mut line = self.stripped();
        line.discount = discount.clamp_to(line.gross);
        line.net = line.gross - line.discount;
        line
    }

    /// True when some offer currently discounts this line.
    #[inline]
    pub fn is_discounted(&self) -> bool {
        !self.discount.is_zero()
    }
}

// =============================================================================
// Order
// =============================================================================

/// The subset of an order the promotions engine reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(default, alias = "codigoEmpresa")]
    pub company_code: Option<String>,

    /// Seller (route salesperson) taking the order.
    #[serde(default, alias = "codigoVendedor", alias = "vendedor")]
    pub seller_code: Option<String>,

    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Creates an empty order.
    pub fn new(company_code: Option<String>, seller_code: Option<String>) -> Self {
        Order {
            company_code,
            seller_code,
            items: Vec::new(),
        }
    }

    /// Checks if the order has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Finds a line by its id.
    pub fn find_item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Summarizes the current lines.
    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from(self.items.as_slice())
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// Order totals summary for the order screen and documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub gross: Money,
    pub discount: Money,
    pub net: Money,
}

impl From<&[OrderItem]> for OrderTotals {
    fn from(items: &[OrderItem]) -> Self {
        OrderTotals {
            item_count: items.len(),
            total_quantity: items.iter().fold(0, |acc: i64, i| acc.saturating_add(i.quantity)),
            gross: items.iter().map(|i| i.gross).sum(),
            discount: items.iter().map(|i| i.discount).sum(),
            net: items.iter().map(|i| i.net).sum(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
