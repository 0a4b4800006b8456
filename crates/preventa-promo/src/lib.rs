//! # preventa-promo: Promotions Engine for Preventa
//!
//! Decides which offers an order qualifies for and prices the cart with the
//! offers the seller picked. Everything runs in-process, synchronously and
//! offline; identical inputs always give identical outputs.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Promotions Pipeline                              │
//! │                                                                         │
//! │  offer records (catalog cache, some legacy)                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ingest::ingest_offers ──► Vec<OfferDef>   (bad records logged, dropped)│
//! │        │                                                                │
//! │        ▼                                                                │
//! │  matcher::find_applicable_offers ──► Vec<ApplicableOffer>               │
//! │        │   scope (dates, status, company, customer, lines)              │
//! │        │   discount / bonus calculators                                 │
//! │        ▼                                                                │
//! │  stacking::resolve ──► offers that survive same-product conflicts       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  applicator::toggle / recompute ──► PricedCart                          │
//! │                                                                         │
//! │  session::OrderSession wraps the last two steps for the order screen.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`offer`] - Canonical offer model
//! - [`ingest`] - Wire and legacy records into [`OfferDef`]
//! - [`normalize`] - Code folding and token matching
//! - [`catalog`] - Product lookup
//! - [`scope`] - Liveness, company, customer and line scope checks
//! - [`discount`] / [`bonus`] - Benefit calculators
//! - [`matcher`] - Eligible offers for an order
//! - [`stacking`] - Same-product conflict resolution
//! - [`applicator`] - Toggle and recompute
//! - [`session`] - Order session with change detection
//! - [`config`] - TOML configuration
//! - [`error`] - Error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use preventa_core::{Customer, Money, Order, OrderItem, Product};
//! use preventa_promo::{ingest_values, EngineConfig, OfferContext, OrderSession, ProductCatalog};
//! use serde_json::json;
//!
//! let config = EngineConfig::default();
//! let offers = ingest_values(
//!     &[json!({
//!         "id": "VOL-1",
//!         "type": "discount",
//!         "discount": { "tiers": [{ "from": 24, "to": 47, "percent": 7 }] }
//!     })],
//!     &config.offers,
//! );
//! let catalog = ProductCatalog::new(vec![Product {
//!     id: "AGUA-500".into(),
//!     code: "AGUA-500".into(),
//!     price: Money::from_cents(1000),
//!     ..Default::default()
//! }]);
//! let customer = Customer { code: Some("C-1".into()), ..Default::default() };
//! let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
//! let ctx = OfferContext::new(Some(&customer), &catalog, &offers, today, &config);
//!
//! let mut session = OrderSession::new(Order::default());
//! session.add_product("AGUA-500", 30, &ctx).unwrap();
//! session.toggle_offer("VOL-1", &ctx);
//!
//! assert_eq!(session.totals().discount, Money::from_cents(2100));
//! ```

pub mod applicator;
pub mod bonus;
pub mod catalog;
pub mod config;
pub mod discount;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod normalize;
pub mod offer;
pub mod scope;
pub mod session;
pub mod stacking;

#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use applicator::{
    offers_changed, pricing_changed, recompute, strip_to_gross, toggle, BonusLine, PricedCart,
    ToggleOutcome, ToggleResult,
};
pub use bonus::{BonusApplication, BonusOutcome};
pub use catalog::ProductCatalog;
pub use config::EngineConfig;
pub use error::{IngestError, PromoError, PromoResult};
pub use ingest::{ingest_offers, ingest_values, OfferRecord, OfferShape};
pub use matcher::{find_applicable_offers, ApplicableOffer, OfferContext};
pub use offer::{OfferDef, OfferScope, OfferStatus, OfferTerms};
pub use session::OrderSession;
pub use stacking::resolve;
