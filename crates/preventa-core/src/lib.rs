//! # preventa-core: Pure Domain Types for Preventa
//!
//! This crate holds the domain types shared by the route-sales order entry
//! host and the promotions engine. It contains no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Preventa Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Host app (order entry, offline cache)           │   │
//! │  │    Customer ──► Cart ──► Offer picker ──► Order document        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    preventa-promo (engine)                      │   │
//! │  │    ingest ─► match ─► resolve ─► apply                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ preventa-core (THIS CRATE) ★                    │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │ OrderItem │  │   Money   │  │ CoreError │  │   rules   │  │   │
//! │  │   │ Customer  │  │  (cents)  │  │           │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   plain data and arithmetic, nothing here reads the cache      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`]: catalog products, customers, orders and their lines
//! - [`money`]: cent amounts and half-up rate application
//! - [`error`]: refused order edits
//! - [`validation`]: limits on quantities, codes, rates and tiers
//!
//! ## Example Usage
//!
//! ```rust
//! use preventa_core::{DiscountRate, Money, OrderItem};
//!
//! let line = OrderItem::new("l1", "AGUA-500", 30, Money::from_cents(1000));
//! let discount = line.gross.apply_rate(DiscountRate::from_percentage(7.0));
//! let priced = line.with_discount(discount);
//!
//! assert_eq!(priced.net.cents(), 27900);
//! ```

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Order Limits
// =============================================================================

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against accidental over-ordering on the handheld (typing 1000 instead
/// of 10 cases).
pub const MAX_LINE_QUANTITY: i64 = 999;
