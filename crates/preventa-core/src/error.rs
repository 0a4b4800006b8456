//! # Error Types
//!
//! What an order edit can be refused for.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ──► CoreError ──► PromoError (preventa-promo) ──► host │
//! │  (bad input)         (edit          (config, I/O,                       │
//! │                       refused)       rejected offer records)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Evaluating offers never fails; a malformed offer has no effect. Only the
//! edits a seller can get wrong (unknown product, stale line, absurd
//! quantity) come back as errors.

use thiserror::Error;

/// Refused order edits.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No catalog product has this id or code.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Line id not in the order.
    ///
    /// Usually a stale id: the line was removed on another screen or the
    /// order was reloaded from the cache.
    #[error("Order line not found: {0}")]
    ItemNotFound(String),

    #[error("An order holds at most {max} lines")]
    OrderTooLarge { max: usize },

    /// Merging into an existing line would pass the per-line limit.
    #[error("Line quantity {requested} is above the limit of {max}")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Field-level input errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Values that are individually fine but inconsistent together, such as
    /// a tier whose upper bound is below its lower bound.
    #[error("{field} is invalid: {reason}")]
    InvalidFormat { field: String, reason: String },
}

pub type CoreResult<T> = Result<T, CoreError>;
