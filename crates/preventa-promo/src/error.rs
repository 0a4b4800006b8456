//! # Promotions Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Promotions Error Categories                         │
//! │                                                                         │
//! │  ┌─────────────────────────┐        ┌─────────────────────────────┐    │
//! │  │      IngestError        │        │        PromoError           │    │
//! │  │  (one offer rejected)   │        │  (caller-visible failures)  │    │
//! │  │                         │        │                             │    │
//! │  │  MissingId              │        │  InvalidConfig              │    │
//! │  │  UnknownType            │        │  ConfigLoadFailed / Save    │    │
//! │  │  MissingTerms           │        │  Io / Toml / Json           │    │
//! │  │  InvalidNumber          │        │  Core (cart edits)          │    │
//! │  │  InvalidDate            │        │                             │    │
//! │  │  InvalidTier            │        │                             │    │
//! │  └───────────┬─────────────┘        └─────────────────────────────┘    │
//! │              │                                                          │
//! │              ▼                                                          │
//! │  ingest_offers(): logged with warn!, offer dropped, evaluation goes on │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Evaluation (matching, calculating, applying) never fails: an offer that
//! can not be evaluated has no effect. `IngestError` exists so the reason an
//! offer was dropped is explicit and testable.

use preventa_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for fallible engine operations.
pub type PromoResult<T> = Result<T, PromoError>;

/// Reasons a wire offer record can not become an `OfferDef`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Record has no usable identifier.
    #[error("Offer record has no id")]
    MissingId,

    /// `type` is not one of discount, bonus, combo, kit, pricelist.
    #[error("Offer {offer_id}: unknown type '{value}'")]
    UnknownType { offer_id: String, value: String },

    /// Type says discount/bonus but the matching block is absent.
    #[error("Offer {offer_id}: type {kind} has no {kind} configuration")]
    MissingTerms { offer_id: String, kind: String },

    /// A numeric field holds something that is not a number.
    #[error("Offer {offer_id}: field {field} is not a valid number: {value}")]
    InvalidNumber {
        offer_id: String,
        field: String,
        value: String,
    },

    /// A date that is neither yyyy-mm-dd nor dd/mm/yyyy.
    #[error("Offer {offer_id}: field {field} is not a valid date: {value}")]
    InvalidDate {
        offer_id: String,
        field: String,
        value: String,
    },

    /// A tier or rate that fails domain validation.
    #[error("Offer {offer_id}: {reason}")]
    InvalidTier { offer_id: String, reason: String },
}

impl IngestError {
    pub(crate) fn invalid_tier(offer_id: &str, err: ValidationError) -> Self {
        IngestError::InvalidTier {
            offer_id: offer_id.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Engine error type for configuration and host-facing operations.
#[derive(Debug, Error)]
pub enum PromoError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// Offer record rejected.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Order edit refused by the domain rules.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// I/O error (config file, fixtures).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (fixtures, legacy payloads).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<toml::de::Error> for PromoError {
    fn from(err: toml::de::Error) -> Self {
        PromoError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for PromoError {
    fn from(err: toml::ser::Error) -> Self {
        PromoError::ConfigSaveFailed(err.to_string())
    }
}

impl From<ValidationError> for PromoError {
    fn from(err: ValidationError) -> Self {
        PromoError::Core(CoreError::Validation(err))
    }
}
