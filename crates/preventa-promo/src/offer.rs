//! # Offer Model
//!
//! The canonical, fully-populated offer definition the engine evaluates.
//! Wire records (including the legacy nested-JSON shape) are turned into
//! these by [`crate::ingest`]; nothing downstream looks at wire shapes.
//!
//! ## Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OfferDef                                                               │
//! │  ├── id, name, status, priority, company                               │
//! │  ├── valid_from / valid_to  (inclusive calendar dates)                 │
//! │  ├── stackable_with_same_product                                       │
//! │  ├── scope: OfferScope       (allow-lists, empty = unrestricted)       │
//! │  └── terms: OfferTerms                                                 │
//! │       ├── Discount(DiscountConfig)   ← evaluated                       │
//! │       ├── Bonus(BonusConfig)         ← evaluated                       │
//! │       └── Combo | Kit | PriceList    ← resolved by their own pickers   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use preventa_core::{DiscountRate, Money};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Status
// =============================================================================

/// Lifecycle status of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    Active,
    Draft,
    Inactive,
    Closed,
    Expired,
    /// A status word the engine does not know; kept verbatim (folded) so a
    /// configured extra exclusion can still match it.
    Other(String),
}

impl OfferStatus {
    /// Parses a status word, case and diacritic insensitive.
    ///
    /// Unknown and empty words are not exclusions by themselves.
    pub fn parse(raw: &str) -> OfferStatus {
        let folded = crate::normalize::fold(raw);
        match folded.as_str() {
            "" | "ACTIVE" | "ACTIVA" | "ACTIVO" | "VIGENTE" => OfferStatus::Active,
            "DRAFT" | "BORRADOR" => OfferStatus::Draft,
            "INACTIVE" | "INACTIVA" | "INACTIVO" | "DISABLED" => OfferStatus::Inactive,
            "CLOSED" | "CERRADA" | "CERRADO" | "FINALIZADA" => OfferStatus::Closed,
            "EXPIRED" | "VENCIDA" | "VENCIDO" | "EXPIRADA" | "EXPIRADO" => OfferStatus::Expired,
            _ => OfferStatus::Other(folded),
        }
    }

    /// True for the statuses that always take an offer out of evaluation.
    pub fn is_excluded(&self) -> bool {
        matches!(
            self,
            OfferStatus::Draft | OfferStatus::Inactive | OfferStatus::Closed | OfferStatus::Expired
        )
    }
}

// =============================================================================
// Scope
// =============================================================================

/// Eligibility allow-lists. An empty list places no restriction on its
/// dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfferScope {
    // Customer side
    pub canales: Vec<String>,
    pub sub_canales: Vec<String>,
    pub codigos_cliente: Vec<String>,
    pub departamentos: Vec<String>,
    pub regiones: Vec<String>,
    pub vendedores: Vec<String>,

    // Product side
    pub codigos_producto: Vec<String>,
    pub codigos_proveedor: Vec<String>,
    pub codigos_familia: Vec<String>,
    pub codigos_subfamilia: Vec<String>,
    pub codigos_linea: Vec<String>,
}

impl OfferScope {
    /// True when no product-side dimension is constrained (open offer).
    pub fn is_product_open(&self) -> bool {
        self.codigos_producto.is_empty()
            && self.codigos_proveedor.is_empty()
            && self.codigos_familia.is_empty()
            && self.codigos_subfamilia.is_empty()
            && self.codigos_linea.is_empty()
    }

    /// True when no customer-side dimension is constrained.
    pub fn is_customer_open(&self) -> bool {
        self.canales.is_empty()
            && self.sub_canales.is_empty()
            && self.codigos_cliente.is_empty()
            && self.departamentos.is_empty()
            && self.regiones.is_empty()
            && self.vendedores.is_empty()
    }

    /// True when every dimension is unconstrained.
    pub fn is_empty(&self) -> bool {
        self.is_product_open() && self.is_customer_open()
    }
}

// =============================================================================
// Discount Terms
// =============================================================================

/// A quantity-bracketed discount rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    /// Inclusive lower bound.
    pub from: i64,
    /// Inclusive upper bound; `None` means "and above".
    pub to: Option<i64>,
    pub percent: DiscountRate,
    /// Fixed discount per unit.
    pub amount: Money,
}

impl DiscountTier {
    /// True when `quantity` falls inside `[from, to]`.
    pub fn contains(&self, quantity: i64) -> bool {
        quantity >= self.from && self.to.map_or(true, |to| quantity <= to)
    }
}

/// Configuration of a `discount` offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DiscountConfig {
    /// Flat percentage, used when there are no tiers.
    pub percent: DiscountRate,
    /// Flat fixed amount per unit, used when there are no tiers.
    pub amount: Money,
    /// Sorted by ascending `from`.
    pub tiers: Vec<DiscountTier>,
    /// Evaluate quantity per line instead of pooled across matched lines.
    pub per_line: bool,
}

// =============================================================================
// Bonus Terms
// =============================================================================

/// How bonus quantities are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BonusMode {
    /// Quantities of all matched lines are pooled.
    #[default]
    Acumulado,
    /// Each matched line is evaluated on its own.
    PorLinea,
}

/// What kind of product receives the free goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BonusTargetKind {
    /// The qualifying product itself.
    #[default]
    Same,
    /// A configured product.
    Sku,
    /// Some product of a configured line.
    Linea,
    /// Some product of a configured family.
    Familia,
}

/// Bonus target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BonusTarget {
    pub kind: BonusTargetKind,
    pub product_id: Option<String>,
    pub line_ids: Vec<String>,
    pub family_ids: Vec<String>,
    /// A person must pick the bonused product; never auto-resolve.
    pub requires_user_selection: bool,
}

/// Configuration of a `bonus` offer ("every N gives M").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BonusConfig {
    pub every_n: i64,
    pub gives_m: i64,
    pub mode: BonusMode,
    /// Cap on the number of "every N" triggers across the order.
    pub max_applications: Option<i64>,
    pub target: BonusTarget,
}

// =============================================================================
// Offer Terms
// =============================================================================

/// The benefit an offer grants. Exactly one per offer, matching its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum OfferTerms {
    Discount(DiscountConfig),
    Bonus(BonusConfig),
    Combo,
    Kit,
    PriceList,
}

impl OfferTerms {
    /// Wire name of the offer type.
    pub fn kind(&self) -> &'static str {
        match self {
            OfferTerms::Discount(_) => "discount",
            OfferTerms::Bonus(_) => "bonus",
            OfferTerms::Combo => "combo",
            OfferTerms::Kit => "kit",
            OfferTerms::PriceList => "pricelist",
        }
    }

    /// True for the types this engine evaluates.
    pub fn is_evaluated(&self) -> bool {
        matches!(self, OfferTerms::Discount(_) | OfferTerms::Bonus(_))
    }
}

// =============================================================================
// Offer Definition
// =============================================================================

/// A normalized promotional rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OfferDef {
    pub id: String,
    pub name: String,
    pub status: OfferStatus,
    #[ts(as = "Option<String>")]
    pub valid_from: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub valid_to: Option<NaiveDate>,
    /// Company the offer belongs to, when the back office set one.
    pub company: Option<String>,
    pub scope: OfferScope,
    pub stackable_with_same_product: bool,
    /// Tie-break weight; higher wins.
    pub priority: i32,
    pub terms: OfferTerms,
}

impl OfferDef {
    /// Discount configuration, if this is a discount offer.
    pub fn discount(&self) -> Option<&DiscountConfig> {
        match &self.terms {
            OfferTerms::Discount(config) => Some(config),
            _ => None,
        }
    }

    /// Bonus configuration, if this is a bonus offer.
    pub fn bonus(&self) -> Option<&BonusConfig> {
        match &self.terms {
            OfferTerms::Bonus(config) => Some(config),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_and_accent_insensitive() {
        assert_eq!(OfferStatus::parse("Inactiva"), OfferStatus::Inactive);
        assert_eq!(OfferStatus::parse("BORRADOR"), OfferStatus::Draft);
        assert_eq!(OfferStatus::parse(" closed "), OfferStatus::Closed);
        assert_eq!(OfferStatus::parse("Expirada"), OfferStatus::Expired);
        assert_eq!(OfferStatus::parse(""), OfferStatus::Active);
        assert_eq!(
            OfferStatus::parse("Suspendída"),
            OfferStatus::Other("SUSPENDIDA".to_string())
        );
    }

    #[test]
    fn test_excluded_statuses() {
        assert!(!OfferStatus::Active.is_excluded());
        assert!(OfferStatus::Expired.is_excluded());
        assert!(!OfferStatus::Other("PUBLICADA".to_string()).is_excluded());
    }

    #[test]
    fn test_tier_contains() {
        let tier = DiscountTier {
            from: 12,
            to: Some(23),
            percent: DiscountRate::from_bps(500),
            amount: Money::zero(),
        };
        assert!(tier.contains(12));
        assert!(tier.contains(23));
        assert!(!tier.contains(24));

        let open = DiscountTier { to: None, ..tier };
        assert!(open.contains(10_000));
    }

    #[test]
    fn test_scope_openness() {
        let mut scope = OfferScope::default();
        assert!(scope.is_empty());
        scope.canales.push("02".to_string());
        assert!(scope.is_product_open());
        assert!(!scope.is_customer_open());
    }
}
