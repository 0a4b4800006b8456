//! # Validation
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart edits (OrderSession)                                              │
//! │    validate_product_code, validate_quantity, validate_order_size        │
//! │                                                                         │
//! │  Offer ingestion (preventa-promo)                                       │
//! │    validate_rate_bps      a single rate above 100% is malformed         │
//! │    validate_tier_bounds   `to` below `from` is malformed                │
//! │                                                                         │
//! │  Offer evaluation does not validate: whatever failed here was already  │
//! │  dropped at ingestion.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_PRODUCT_CODE_LEN: usize = 50;

/// A product code typed or scanned by the seller.
///
/// ```rust
/// use preventa_core::validation::validate_product_code;
///
/// assert!(validate_product_code("AGUA-500").is_ok());
/// assert!(validate_product_code("   ").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();
    if code.is_empty() {
        Err(ValidationError::Required {
            field: "product code".into(),
        })
    } else if code.chars().count() > MAX_PRODUCT_CODE_LEN {
        Err(ValidationError::TooLong {
            field: "product code".into(),
            max: MAX_PRODUCT_CODE_LEN,
        })
    } else {
        Ok(())
    }
}

/// Quantity of a single line: `1..=MAX_LINE_QUANTITY`.
///
/// ## User Workflow
/// ```text
/// Seller types 48 in the quantity field
///      │
///      ▼
/// validate_quantity(48) ← THIS FUNCTION
///      │
///      ├── qty <= 0?   → "quantity must be positive"
///      ├── qty > 999?  → "quantity must be between 1 and 999"
///      └── OK → strip discounts, edit, re-run applied offers
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    match qty {
        q if q <= 0 => Err(ValidationError::MustBePositive {
            field: "quantity".into(),
        }),
        q if q > MAX_LINE_QUANTITY => Err(ValidationError::OutOfRange {
            field: "quantity".into(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        }),
        _ => Ok(()),
    }
}

/// A single offer rate in basis points, at most 100%.
pub fn validate_rate_bps(field: &str, bps: u32) -> ValidationResult<()> {
    if bps <= 10_000 {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: 10_000,
    })
}

/// Quantity bounds of a discount tier. `to = None` means "and above".
///
/// ```rust
/// use preventa_core::validation::validate_tier_bounds;
///
/// assert!(validate_tier_bounds(12, Some(23)).is_ok());
/// assert!(validate_tier_bounds(48, None).is_ok());
/// assert!(validate_tier_bounds(24, Some(12)).is_err());
/// ```
pub fn validate_tier_bounds(from: i64, to: Option<i64>) -> ValidationResult<()> {
    if from < 0 {
        return Err(ValidationError::OutOfRange {
            field: "tier.from".into(),
            min: 0,
            max: i64::MAX,
        });
    }
    match to {
        Some(to) if to < from => Err(ValidationError::InvalidFormat {
            field: "tier.to".into(),
            reason: format!("upper bound {} is below lower bound {}", to, from),
        }),
        _ => Ok(()),
    }
}

/// Room for one more line in an order that has `current_lines`.
pub fn validate_order_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines < MAX_ORDER_LINES {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field: "order lines".into(),
        min: 0,
        max: MAX_ORDER_LINES as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_code_rules() {
        assert!(validate_product_code("7").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code(&"Ñ".repeat(50)).is_ok());
        assert!(validate_product_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_quantity_limits() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_LINE_QUANTITY).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_LINE_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_rate_ceiling_is_one_hundred_percent() {
        assert!(validate_rate_bps("discount.percent", 10_000).is_ok());
        assert!(validate_rate_bps("discount.percent", 10_001).is_err());
    }

    #[test]
    fn test_tier_bounds() {
        assert!(validate_tier_bounds(0, None).is_ok());
        assert!(validate_tier_bounds(5, Some(5)).is_ok());
        assert!(validate_tier_bounds(-1, None).is_err());
        assert!(matches!(
            validate_tier_bounds(10, Some(9)),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_order_size() {
        assert!(validate_order_size(MAX_ORDER_LINES - 1).is_ok());
        assert!(validate_order_size(MAX_ORDER_LINES).is_err());
    }
}
