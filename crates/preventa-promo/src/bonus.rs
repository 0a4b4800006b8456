//! # Bonus Calculator
//!
//! "Every N gives M": free goods earned by the matched lines of a `bonus`
//! offer.
//!
//! ## Counting Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ACUMULADO (pooled)                 POR LINEA (per line)                │
//! │  ──────────────────                 ────────────────────                │
//! │  Σ qty = 15 + 15 = 30               line 1: 15 / 12 = 1                 │
//! │  30 / 12 = 2 applications           line 2: 15 / 12 = 1                 │
//! │  one application record             one record per earning line         │
//! │  for all contributing lines         cap budget spent in line order      │
//! │                                                                         │
//! │  bonus_qty = applications × gives_m                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Target Resolution
//! ```text
//! same     → the qualifying product
//! sku      → the configured product, or ask the seller if none is set
//! linea    → requires_user_selection? ask the seller
//! familia  → otherwise: the qualifying product if it belongs,
//!            else the first catalog product that belongs,
//!            else the qualifying product
//! ```

use preventa_core::{OrderItem, Product};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::catalog::ProductCatalog;
use crate::normalize::key_in;
use crate::offer::{BonusConfig, BonusMode, BonusTarget, BonusTargetKind};

/// Free goods earned by one group of qualifying lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BonusApplication {
    pub source_item_ids: Vec<String>,
    /// Number of "every N" triggers.
    pub applications: i64,
    pub bonus_qty: i64,
    /// Product to hand out; `None` when a person has to choose.
    pub target_product_id: Option<String>,
    pub requires_selection: bool,
}

/// Everything a bonus offer earns on an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BonusOutcome {
    pub total_bonus_qty: i64,
    pub applications: Vec<BonusApplication>,
}

impl BonusOutcome {
    /// Nothing earned: the offer is not eligible.
    pub fn is_empty(&self) -> bool {
        self.total_bonus_qty == 0
    }
}

/// Computes the bonus earned by `items` (the offer's matched lines).
pub fn calculate(config: &BonusConfig, items: &[OrderItem], catalog: &ProductCatalog) -> BonusOutcome {
    if config.every_n <= 0 || config.gives_m <= 0 {
        return BonusOutcome::default();
    }

    let contributing: Vec<&OrderItem> = items.iter().filter(|i| i.quantity > 0).collect();
    let mut budget = config.max_applications;
    let mut applications = Vec::new();

    match config.mode {
        BonusMode::PorLinea => {
            for &line in &contributing {
                let earned = spend(&mut budget, line.quantity / config.every_n);
                if earned > 0 {
                    applications.push(application(config, &[line], earned, catalog));
                }
            }
        }
        BonusMode::Acumulado => {
            let pooled = contributing
                .iter()
                .fold(0i64, |acc, line| acc.saturating_add(line.quantity));
            let earned = spend(&mut budget, pooled / config.every_n);
            if earned > 0 {
                applications.push(application(config, &contributing, earned, catalog));
            }
        }
    }

    BonusOutcome {
        total_bonus_qty: applications
            .iter()
            .fold(0, |acc: i64, a| acc.saturating_add(a.bonus_qty)),
        applications,
    }
}

/// Takes up to `wanted` applications out of the remaining cap.
fn spend(budget: &mut Option<i64>, wanted: i64) -> i64 {
    match budget {
        Some(remaining) => {
            let granted = wanted.min(*remaining).max(0);
            *remaining -= granted;
            granted
        }
        None => wanted,
    }
}

fn application(
    config: &BonusConfig,
    lines: &[&OrderItem],
    applications: i64,
    catalog: &ProductCatalog,
) -> BonusApplication {
    // Pooled groups take the first contributing line as the qualifying one
    let qualifying = lines.first().map(|line| line.product_id.as_str()).unwrap_or_default();
    let (target_product_id, requires_selection) = resolve_target(&config.target, qualifying, catalog);

    BonusApplication {
        source_item_ids: lines.iter().map(|line| line.id.clone()).collect(),
        applications,
        bonus_qty: applications.saturating_mul(config.gives_m),
        target_product_id,
        requires_selection,
    }
}

/// Resolves which product is handed out, or flags that someone must choose.
pub fn resolve_target(
    target: &BonusTarget,
    qualifying_product_id: &str,
    catalog: &ProductCatalog,
) -> (Option<String>, bool) {
    let same = || (Some(qualifying_product_id.to_string()), false);

    let belongs: fn(&Product, &BonusTarget) -> bool = match target.kind {
        BonusTargetKind::Same => return same(),
        BonusTargetKind::Sku => {
            return match target.product_id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => (Some(id.to_string()), false),
                _ => (None, true),
            }
        }
        BonusTargetKind::Linea => in_target_line,
        BonusTargetKind::Familia => in_target_family,
    };

    if target.requires_user_selection {
        return (None, true);
    }

    if catalog
        .get(qualifying_product_id)
        .map_or(false, |p| belongs(p, target))
    {
        return same();
    }

    match catalog.products().iter().find(|p| belongs(p, target)) {
        Some(p) => (Some(p.order_key().to_string()), false),
        None => same(),
    }
}

fn in_target_line(product: &Product, target: &BonusTarget) -> bool {
    product
        .line_code
        .as_deref()
        .map_or(false, |code| key_in(code, &target.line_ids))
}

fn in_target_family(product: &Product, target: &BonusTarget) -> bool {
    product
        .family_code
        .as_deref()
        .map_or(false, |code| key_in(code, &target.family_ids))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, list, product};

    fn every(n: i64, m: i64, mode: BonusMode) -> BonusConfig {
        BonusConfig {
            every_n: n,
            gives_m: m,
            mode,
            ..Default::default()
        }
    }

    #[test]
    fn test_pooled_bonus() {
        let items = vec![item("i1", "P1", 30, 1000)];
        let outcome = calculate(&every(12, 1, BonusMode::Acumulado), &items, &ProductCatalog::default());
        assert_eq!(outcome.total_bonus_qty, 2);
        assert_eq!(outcome.applications.len(), 1);
        assert_eq!(outcome.applications[0].target_product_id.as_deref(), Some("P1"));
    }

    #[test]
    fn test_pooled_bonus_attributes_all_lines() {
        let items = vec![item("i1", "P1", 15, 1000), item("i2", "P2", 15, 1000)];
        let outcome = calculate(&every(12, 2, BonusMode::Acumulado), &items, &ProductCatalog::default());
        assert_eq!(outcome.total_bonus_qty, 4);
        assert_eq!(outcome.applications[0].source_item_ids, list(&["i1", "i2"]));
    }

    #[test]
    fn test_per_line_bonus_with_cap() {
        let items = vec![
            item("i1", "P1", 15, 1000),
            item("i2", "P1", 15, 1000),
            item("i3", "P1", 30, 1000),
        ];
        let mut config = every(12, 1, BonusMode::PorLinea);
        config.max_applications = Some(2);

        let outcome = calculate(&config, &items[..2], &ProductCatalog::default());
        assert_eq!(outcome.total_bonus_qty, 2);
        assert_eq!(outcome.applications.len(), 2);

        let outcome = calculate(&config, &items[2..], &ProductCatalog::default());
        assert_eq!(outcome.total_bonus_qty, 2);

        let outcome = calculate(&config, &items, &ProductCatalog::default());
        assert_eq!(outcome.total_bonus_qty, 2);
        assert_eq!(outcome.applications.len(), 2);
    }

    #[test]
    fn test_huge_gives_m_saturates() {
        let items = vec![item("i1", "P1", 36, 1000), item("i2", "P2", 36, 1000)];
        let outcome = calculate(
            &every(12, i64::MAX / 2, BonusMode::PorLinea),
            &items,
            &ProductCatalog::default(),
        );
        assert_eq!(outcome.applications[0].bonus_qty, i64::MAX);
        assert_eq!(outcome.total_bonus_qty, i64::MAX);
    }

    #[test]
    fn test_invalid_terms_earn_nothing() {
        let items = vec![item("i1", "P1", 100, 1000)];
        assert!(calculate(&every(0, 1, BonusMode::Acumulado), &items, &ProductCatalog::default()).is_empty());
        assert!(calculate(&every(12, 0, BonusMode::Acumulado), &items, &ProductCatalog::default()).is_empty());
    }

    #[test]
    fn test_below_threshold_earns_nothing() {
        let items = vec![item("i1", "P1", 11, 1000)];
        assert!(calculate(&every(12, 1, BonusMode::PorLinea), &items, &ProductCatalog::default()).is_empty());
    }

    #[test]
    fn test_sku_target() {
        let target = BonusTarget {
            kind: BonusTargetKind::Sku,
            product_id: Some("MUESTRA".to_string()),
            ..Default::default()
        };
        let catalog = ProductCatalog::default();
        assert_eq!(resolve_target(&target, "P1", &catalog), (Some("MUESTRA".to_string()), false));

        let unset = BonusTarget {
            kind: BonusTargetKind::Sku,
            ..Default::default()
        };
        assert_eq!(resolve_target(&unset, "P1", &catalog), (None, true));
    }

    #[test]
    fn test_line_target_resolution() {
        let catalog = ProductCatalog::new(vec![
            product("P1", 1000, None, Some("L1")),
            product("P2", 1000, None, Some("L2")),
            product("P3", 1000, None, Some("L2")),
        ]);
        let target = BonusTarget {
            kind: BonusTargetKind::Linea,
            line_ids: list(&["L2"]),
            ..Default::default()
        };

        // Qualifying product belongs to the line
        assert_eq!(resolve_target(&target, "P3", &catalog).0.as_deref(), Some("P3"));
        // Otherwise the first catalog product of the line
        assert_eq!(resolve_target(&target, "P1", &catalog).0.as_deref(), Some("P2"));

        let nothing = BonusTarget {
            line_ids: list(&["L9"]),
            ..target.clone()
        };
        assert_eq!(resolve_target(&nothing, "P1", &catalog).0.as_deref(), Some("P1"));
    }

    #[test]
    fn test_family_target_requiring_selection() {
        let catalog = ProductCatalog::new(vec![product("P1", 1000, Some("F1"), None)]);
        let target = BonusTarget {
            kind: BonusTargetKind::Familia,
            family_ids: list(&["F1"]),
            requires_user_selection: true,
            ..Default::default()
        };
        assert_eq!(resolve_target(&target, "P1", &catalog), (None, true));
    }
}
