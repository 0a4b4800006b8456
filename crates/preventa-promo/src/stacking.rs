//! # Stacking Resolution
//!
//! Some offers refuse to share a product with any other offer
//! (`stackable_with_same_product = false`). When such an offer meets another
//! one on a product, only the better of them survives.
//!
//! ## Ranking
//! ```text
//! 1. higher potential_discount
//! 2. higher priority
//! 3. listed first in the offer catalog
//! ```
//!
//! ## Resolution
//! ```text
//! offers sorted best first
//!      │
//!      ▼
//! for each offer:
//!   conflicts with an offer already kept?  → dropped (everywhere)
//!   otherwise                              → kept
//! ```
//!
//! A product touched only by stackable offers keeps all of them. A product
//! with a non-stackable offer ends up with a single kept offer, the best
//! one still standing. This is the set the applicator reaches when the
//! seller turns the same offers on best first: [`beats`] ranks both and
//! [`ApplicableOffer::conflicts_with`] decides the conflicts for both.

use std::cmp::Ordering;

use tracing::debug;

use crate::matcher::ApplicableOffer;

/// True when `challenger` outranks `incumbent`.
///
/// `challenger_listed_first` settles a full tie on discount and priority.
pub fn beats(
    challenger: &ApplicableOffer,
    incumbent: &ApplicableOffer,
    challenger_listed_first: bool,
) -> bool {
    let rank = |offer: &ApplicableOffer| (offer.potential_discount, offer.offer.priority);
    match rank(challenger).cmp(&rank(incumbent)) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => challenger_listed_first,
    }
}

/// Drops the offers that lose a same-product conflict.
///
/// Offers are visited best first; one that conflicts with an offer already
/// kept is dropped from the whole list, not just from the shared product.
/// Survivors keep their relative order.
pub fn resolve(applicable: Vec<ApplicableOffer>) -> Vec<ApplicableOffer> {
    let mut by_rank: Vec<usize> = (0..applicable.len()).collect();
    by_rank.sort_by(|&a, &b| {
        if a == b {
            Ordering::Equal
        } else if beats(&applicable[a], &applicable[b], a < b) {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    });

    let mut kept: Vec<usize> = Vec::with_capacity(applicable.len());
    for index in by_rank {
        let offer = &applicable[index];
        match kept.iter().find(|&&k| offer.conflicts_with(&applicable[k])) {
            Some(&winner) => debug!(
                dropped = offer.id(),
                kept = applicable[winner].id(),
                "Non-stackable conflict resolved"
            ),
            None => kept.push(index),
        }
    }
    kept.sort_unstable();

    applicable
        .into_iter()
        .enumerate()
        .filter(|(index, _)| kept.binary_search(index).is_ok())
        .map(|(_, offer)| offer)
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{applicable, item};

    fn ids(offers: &[ApplicableOffer]) -> Vec<&str> {
        offers.iter().map(|o| o.id()).collect()
    }

    #[test]
    fn test_best_non_stackable_wins_regardless_of_order() {
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", false, 5000, 5, p.clone());
        let b = applicable("B", false, 3000, 5, p);

        assert_eq!(ids(&resolve(vec![a.clone(), b.clone()])), vec!["A"]);
        assert_eq!(ids(&resolve(vec![b, a])), vec!["A"]);
    }

    #[test]
    fn test_stackable_offers_coexist() {
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", true, 5000, 5, p.clone());
        let b = applicable("B", true, 3000, 5, p);
        assert_eq!(ids(&resolve(vec![a, b])), vec!["A", "B"]);
    }

    #[test]
    fn test_one_non_stackable_member_is_enough() {
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", true, 5000, 5, p.clone());
        let b = applicable("B", false, 3000, 5, p);
        assert_eq!(ids(&resolve(vec![b, a])), vec!["A"]);
    }

    #[test]
    fn test_disjoint_products_do_not_conflict() {
        let a = applicable("A", false, 5000, 5, vec![item("i1", "P1", 1, 10000)]);
        let b = applicable("B", false, 3000, 5, vec![item("i2", "P2", 1, 10000)]);
        assert_eq!(ids(&resolve(vec![a, b])), vec!["A", "B"]);
    }

    #[test]
    fn test_priority_then_position_break_ties() {
        let p = vec![item("i1", "P", 1, 10000)];
        let low = applicable("LOW", false, 3000, 1, p.clone());
        let high = applicable("HIGH", false, 3000, 9, p.clone());
        assert_eq!(ids(&resolve(vec![low, high])), vec!["HIGH"]);

        let first = applicable("FIRST", false, 3000, 5, p.clone());
        let second = applicable("SECOND", false, 3000, 5, p);
        assert_eq!(ids(&resolve(vec![first, second])), vec!["FIRST"]);
    }

    #[test]
    fn test_loser_is_dropped_everywhere() {
        // B loses on P1 to A, so it also disappears from P2 where C lives
        let a = applicable("A", false, 5000, 5, vec![item("i1", "P1", 1, 10000)]);
        let b = applicable(
            "B",
            true,
            1000,
            5,
            vec![item("i1", "P1", 1, 10000), item("i2", "P2", 1, 10000)],
        );
        let c = applicable("C", true, 500, 5, vec![item("i2", "P2", 1, 10000)]);
        assert_eq!(ids(&resolve(vec![a, b, c])), vec!["A", "C"]);
    }

    #[test]
    fn test_stackable_pair_survives_a_weaker_exclusive_offer() {
        // C refuses to share P but loses to A, so it is the one that goes
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", true, 5000, 5, p.clone());
        let b = applicable("B", true, 3000, 5, p.clone());
        let c = applicable("C", false, 4000, 5, p);
        assert_eq!(ids(&resolve(vec![a, b, c])), vec!["A", "B"]);
    }

    #[test]
    fn test_stronger_exclusive_offer_takes_the_product() {
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", true, 3000, 5, p.clone());
        let b = applicable("B", true, 2000, 5, p.clone());
        let c = applicable("C", false, 4000, 5, p);
        assert_eq!(ids(&resolve(vec![a, b, c])), vec!["C"]);
    }

    #[test]
    fn test_beats_tie_break_flag() {
        let p = vec![item("i1", "P", 1, 10000)];
        let a = applicable("A", false, 3000, 5, p.clone());
        let b = applicable("B", false, 3000, 5, p);
        assert!(beats(&a, &b, true));
        assert!(!beats(&a, &b, false));
    }
}
