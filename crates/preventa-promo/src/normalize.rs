//! Code normalization for allow-list comparisons.
//!
//! Channel, customer and product codes are typed by hand in the back office
//! and in the field, so the same code shows up as `"Mayorista"`,
//! `"MAYORISTA"`, `"07"` or `"7 – Mayorista"`. Everything that compares
//! codes goes through this module.
//!
//! ```text
//! "  Café – 007 "  ──fold──►  "CAFE – 007"
//!                  ──tokens─► { "CAFE – 007", "CAFE", "7" }
//! ```

use std::collections::BTreeSet;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const SEPARATORS: [char; 6] = ['-', '_', '/', '|', '\u{2013}', '\u{2014}'];

/// Uppercases, strips diacritics and trims.
pub fn fold(value: &str) -> String {
    value
        .trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}

/// Canonical comparison key for a whole code: folded, with numeric codes
/// stripped of leading zeros (`"007"` and `"7"` share the key `"7"`).
pub fn key(value: &str) -> String {
    numeric_canonical(&fold(value))
}

/// Every token a value can match on: the whole folded value plus each
/// separator-delimited piece, numeric pieces without leading zeros.
pub fn tokens(value: &str) -> BTreeSet<String> {
    let folded = fold(value);
    let mut out = BTreeSet::new();
    if folded.is_empty() {
        return out;
    }

    out.insert(numeric_canonical(&folded));
    for piece in folded.split(|c: char| SEPARATORS.contains(&c)) {
        let piece = piece.trim();
        if !piece.is_empty() {
            out.insert(numeric_canonical(piece));
        }
    }
    out
}

/// True when any token of any candidate value appears among the tokens of
/// the allow-list.
pub fn tokens_intersect(candidates: &[&str], allow_list: &[String]) -> bool {
    let allowed: BTreeSet<String> = allow_list.iter().flat_map(|v| tokens(v)).collect();
    candidates
        .iter()
        .flat_map(|c| tokens(c))
        .any(|t| allowed.contains(&t))
}

/// True when `value` has the same [`key`] as some entry of `allow_list`.
pub fn key_in(value: &str, allow_list: &[String]) -> bool {
    let wanted = key(value);
    !wanted.is_empty() && allow_list.iter().any(|v| key(v) == wanted)
}

fn numeric_canonical(token: &str) -> String {
    if !token.is_empty() && token.chars().all(|c| c.is_ascii_digit()) {
        let trimmed = token.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_fold_strips_accents_and_case() {
        assert_eq!(fold("  Región Andina "), "REGION ANDINA");
        assert_eq!(fold("añejo"), "ANEJO");
    }

    #[test]
    fn test_key_strips_leading_zeros() {
        assert_eq!(key("007"), "7");
        assert_eq!(key("000"), "0");
        assert_eq!(key("A007"), "A007");
    }

    #[test]
    fn test_tokens_split_on_separators() {
        let t = tokens("02 – Mayorista/Tradicional");
        assert!(t.contains("2"));
        assert!(t.contains("MAYORISTA"));
        assert!(t.contains("TRADICIONAL"));
        assert!(t.contains("02 – MAYORISTA/TRADICIONAL"));
        assert!(tokens("   ").is_empty());
    }

    #[test]
    fn test_numeric_codes_match_without_leading_zeros() {
        assert!(tokens_intersect(&["7"], &list(&["007"])));
        assert!(tokens_intersect(&["007"], &list(&["7"])));
        assert!(!tokens_intersect(&["70"], &list(&["007"])));
    }

    #[test]
    fn test_any_shared_token_matches() {
        assert!(tokens_intersect(&["MAY-01"], &list(&["may"])));
        assert!(tokens_intersect(&["Autoservicio"], &list(&["AUTOSERVICIO"])));
        assert!(!tokens_intersect(&[], &list(&["X"])));
    }

    #[test]
    fn test_key_in() {
        assert!(key_in("p-001", &list(&["P-001"])));
        assert!(key_in("0012", &list(&["12"])));
        assert!(!key_in("", &list(&[""])));
        assert!(!key_in("P-2", &list(&["P-20"])));
    }
}
