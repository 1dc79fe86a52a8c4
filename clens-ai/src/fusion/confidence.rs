//! Confidence calculator
//!
//! Composite trust score for a reconciled protocol, keyed on its two leading
//! ingredients. Deterministic for a given pair of names.

use super::normalize_name;
use clens_common::models::NeuralProtocol;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Score when fewer than two ingredients are used
pub const BASELINE_AFFINITY: u8 = 60;
/// Score when the secondary ingredient is a known pairing of the primary
pub const HIGH_AFFINITY: u8 = 92;
/// Score for any other pairing
pub const MODERATE_AFFINITY: u8 = 68;

const AFFINITY_PAIRS: &[(&str, &[&str])] = &[
    ("apple", &["cinnamon", "pork", "cheese", "walnut", "maple", "vanilla"]),
    ("pear", &["blue cheese", "chocolate", "red wine", "honey", "rosemary"]),
    ("spinach", &["nutmeg", "garlic", "lemon", "egg", "heavy cream", "pine nut"]),
    ("cheese", &["truffle", "honey", "fig", "pear", "white wine", "hazelnut"]),
    ("tomato", &["basil", "olive oil", "garlic", "mozzarella", "balsamic", "anchovy"]),
    ("garlic", &["onion", "olive oil", "thyme", "chicken", "parsley", "ginger"]),
    ("chicken", &["lemon", "rosemary", "garlic", "thyme", "white wine", "tarragon"]),
    ("mushroom", &["thyme", "garlic", "butter", "parsley", "soy sauce", "beef"]),
    ("lemon", &["honey", "mint", "garlic", "chicken", "fish", "ginger"]),
    ("thyme", &["garlic", "lemon", "chicken", "mushroom", "beef", "potato"]),
];

/// Normalized primary name → normalized pairings
static AFFINITY_MAP: Lazy<HashMap<String, Vec<String>>> = Lazy::new(|| {
    AFFINITY_PAIRS
        .iter()
        .map(|(primary, pairs)| {
            (
                normalize_name(primary),
                pairs.iter().map(|p| normalize_name(p)).collect(),
            )
        })
        .collect()
});

/// Affinity score (0-100) from the protocol's two leading ingredients
pub fn composite_affinity(protocol: &NeuralProtocol) -> u8 {
    let (primary, secondary) = match protocol.ingredients_used.as_slice() {
        [primary, secondary, ..] => (normalize_name(primary), normalize_name(secondary)),
        _ => return BASELINE_AFFINITY,
    };

    match AFFINITY_MAP.get(&primary) {
        Some(pairs) if pairs.contains(&secondary) => HIGH_AFFINITY,
        _ => MODERATE_AFFINITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::test_support::protocol;

    #[test]
    fn test_baseline_for_short_lists() {
        assert_eq!(composite_affinity(&protocol(&[], &[])), BASELINE_AFFINITY);
        assert_eq!(composite_affinity(&protocol(&["Tomato"], &[])), BASELINE_AFFINITY);
    }

    #[test]
    fn test_known_pairing() {
        assert_eq!(composite_affinity(&protocol(&["Tomatoes", "Basil"], &[])), HIGH_AFFINITY);
        assert_eq!(composite_affinity(&protocol(&["Garlic", "Onions", "Salt"], &[])), HIGH_AFFINITY);
    }

    #[test]
    fn test_unknown_pairing() {
        assert_eq!(composite_affinity(&protocol(&["Basil", "Tomato"], &[])), MODERATE_AFFINITY);
        assert_eq!(composite_affinity(&protocol(&["Kale", "Rice"], &[])), MODERATE_AFFINITY);
    }
}
