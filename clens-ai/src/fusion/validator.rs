//! Validator and sanity gate
//!
//! Cross-checks the ingredients a protocol claims to use against the
//! perceived inventory. Names from the two sources are only ever compared
//! through `normalize_name`.

use clens_common::models::{Ingredient, NeuralProtocol};
use std::collections::HashSet;
use tracing::warn;

/// Normalize an ingredient name for cross-source comparison
///
/// Lower-cases, trims, and strips one plural suffix: "oes" becomes "o"
/// ("Tomatoes" → "tomato"), otherwise a trailing "s" is dropped when it
/// follows a letter other than "s" ("eggs" → "egg", "glass" stays "glass").
/// Neither rule leaves a string the rules apply to again, so the function is
/// idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.trim().to_lowercase();

    if normalized.ends_with("oes") {
        normalized.truncate(normalized.len() - 2);
        return normalized;
    }

    let mut tail = normalized.chars().rev();
    if let (Some('s'), Some(prev)) = (tail.next(), tail.next()) {
        if prev.is_alphabetic() && prev != 's' {
            normalized.pop();
        }
    }

    normalized
}

/// Result of validating a protocol's claimed ingredients
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Claims confirmed by the inventory, in protocol order
    pub validated_used: Vec<String>,
    /// Claims with no inventory match, in protocol order
    pub identified_hallucinations: Vec<String>,
}

impl ValidationOutcome {
    pub fn hallucination_count(&self) -> usize {
        self.identified_hallucinations.len()
    }
}

/// Partition `protocol.ingredients_used` into confirmed and hallucinated names
pub fn validate_ingredients<'a, I>(inventory: I, protocol: &NeuralProtocol) -> ValidationOutcome
where
    I: IntoIterator<Item = &'a Ingredient>,
{
    let known: HashSet<String> = inventory
        .into_iter()
        .map(|i| normalize_name(&i.name))
        .collect();

    let mut outcome = ValidationOutcome::default();
    for claimed in &protocol.ingredients_used {
        if known.contains(&normalize_name(claimed)) {
            outcome.validated_used.push(claimed.clone());
        } else {
            warn!(
                protocol_id = %protocol.id,
                ingredient = %claimed,
                "Protocol references an unobserved ingredient, moving to missing requirements"
            );
            outcome.identified_hallucinations.push(claimed.clone());
        }
    }

    outcome
}

/// True iff every ingredient has positive mass and non-negative vitality
pub fn is_sane(inventory: &[Ingredient]) -> bool {
    inventory
        .iter()
        .all(|i| i.mass_grams > 0.0 && i.vitality_score >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::test_support::{ingredient, protocol};

    #[test]
    fn test_normalize_basics() {
        assert_eq!(normalize_name("  Tomatoes "), "tomato");
        assert_eq!(normalize_name("Potatoes"), "potato");
        assert_eq!(normalize_name("Tomato"), "tomato");
        assert_eq!(normalize_name("Eggs"), "egg");
        assert_eq!(normalize_name("Egg"), "egg");
        assert_eq!(normalize_name("glass"), "glass");
        assert_eq!(normalize_name("s"), "s");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "Tomatoes", "glass", "abs s", "Basil", "  OLIVES  ", "ss", "s", "bus", "Chives",
            "lentils ", "x s", "ÉCHALOTES", "oes", "Mangoes", "",
        ];
        for sample in samples {
            let once = normalize_name(sample);
            assert_eq!(normalize_name(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_tomato_basil_scenario() {
        let inventory = vec![ingredient("Tomato", 150.0, 80.0)];
        let protocol = protocol(&["Tomatoes", "Basil"], &[]);

        let outcome = validate_ingredients(&inventory, &protocol);
        assert_eq!(outcome.validated_used, vec!["Tomatoes"]);
        assert_eq!(outcome.identified_hallucinations, vec!["Basil"]);
    }

    #[test]
    fn test_partition_law() {
        let inventory = vec![
            ingredient("Onion", 100.0, 70.0),
            ingredient("Garlic", 20.0, 90.0),
        ];
        let protocol = protocol(&["onions", "Garlic", "garlic ", "Saffron", "Onion", "Leeks"], &[]);

        let outcome = validate_ingredients(&inventory, &protocol);
        let validated: HashSet<_> = outcome.validated_used.iter().map(|n| normalize_name(n)).collect();
        let hallucinated: HashSet<_> = outcome
            .identified_hallucinations
            .iter()
            .map(|n| normalize_name(n))
            .collect();
        let claimed: HashSet<_> = protocol.ingredients_used.iter().map(|n| normalize_name(n)).collect();

        assert!(validated.is_disjoint(&hallucinated));
        assert_eq!(&validated | &hallucinated, claimed);
        assert_eq!(outcome.validated_used, vec!["onions", "Garlic", "garlic ", "Onion"]);
    }

    #[test]
    fn test_sanity_gate() {
        assert!(is_sane(&[]));
        assert!(is_sane(&[ingredient("Pear", 10.0, 0.0)]));
        assert!(!is_sane(&[ingredient("Pear", 0.0, 50.0)]));
        assert!(!is_sane(&[ingredient("Pear", 10.0, -1.0)]));
        assert!(!is_sane(&[ingredient("Pear", f64::NAN, 50.0)]));
    }
}
