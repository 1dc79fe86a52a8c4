//! Shared data model
//!
//! Ingredients are produced by the perception pipeline (or a targeted rescan);
//! protocols are produced by a reasoning engine and reconciled by the fusion
//! layer. Field names on the wire follow the reasoning engine's JSON shape, so
//! a few fields are renamed to camelCase.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vitality below this value is a spoilage-risk signal
pub const SPOILAGE_RISK_VITALITY: f64 = 50.0;

/// Vitality below this value is flagged as visibly low
pub const LOW_VITALITY: f64 = 40.0;

/// Items expiring within this many days are urgent
pub const URGENT_EXPIRY_DAYS: i32 = 2;

/// Provenance tag for items found by the primary perception pass
pub const PERCEPTION_CATEGORY: &str = "Perception-Identified";

/// Provenance tag for items confirmed by a targeted rescan
pub const RESCAN_CATEGORY: &str = "Rescan-Confirmed";

/// Scientific name used when no taxonomy mapping exists
pub const UNKNOWN_SPECIES: &str = "Unknown Species";

// ============================================================================
// Ingredient
// ============================================================================

/// Which pipeline produced an ingredient
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Primary perception pipeline
    #[default]
    Perception,
    /// Targeted rescan of recall hypotheses
    Rescan,
}

/// User adjudication of a perceived ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Confirmed,
    /// Excluded from all fusion logic; the record itself is kept
    Dismissed,
}

/// A single physically observed item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Opaque identifier, unique within a perception run
    pub id: String,
    /// Display name (capitalized)
    pub name: String,
    #[serde(rename = "scientificName", default = "unknown_species")]
    pub scientific_name: String,
    /// Coarse food class, or a provenance tag when no class is known
    pub category: String,
    pub mass_grams: f64,
    /// Freshness estimate, 0-100
    pub vitality_score: f64,
    pub expires_in_days: i32,
    /// Detection/classification confidence, 0-1
    pub confidence: f64,
    #[serde(
        rename = "verificationStatus",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub verification_status: Option<VerificationStatus>,
    #[serde(default)]
    pub provenance: Provenance,
}

fn unknown_species() -> String {
    UNKNOWN_SPECIES.to_string()
}

impl Ingredient {
    /// Generate a fresh ingredient identifier
    pub fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn is_dismissed(&self) -> bool {
        self.verification_status == Some(VerificationStatus::Dismissed)
    }

    pub fn is_spoilage_risk(&self) -> bool {
        self.vitality_score < SPOILAGE_RISK_VITALITY
    }

    pub fn is_low_vitality(&self) -> bool {
        self.vitality_score < LOW_VITALITY
    }

    pub fn is_urgent(&self) -> bool {
        self.expires_in_days <= URGENT_EXPIRY_DAYS
    }
}

/// Candidate ingredient proposed by an external recall audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallHypothesis {
    pub name: String,
    pub confidence: f64,
}

// ============================================================================
// Protocol
// ============================================================================

/// One ordered step of a protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolStep {
    pub order: u32,
    pub instruction: String,
    pub technique: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer_seconds: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Environmental impact of cooking an ingredient set instead of wasting it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactMetrics {
    #[serde(rename = "co2SavedKg")]
    pub co2_saved_kg: f64,
    #[serde(rename = "waterSavedLitres")]
    pub water_saved_litres: u64,
    #[serde(rename = "wasteAvoidedGrams")]
    pub waste_avoided_grams: f64,
}

/// Risk that a protocol depends on ingredients the user does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubstitutionRisk {
    Safe,
    Experimental,
    Risky,
}

impl std::fmt::Display for SubstitutionRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubstitutionRisk::Safe => write!(f, "SAFE"),
            SubstitutionRisk::Experimental => write!(f, "EXPERIMENTAL"),
            SubstitutionRisk::Risky => write!(f, "RISKY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrinkPairing {
    pub name: String,
    pub description: String,
}

/// A generated cooking plan
///
/// `molecular_affinity`, `impact_metrics` and `substitution_risk` are only
/// ever written by the fusion layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralProtocol {
    pub id: String,
    pub title: String,
    pub description: String,
    pub complexity: String,
    pub duration_minutes: u32,
    /// Ingredient names as claimed by the generating engine (unverified)
    pub ingredients_used: Vec<String>,
    #[serde(default)]
    pub missing_ingredients: Vec<String>,
    pub instructions: Vec<ProtocolStep>,
    #[serde(default)]
    pub nutrition: Nutrition,
    #[serde(
        rename = "molecularAffinity",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub molecular_affinity: Option<u8>,
    #[serde(
        rename = "impactMetrics",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub impact_metrics: Option<ImpactMetrics>,
    #[serde(
        rename = "substitutionRisk",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub substitution_risk: Option<SubstitutionRisk>,
    #[serde(rename = "platingTips", default, skip_serializing_if = "Vec::is_empty")]
    pub plating_tips: Vec<String>,
    #[serde(
        rename = "drinkPairing",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub drink_pairing: Option<DrinkPairing>,
    #[serde(rename = "isOffline", default)]
    pub is_offline: bool,
    /// Set by the fusion layer; never read from or written to the wire
    #[serde(skip)]
    pub fusion_applied: bool,
}

impl NeuralProtocol {
    /// True if this protocol was produced by a fusion pass in this process
    ///
    /// Fusion fields arriving over the wire do not count.
    pub fn is_fused(&self) -> bool {
        self.fusion_applied
    }

    /// Drop fusion-only fields supplied by an untrusted generator
    ///
    /// Returns true if any were present.
    pub fn clear_fusion_output(&mut self) -> bool {
        let present = self.molecular_affinity.is_some()
            || self.impact_metrics.is_some()
            || self.substitution_risk.is_some();

        self.molecular_affinity = None;
        self.impact_metrics = None;
        self.substitution_risk = None;
        self.fusion_applied = false;
        present
    }
}

// ============================================================================
// Reasoning engine request
// ============================================================================

/// User preferences forwarded to the reasoning engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Dietary anchor, e.g. "vegetarian"
    #[serde(default)]
    pub dietary_anchor: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    /// Feature flags understood by the engine
    #[serde(default)]
    pub features: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ingredient() -> Ingredient {
        Ingredient {
            id: Ingredient::new_id(),
            name: "Tomato".to_string(),
            scientific_name: "Solanum lycopersicum".to_string(),
            category: "vegetable".to_string(),
            mass_grams: 150.0,
            vitality_score: 45.0,
            expires_in_days: 2,
            confidence: 0.85,
            verification_status: None,
            provenance: Provenance::Perception,
        }
    }

    #[test]
    fn test_vitality_flags() {
        let mut ing = sample_ingredient();
        assert!(ing.is_spoilage_risk());
        assert!(!ing.is_low_vitality());
        assert!(ing.is_urgent());

        ing.vitality_score = 39.0;
        assert!(ing.is_low_vitality());

        ing.vitality_score = 50.0;
        ing.expires_in_days = 3;
        assert!(!ing.is_spoilage_risk());
        assert!(!ing.is_urgent());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Ingredient::new_id(), Ingredient::new_id());
    }

    #[test]
    fn test_ingredient_wire_names() {
        let mut ing = sample_ingredient();
        ing.verification_status = Some(VerificationStatus::Dismissed);
        let json = serde_json::to_value(&ing).unwrap();
        assert_eq!(json["scientificName"], "Solanum lycopersicum");
        assert_eq!(json["verificationStatus"], "dismissed");
        assert!(ing.is_dismissed());
    }

    #[test]
    fn test_ingredient_defaults_on_deserialize() {
        let ing: Ingredient = serde_json::from_str(
            r#"{"id":"a","name":"Basil","category":"herb","mass_grams":10,
                "vitality_score":90,"expires_in_days":4,"confidence":0.7}"#,
        )
        .unwrap();
        assert_eq!(ing.scientific_name, UNKNOWN_SPECIES);
        assert_eq!(ing.provenance, Provenance::Perception);
        assert!(ing.verification_status.is_none());
    }

    #[test]
    fn test_protocol_without_fusion_fields() {
        let protocol: NeuralProtocol = serde_json::from_str(
            r#"{"id":"p1","title":"Salad","description":"d","complexity":"Low",
                "duration_minutes":10,"ingredients_used":["Tomato"],
                "instructions":[{"order":1,"instruction":"Slice tomato","technique":"Cut"}]}"#,
        )
        .unwrap();
        assert!(!protocol.is_fused());
        assert!(protocol.missing_ingredients.is_empty());

        let json = serde_json::to_value(&protocol).unwrap();
        assert!(json.get("molecularAffinity").is_none());
        assert!(json.get("substitutionRisk").is_none());
    }

    #[test]
    fn test_wire_fusion_fields_are_not_trusted() {
        let mut protocol: NeuralProtocol = serde_json::from_str(
            r#"{"id":"p2","title":"Salad","description":"d","complexity":"Low",
                "duration_minutes":10,"ingredients_used":["Tomato","Saffron"],
                "instructions":[],"molecularAffinity":99,"substitutionRisk":"SAFE",
                "impactMetrics":{"co2SavedKg":1.0,"waterSavedLitres":5,"wasteAvoidedGrams":10.0}}"#,
        )
        .unwrap();
        assert!(!protocol.is_fused());

        assert!(protocol.clear_fusion_output());
        assert!(protocol.molecular_affinity.is_none());
        assert!(protocol.impact_metrics.is_none());
        assert!(protocol.substitution_risk.is_none());
        assert!(!protocol.clear_fusion_output());
    }

    #[test]
    fn test_substitution_risk_wire_format() {
        assert_eq!(
            serde_json::to_string(&SubstitutionRisk::Experimental).unwrap(),
            "\"EXPERIMENTAL\""
        );
        assert_eq!(SubstitutionRisk::Risky.to_string(), "RISKY");
    }
}
