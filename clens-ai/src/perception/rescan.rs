//! Targeted rescan
//!
//! Confirms recall hypotheses from an external audit. Precision-biased: only
//! hypotheses strictly above the acceptance bar survive; the rest are dropped
//! without error.

use super::{class_map, display_name};
use clens_common::config::PerceptionSettings;
use clens_common::models::{Ingredient, Provenance, RecallHypothesis, RESCAN_CATEGORY};
use tracing::debug;

/// Scientific name stamped on rescanned items
pub const RESCAN_SCIENTIFIC_NAME: &str = "Inferred via Recall Audit";

const RESCAN_VITALITY: f64 = 85.0;
const RESCAN_EXPIRY_DAYS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetedRescan {
    acceptance: f64,
}

impl Default for TargetedRescan {
    fn default() -> Self {
        Self::from(&PerceptionSettings::default())
    }
}

impl From<&PerceptionSettings> for TargetedRescan {
    fn from(settings: &PerceptionSettings) -> Self {
        Self::new(settings.rescan_acceptance)
    }
}

impl TargetedRescan {
    pub fn new(acceptance: f64) -> Self {
        Self { acceptance }
    }

    pub fn acceptance(&self) -> f64 {
        self.acceptance
    }

    /// Ingredients for every hypothesis whose confidence exceeds the bar
    pub fn rescan(&self, hypotheses: &[RecallHypothesis]) -> Vec<Ingredient> {
        let accepted: Vec<Ingredient> = hypotheses
            .iter()
            .filter(|h| h.confidence > self.acceptance)
            .map(|h| {
                let class = class_map::food_class(&h.name);
                Ingredient {
                    id: Ingredient::new_id(),
                    name: display_name(&h.name),
                    scientific_name: RESCAN_SCIENTIFIC_NAME.to_string(),
                    category: RESCAN_CATEGORY.to_string(),
                    mass_grams: class_map::class_profile(class).typical_unit_grams,
                    vitality_score: RESCAN_VITALITY,
                    expires_in_days: RESCAN_EXPIRY_DAYS,
                    confidence: h.confidence,
                    verification_status: None,
                    provenance: Provenance::Rescan,
                }
            })
            .collect();

        debug!(
            hypotheses = hypotheses.len(),
            accepted = accepted.len(),
            acceptance = self.acceptance,
            "Targeted rescan complete"
        );

        accepted
    }
}
