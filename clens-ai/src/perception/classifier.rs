//! Classification stage
//!
//! Reference classifier backed by the static food class map.

use super::class_map;
use crate::types::{Detection, EnrichmentStage, StageError};
use async_trait::async_trait;
use clens_common::models::UNKNOWN_SPECIES;

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxonomyClassifier;

impl TaxonomyClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EnrichmentStage for TaxonomyClassifier {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn status_message(&self) -> &'static str {
        "Taxonomy pass: aligning scientific classification"
    }

    async fn enrich(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, StageError> {
        for detection in &mut detections {
            detection.scientific_name = Some(
                class_map::scientific_name(&detection.label)
                    .unwrap_or(UNKNOWN_SPECIES)
                    .to_string(),
            );
            detection.food_class = class_map::food_class(&detection.label).map(str::to_string);
        }
        Ok(detections)
    }
}
