//! Freshness stage
//!
//! Reference vitality estimator. Vitality scales with detection confidence
//! into the 50-100 band; expiry scales the class shelf life by vitality and
//! never drops below one day.

use super::class_map;
use crate::types::{Detection, EnrichmentStage, StageError};
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShelfLifeFreshness;

impl ShelfLifeFreshness {
    pub fn new() -> Self {
        Self
    }

    pub fn vitality_for(confidence: f64) -> f64 {
        (50.0 + 50.0 * confidence.clamp(0.0, 1.0)).round()
    }

    pub fn expiry_for(food_class: Option<&str>, vitality: f64) -> i32 {
        let shelf_life = class_map::class_profile(food_class).shelf_life_days;
        ((shelf_life * vitality / 100.0).round() as i32).max(1)
    }
}

#[async_trait]
impl EnrichmentStage for ShelfLifeFreshness {
    fn name(&self) -> &'static str {
        "freshness"
    }

    fn status_message(&self) -> &'static str {
        "Vitality sweep: estimating biological freshness"
    }

    async fn enrich(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, StageError> {
        for detection in &mut detections {
            let vitality = Self::vitality_for(detection.confidence);
            detection.vitality = Some(vitality);
            detection.expires_in_days =
                Some(Self::expiry_for(detection.food_class.as_deref(), vitality));
        }
        Ok(detections)
    }
}
