//! Volume stage
//!
//! Reference mass estimator: mask area times a per-class density, clamped to
//! a plausible single-item range. Items without a mask get the class's
//! typical unit mass.

use super::class_map;
use crate::types::{Detection, EnrichmentStage, StageError};
use async_trait::async_trait;

const MIN_MASS_GRAMS: f64 = 50.0;
const MAX_MASS_GRAMS: f64 = 250.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct DensityVolumeEstimator;

impl DensityVolumeEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn mass_for(food_class: Option<&str>, mask_area: Option<f64>) -> f64 {
        let profile = class_map::class_profile(food_class);
        match mask_area {
            Some(area) => (area / 1000.0 * profile.grams_per_kilopixel)
                .clamp(MIN_MASS_GRAMS, MAX_MASS_GRAMS)
                .round(),
            None => profile.typical_unit_grams,
        }
    }
}

#[async_trait]
impl EnrichmentStage for DensityVolumeEstimator {
    fn name(&self) -> &'static str {
        "volume"
    }

    fn status_message(&self) -> &'static str {
        "Volumetric pass: estimating material mass"
    }

    async fn enrich(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, StageError> {
        for detection in &mut detections {
            detection.mass_grams = Some(Self::mass_for(
                detection.food_class.as_deref(),
                detection.mask_area,
            ));
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_is_clamped() {
        assert_eq!(DensityVolumeEstimator::mass_for(Some("fruit"), Some(0.0)), 50.0);
        assert_eq!(DensityVolumeEstimator::mass_for(Some("protein"), Some(1e9)), 250.0);
        // 20_000 px * 6 g/kpx = 120 g
        assert_eq!(DensityVolumeEstimator::mass_for(Some("fruit"), Some(20_000.0)), 120.0);
    }

    #[test]
    fn test_missing_mask_uses_unit_mass() {
        assert_eq!(DensityVolumeEstimator::mass_for(Some("herb"), None), 20.0);
        assert_eq!(DensityVolumeEstimator::mass_for(None, None), 100.0);
    }
}
