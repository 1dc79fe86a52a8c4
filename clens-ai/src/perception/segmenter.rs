//! Segmentation stage
//!
//! Reference segmenter: approximates the object mask as the ellipse inscribed
//! in the detection's bounding box.

use crate::types::{Detection, EnrichmentStage, StageError};
use async_trait::async_trait;
use std::f64::consts::FRAC_PI_4;

#[derive(Debug, Clone, Copy, Default)]
pub struct BoxAreaSegmenter;

impl BoxAreaSegmenter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EnrichmentStage for BoxAreaSegmenter {
    fn name(&self) -> &'static str {
        "segmentation"
    }

    fn status_message(&self) -> &'static str {
        "Segmentation: refining structural boundaries"
    }

    async fn enrich(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, StageError> {
        for detection in &mut detections {
            detection.mask_area = Some(detection.bbox.area() * FRAC_PI_4);
        }
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    #[tokio::test]
    async fn test_mask_area_is_inscribed_ellipse() {
        let input = vec![Detection::new("pear", BoundingBox::new(0.0, 0.0, 200.0, 100.0), 0.9, "m")];
        let out = BoxAreaSegmenter::new().enrich(input).await.unwrap();
        let area = out[0].mask_area.unwrap();
        assert!((area - 20_000.0 * FRAC_PI_4).abs() < 1e-9);
    }
}
