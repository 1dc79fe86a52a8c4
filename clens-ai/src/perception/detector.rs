//! Detection Stage and Hybrid Fallback Stage
//!
//! The detection stage runs the primary model against the registry's
//! aggregate DETECTION coverage and, when a sweep model is configured, adds a
//! secondary sweep over aggregate CLASSIFICATION coverage. The hybrid fallback
//! stage appends lower-confidence candidates from a secondary model after the
//! primary set; it never replaces what the primary pass found.

use crate::fusion::normalize_name;
use crate::registry::{ModelRegistry, ModelType};
use crate::types::{Detection, DetectionModel, ImagePayload, StageError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Primary detection with registry-driven coverage sweep
pub struct DetectionStage {
    primary: Arc<dyn DetectionModel>,
    sweep: Option<Arc<dyn DetectionModel>>,
    registry: Arc<ModelRegistry>,
    sweep_limit: usize,
    threshold_slack: f64,
}

impl DetectionStage {
    pub fn new(
        primary: Arc<dyn DetectionModel>,
        registry: Arc<ModelRegistry>,
        sweep_limit: usize,
        threshold_slack: f64,
    ) -> Self {
        Self {
            primary,
            sweep: None,
            registry,
            sweep_limit,
            threshold_slack,
        }
    }

    pub fn with_sweep(mut self, sweep: Arc<dyn DetectionModel>) -> Self {
        self.sweep = Some(sweep);
        self
    }

    /// Run the primary pass plus the coverage sweep
    ///
    /// Keeps only detections with `confidence >= threshold * threshold_slack`.
    pub async fn run(
        &self,
        image: &ImagePayload,
        threshold: f64,
    ) -> Result<Vec<Detection>, StageError> {
        let detection_coverage = self.registry.aggregate_coverage(ModelType::Detection);
        let mut combined = self
            .primary
            .detect(image, &detection_coverage, threshold)
            .await?;

        if let Some(sweep) = &self.sweep {
            let classification_coverage =
                self.registry.aggregate_coverage(ModelType::Classification);
            let mut sweep_hits = sweep
                .detect(image, &classification_coverage, threshold)
                .await?;

            // Strongest candidates first; stable so ties keep model order
            sweep_hits.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            sweep_hits.truncate(self.sweep_limit);
            combined.extend(sweep_hits);
        }

        let floor = threshold * self.threshold_slack;
        let raw_count = combined.len();
        combined.retain(|d| d.confidence >= floor);

        debug!(
            primary_model = self.primary.name(),
            models_active = self.registry.models_by_type(ModelType::Detection).len()
                + self.registry.models_by_type(ModelType::Classification).len(),
            raw = raw_count,
            kept = combined.len(),
            floor = floor,
            "Detection pass complete"
        );

        Ok(combined)
    }
}

/// Secondary lower-threshold pass that supplements a low-yield primary pass
pub struct HybridFallbackStage {
    model: Arc<dyn DetectionModel>,
    registry: Arc<ModelRegistry>,
    threshold_slack: f64,
}

impl HybridFallbackStage {
    pub fn new(
        model: Arc<dyn DetectionModel>,
        registry: Arc<ModelRegistry>,
        threshold_slack: f64,
    ) -> Self {
        Self {
            model,
            registry,
            threshold_slack,
        }
    }

    /// Append fallback candidates after `primary`
    ///
    /// Candidates whose label the primary pass already found are skipped.
    pub async fn run(
        &self,
        image: &ImagePayload,
        primary: Vec<Detection>,
        threshold: f64,
    ) -> Result<Vec<Detection>, StageError> {
        let mut vocabulary = self.registry.aggregate_coverage(ModelType::Detection);
        for label in self.registry.aggregate_coverage(ModelType::Classification) {
            if !vocabulary.contains(&label) {
                vocabulary.push(label);
            }
        }

        let candidates = self.model.detect(image, &vocabulary, threshold).await?;
        let floor = threshold * self.threshold_slack;
        let mut seen: HashSet<String> = primary.iter().map(|d| normalize_name(&d.label)).collect();

        let mut combined = primary;
        let before = combined.len();
        for candidate in candidates {
            if candidate.confidence >= floor && seen.insert(normalize_name(&candidate.label)) {
                combined.push(candidate);
            }
        }

        debug!(
            fallback_model = self.model.name(),
            appended = combined.len() - before,
            "Hybrid fallback pass complete"
        );

        Ok(combined)
    }
}

/// Detection model that returns a recorded detection set
///
/// Used to replay captured model output and in tests. The recording already
/// reflects the original model's vocabulary and threshold, so both arguments
/// are ignored.
#[derive(Debug, Clone)]
pub struct ReplayDetector {
    name: String,
    detections: Vec<Detection>,
}

impl ReplayDetector {
    pub fn new(name: impl Into<String>, detections: Vec<Detection>) -> Self {
        Self {
            name: name.into(),
            detections,
        }
    }

    /// Load a recording from JSON (an array of detections)
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, StageError> {
        let detections: Vec<Detection> = serde_json::from_str(json)
            .map_err(|e| StageError::Internal(format!("Invalid detection recording: {}", e)))?;
        Ok(Self::new(name, detections))
    }
}

#[async_trait]
impl DetectionModel for ReplayDetector {
    fn name(&self) -> &str {
        &self.name
    }

    async fn detect(
        &self,
        _image: &ImagePayload,
        _vocabulary: &[String],
        _threshold: f64,
    ) -> Result<Vec<Detection>, StageError> {
        Ok(self.detections.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================
