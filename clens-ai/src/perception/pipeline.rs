//! Perception Pipeline Orchestrator
//!
//! Sequences the perception stages for one image and enforces a hard
//! wall-clock deadline on the whole pass.
//!
//! # Architecture
//! - **Detection**: primary pass at the baseline threshold (+ coverage sweep)
//! - **Hybrid fallback**: low-yield passes are supplemented at a lowered threshold
//! - **Enrichment**: segmentation → classification → freshness → volume, fixed order
//! - **Mapping**: enriched detections become `Ingredient` records with fresh ids
//!
//! # Deadline
//! The stage chain races a timer. If the timer (or a cancellation) wins, the
//! stage-chain future is dropped on the spot: nothing it produced is returned
//! or merged into a later result.
//!
//! # Example
//! ```rust,ignore
//! let pipeline = PerceptionPipeline::new(config, registry, Arc::new(detector))
//!     .with_fallback(Arc::new(fallback))
//!     .with_events(event_bus);
//! let inventory = pipeline.run(&image).await?;
//! ```

use super::{display_name, PerceptionError};
use super::{BoxAreaSegmenter, DensityVolumeEstimator, ShelfLifeFreshness, TaxonomyClassifier};
use super::{DetectionStage, HybridFallbackStage};
use crate::registry::ModelRegistry;
use crate::types::{Detection, DetectionModel, EnrichmentStage, ImagePayload, StageError};
use clens_common::config::PerceptionSettings;
use clens_common::events::{EventBus, PerceptionEvent};
use clens_common::models::{Ingredient, Provenance, PERCEPTION_CATEGORY, UNKNOWN_SPECIES};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Detection threshold for the primary pass
    pub baseline_threshold: f64,
    /// Threshold for the hybrid fallback pass
    pub fallback_threshold: f64,
    /// Primary yields below this trigger the fallback pass
    pub min_detections: usize,
    /// Budget for the whole scan
    pub deadline: Duration,
    /// Cap on registry coverage sweep candidates
    pub sweep_limit: usize,
    /// Detections kept if `confidence >= threshold * threshold_slack`
    pub threshold_slack: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&PerceptionSettings::default())
    }
}

impl From<&PerceptionSettings> for PipelineConfig {
    fn from(settings: &PerceptionSettings) -> Self {
        Self {
            baseline_threshold: settings.baseline_threshold,
            fallback_threshold: settings.fallback_threshold,
            min_detections: settings.min_detections,
            deadline: Duration::from_millis(settings.deadline_ms),
            sweep_limit: settings.sweep_limit,
            threshold_slack: settings.threshold_slack,
        }
    }
}

/// The four enrichment stages, run in field order
#[derive(Clone)]
pub struct EnrichmentStages {
    pub segmentation: Arc<dyn EnrichmentStage>,
    pub classification: Arc<dyn EnrichmentStage>,
    pub freshness: Arc<dyn EnrichmentStage>,
    pub volume: Arc<dyn EnrichmentStage>,
}

impl Default for EnrichmentStages {
    fn default() -> Self {
        Self {
            segmentation: Arc::new(BoxAreaSegmenter::new()),
            classification: Arc::new(TaxonomyClassifier::new()),
            freshness: Arc::new(ShelfLifeFreshness::new()),
            volume: Arc::new(DensityVolumeEstimator::new()),
        }
    }
}

impl EnrichmentStages {
    fn in_order(&self) -> [&Arc<dyn EnrichmentStage>; 4] {
        [
            &self.segmentation,
            &self.classification,
            &self.freshness,
            &self.volume,
        ]
    }
}

/// Perception orchestrator
pub struct PerceptionPipeline {
    config: PipelineConfig,
    registry: Arc<ModelRegistry>,
    detection: DetectionStage,
    fallback: Option<HybridFallbackStage>,
    stages: EnrichmentStages,
    event_bus: Option<EventBus>,
}

impl PerceptionPipeline {
    /// Create a pipeline around a primary detection model, with the reference
    /// enrichment stages
    pub fn new(
        config: PipelineConfig,
        registry: Arc<ModelRegistry>,
        primary: Arc<dyn DetectionModel>,
    ) -> Self {
        let detection = DetectionStage::new(
            primary,
            Arc::clone(&registry),
            config.sweep_limit,
            config.threshold_slack,
        );

        Self {
            config,
            registry,
            detection,
            fallback: None,
            stages: EnrichmentStages::default(),
            event_bus: None,
        }
    }

    /// Add a registry coverage sweep model to the detection stage
    pub fn with_sweep(mut self, sweep: Arc<dyn DetectionModel>) -> Self {
        self.detection = self.detection.with_sweep(sweep);
        self
    }

    /// Add the hybrid fallback model
    pub fn with_fallback(mut self, model: Arc<dyn DetectionModel>) -> Self {
        self.fallback = Some(HybridFallbackStage::new(
            model,
            Arc::clone(&self.registry),
            self.config.threshold_slack,
        ));
        self
    }

    /// Replace the enrichment stages
    pub fn with_stages(mut self, stages: EnrichmentStages) -> Self {
        self.stages = stages;
        self
    }

    /// Publish progress to an event bus
    pub fn with_events(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// Run a scan under the configured deadline
    pub async fn run(&self, image: &ImagePayload) -> Result<Vec<Ingredient>, PerceptionError> {
        self.run_with_cancel(image, &CancellationToken::new()).await
    }

    /// Run a scan under the configured deadline, abandoning it on cancellation
    ///
    /// # Errors
    /// - `Timeout` if the deadline elapses first (no partial results)
    /// - `Cancelled` if `cancel` fires first
    /// - `Stage` if a stage fails or breaks its contract
    pub async fn run_with_cancel(
        &self,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ingredient>, PerceptionError> {
        let scan_id = Uuid::new_v4();
        let started = Instant::now();
        let deadline_ms = self.config.deadline.as_millis() as u64;

        info!(scan_id = %scan_id, bytes = image.len(), "Perception scan started");
        self.emit(PerceptionEvent::ScanStarted {
            scan_id,
            timestamp: chrono::Utc::now(),
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(scan_id = %scan_id, "Perception scan cancelled");
                Err(PerceptionError::Cancelled)
            }
            result = tokio::time::timeout(self.config.deadline, self.run_stages(scan_id, image)) => {
                match result {
                    Ok(stages_result) => stages_result.map_err(PerceptionError::from),
                    Err(_) => {
                        warn!(scan_id = %scan_id, deadline_ms, "Perception scan timed out");
                        self.emit(PerceptionEvent::ScanTimedOut { scan_id, deadline_ms });
                        Err(PerceptionError::Timeout { deadline_ms })
                    }
                }
            }
        };

        if let Ok(ingredients) = &outcome {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            info!(
                scan_id = %scan_id,
                ingredients = ingredients.len(),
                elapsed_ms,
                "Perception scan complete"
            );
            self.emit(PerceptionEvent::ScanCompleted {
                scan_id,
                ingredient_count: ingredients.len(),
                elapsed_ms,
            });
        }

        outcome
    }

    /// Steps 1-4: detection, fallback, enrichment, mapping
    async fn run_stages(
        &self,
        scan_id: Uuid,
        image: &ImagePayload,
    ) -> Result<Vec<Ingredient>, StageError> {
        let mut threshold = self.config.baseline_threshold;

        self.emit_stage(scan_id, "detection", "Inference cycle: running primary detection pass");
        let mut detections = self.detection.run(image, threshold).await?;

        if detections.len() < self.config.min_detections {
            match &self.fallback {
                Some(fallback) => {
                    let primary_count = detections.len();
                    threshold = self.config.fallback_threshold;
                    debug!(
                        scan_id = %scan_id,
                        primary_count,
                        threshold,
                        "Low detection yield, lowering threshold"
                    );
                    self.emit(PerceptionEvent::FallbackTriggered {
                        scan_id,
                        primary_count,
                        threshold,
                    });
                    self.emit_stage(
                        scan_id,
                        "hybrid_fallback",
                        "Compensating for low yield: running hybrid fallback pass",
                    );
                    detections = fallback.run(image, detections, threshold).await?;
                }
                None => {
                    debug!(
                        scan_id = %scan_id,
                        count = detections.len(),
                        "Low detection yield but no fallback model configured"
                    );
                }
            }
        }

        for stage in self.stages.in_order() {
            self.emit_stage(scan_id, stage.name(), stage.status_message());
            detections = run_enrichment(stage.as_ref(), detections).await?;
        }

        detections.into_iter().map(into_ingredient).collect()
    }

    fn emit(&self, event: PerceptionEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event);
        }
    }

    fn emit_stage(&self, scan_id: Uuid, stage: &str, message: &str) {
        debug!(scan_id = %scan_id, stage, "{}", message);
        self.emit(PerceptionEvent::StageStarted {
            scan_id,
            stage: stage.to_string(),
            message: message.to_string(),
        });
    }
}

/// Run one enrichment stage and check it neither reordered nor dropped items
async fn run_enrichment(
    stage: &dyn EnrichmentStage,
    detections: Vec<Detection>,
) -> Result<Vec<Detection>, StageError> {
    let labels_before: Vec<String> = detections.iter().map(|d| d.label.clone()).collect();
    let enriched = stage.enrich(detections).await?;

    if enriched.len() != labels_before.len() {
        return Err(StageError::Contract {
            stage: stage.name().to_string(),
            details: format!(
                "returned {} items for {} inputs",
                enriched.len(),
                labels_before.len()
            ),
        });
    }

    if enriched
        .iter()
        .zip(&labels_before)
        .any(|(d, label)| &d.label != label)
    {
        return Err(StageError::Contract {
            stage: stage.name().to_string(),
            details: "reordered or relabelled items".to_string(),
        });
    }

    Ok(enriched)
}

/// Map a fully-enriched detection into an ingredient record
fn into_ingredient(detection: Detection) -> Result<Ingredient, StageError> {
    let missing = |attribute| StageError::MissingAttribute {
        label: detection.label.clone(),
        attribute,
    };

    let mass_grams = detection.mass_grams.ok_or_else(|| missing("mass_grams"))?;
    let vitality_score = detection.vitality.ok_or_else(|| missing("vitality"))?;
    let expires_in_days = detection
        .expires_in_days
        .ok_or_else(|| missing("expires_in_days"))?;

    Ok(Ingredient {
        id: Ingredient::new_id(),
        name: display_name(&detection.label),
        scientific_name: detection
            .scientific_name
            .unwrap_or_else(|| UNKNOWN_SPECIES.to_string()),
        category: detection
            .food_class
            .unwrap_or_else(|| PERCEPTION_CATEGORY.to_string()),
        mass_grams,
        vitality_score,
        expires_in_days,
        confidence: detection.confidence,
        verification_status: None,
        provenance: Provenance::Perception,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::ReplayDetector;
    use crate::types::BoundingBox;
    use async_trait::async_trait;

    fn det(label: &str, confidence: f64) -> Detection {
        Detection::new(label, BoundingBox::new(0.0, 0.0, 120.0, 120.0), confidence, "test")
    }

    fn pipeline_with(primary: Vec<Detection>) -> PerceptionPipeline {
        PerceptionPipeline::new(
            PipelineConfig::default(),
            Arc::new(ModelRegistry::with_default_models()),
            Arc::new(ReplayDetector::new("primary", primary)),
        )
    }

    struct DroppingStage;

    #[async_trait]
    impl EnrichmentStage for DroppingStage {
        fn name(&self) -> &'static str {
            "dropping"
        }
        fn status_message(&self) -> &'static str {
            "Dropping items"
        }
        async fn enrich(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, StageError> {
            detections.pop();
            Ok(detections)
        }
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.baseline_threshold, 0.20);
        assert_eq!(config.fallback_threshold, 0.12);
        assert_eq!(config.min_detections, 6);
        assert_eq!(config.deadline, Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_full_enrichment_maps_to_ingredients() {
        let pipeline = pipeline_with(vec![det("tomato", 0.9), det("dragonfruit", 0.8)]);
        let inventory = pipeline.run(&ImagePayload::default()).await.unwrap();

        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].name, "Tomato");
        assert_eq!(inventory[0].category, "vegetable");
        assert_eq!(inventory[0].scientific_name, "Solanum lycopersicum");
        assert!(inventory[0].mass_grams > 0.0);
        assert_eq!(inventory[1].category, PERCEPTION_CATEGORY);
        assert_eq!(inventory[1].scientific_name, UNKNOWN_SPECIES);
        assert_ne!(inventory[0].id, inventory[1].id);
    }

    #[tokio::test]
    async fn test_zero_detections_is_valid() {
        let pipeline = pipeline_with(Vec::new());
        let inventory = pipeline.run(&ImagePayload::default()).await.unwrap();
        assert!(inventory.is_empty());
    }

    #[tokio::test]
    async fn test_stage_dropping_items_is_rejected() {
        let stages = EnrichmentStages {
            freshness: Arc::new(DroppingStage),
            ..Default::default()
        };
        let pipeline = pipeline_with(vec![det("pear", 0.9)]).with_stages(stages);

        let err = pipeline.run(&ImagePayload::default()).await.unwrap_err();
        assert!(matches!(
            err,
            PerceptionError::Stage(StageError::Contract { ref stage, .. }) if stage == "dropping"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_scan() {
        let pipeline = pipeline_with(vec![det("pear", 0.9)]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline
            .run_with_cancel(&ImagePayload::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PerceptionError::Cancelled));
    }

    #[test]
    fn test_missing_attribute_rejected() {
        let err = into_ingredient(det("pear", 0.9)).unwrap_err();
        assert!(matches!(
            err,
            StageError::MissingAttribute { attribute: "mass_grams", .. }
        ));
    }
}
