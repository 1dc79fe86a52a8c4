//! Perception layer
//!
//! Turns an image into an inventory of `Ingredient` records:
//! detection → hybrid fallback → segmentation → classification → freshness → volume.

pub mod class_map;
pub mod classifier;
pub mod detector;
pub mod freshness;
pub mod pipeline;
pub mod rescan;
pub mod segmenter;
pub mod volume;

pub use classifier::TaxonomyClassifier;
pub use detector::{DetectionStage, HybridFallbackStage, ReplayDetector};
pub use freshness::ShelfLifeFreshness;
pub use pipeline::{EnrichmentStages, PerceptionPipeline, PipelineConfig};
pub use rescan::TargetedRescan;
pub use segmenter::BoxAreaSegmenter;
pub use volume::DensityVolumeEstimator;

use crate::types::StageError;
use thiserror::Error;

/// Perception failure
///
/// A timeout or cancellation means "no new data", never an empty inventory.
#[derive(Debug, Error)]
pub enum PerceptionError {
    /// The scan did not finish within its deadline
    #[error("Perception inference timed out after {deadline_ms} ms")]
    Timeout { deadline_ms: u64 },

    /// The caller cancelled the scan
    #[error("Perception scan cancelled")]
    Cancelled,

    /// A stage failed
    #[error("Perception stage failed: {0}")]
    Stage(#[from] StageError),
}

impl PerceptionError {
    /// Whether resubmitting the same image may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, PerceptionError::Timeout { .. } | PerceptionError::Cancelled)
    }
}

/// Display form of a model label: trimmed, first letter capitalized
pub fn display_name(label: &str) -> String {
    let label = label.trim();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
