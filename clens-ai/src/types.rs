//! Core Types and Stage Traits for the Perception Pipeline
//!
//! Every inference capability is a black box behind one of two traits:
//! - **DetectionModel:** image → label/bbox/confidence triples
//! - **EnrichmentStage:** detection list → same list with one more attribute
//!
//! The orchestrator only ever talks to these traits, so real models can be
//! swapped in without touching sequencing, thresholds or deadline handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Common Types
// ============================================================================

/// Opaque encoded image handed to detection models
#[derive(Debug, Clone, Default)]
pub struct ImagePayload {
    bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for ImagePayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Axis-aligned bounding box in image pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box area in square pixels (degenerate boxes have zero area)
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }
}

/// A single detection flowing through the stage chain
///
/// Detection models fill the first four fields; each enrichment stage fills
/// exactly one of the optional attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bbox: BoundingBox,
    /// Detection confidence (0.0-1.0)
    pub confidence: f64,
    /// Model that produced the detection
    pub model: String,

    /// Segmentation: mask extent in square pixels
    #[serde(default)]
    pub mask_area: Option<f64>,
    /// Classification: scientific taxonomy
    #[serde(default)]
    pub scientific_name: Option<String>,
    /// Classification: coarse food class (fruit, vegetable, ...)
    #[serde(default)]
    pub food_class: Option<String>,
    /// Freshness: vitality score (0-100)
    #[serde(default)]
    pub vitality: Option<f64>,
    /// Freshness: estimated days until expiry
    #[serde(default)]
    pub expires_in_days: Option<i32>,
    /// Volume: estimated mass
    #[serde(default)]
    pub mass_grams: Option<f64>,
}

impl Detection {
    pub fn new(
        label: impl Into<String>,
        bbox: BoundingBox,
        confidence: f64,
        model: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            bbox,
            confidence,
            model: model.into(),
            mask_area: None,
            scientific_name: None,
            food_class: None,
            vitality: None,
            expires_in_days: None,
            mass_grams: None,
        }
    }
}

// ============================================================================
// Stage Traits
// ============================================================================

/// Object detection capability
///
/// Used for the primary pass, the registry coverage sweep and the hybrid
/// fallback pass.
#[async_trait::async_trait]
pub trait DetectionModel: Send + Sync {
    /// Model name for provenance tracking
    fn name(&self) -> &str;

    /// Detect objects in an image
    ///
    /// # Arguments
    /// * `image` - Encoded image
    /// * `vocabulary` - Labels the registry says this capability covers
    /// * `threshold` - Requested confidence threshold
    ///
    /// # Errors
    /// Returns `StageError` if inference fails
    async fn detect(
        &self,
        image: &ImagePayload,
        vocabulary: &[String],
        threshold: f64,
    ) -> Result<Vec<Detection>, StageError>;
}

/// Enrichment capability
///
/// Given the prior stage's output, returns the same list (same length, same
/// order) with one additional attribute populated.
#[async_trait::async_trait]
pub trait EnrichmentStage: Send + Sync {
    /// Stage name for logs and progress events
    fn name(&self) -> &'static str;

    /// Status line shown while the stage runs
    fn status_message(&self) -> &'static str;

    async fn enrich(&self, detections: Vec<Detection>) -> Result<Vec<Detection>, StageError>;
}

/// Stage error
#[derive(Debug, Error)]
pub enum StageError {
    /// The underlying model failed
    #[error("Model error in {stage}: {message}")]
    Model { stage: String, message: String },

    /// A stage changed the length or order of its input
    #[error("Stage {stage} violated its contract: {details}")]
    Contract { stage: String, details: String },

    /// A required attribute was never populated
    #[error("Detection '{label}' is missing {attribute}")]
    MissingAttribute { label: String, attribute: &'static str },

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Tests
// ============================================================================
