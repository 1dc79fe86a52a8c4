//! clens-ai library
//!
//! Perception pipeline, model registry and fusion layer, plus the offline
//! generator and reasoning-engine clients that feed the fusion layer.

pub mod fusion;
pub mod offline;
pub mod perception;
pub mod reasoning;
pub mod registry;
pub mod session;
pub mod types;

pub use fusion::{fuse, FusionError};
pub use perception::{PerceptionError, PerceptionPipeline, PipelineConfig};
pub use registry::{ModelRegistry, ModelType, OfflineModel};
pub use session::KitchenSession;
