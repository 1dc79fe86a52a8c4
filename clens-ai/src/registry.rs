//! Model Registry
//!
//! Catalog of the inference capabilities available on this device.
//! Lookups are served from an immutable snapshot; registration builds a new
//! snapshot and swaps it in, so readers never observe a partially-constructed
//! entry and are never blocked for longer than an `Arc` clone.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// Capability class of a registered model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelType {
    Detection,
    Classification,
    Reasoning,
}

/// Registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineModel {
    pub id: String,
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub accuracy: f64,
    /// Labels (or capabilities, for reasoning models) this model covers
    pub coverage: Vec<String>,
}

impl OfflineModel {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        model_type: ModelType,
        accuracy: f64,
        coverage: &[&str],
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
            model_type,
            accuracy,
            coverage: coverage.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Capacity report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_models: usize,
    pub detection_classes: usize,
    pub classification_classes: usize,
    pub reasoning_models: usize,
}

/// Models shipped with the application
pub fn default_models() -> Vec<OfflineModel> {
    vec![
        OfflineModel::new(
            "yolo-v8x-culinary",
            "YOLOv8x Edge",
            "4.2.0",
            ModelType::Detection,
            0.94,
            &["apple", "pear", "spinach", "cheese", "tomato", "onion", "garlic"],
        ),
        OfflineModel::new(
            "efficientnet-b7-food",
            "EfficientNet-B7",
            "1.0.5",
            ModelType::Classification,
            0.98,
            &["thyme", "lemon", "basil", "rosemary", "olive oil", "mushroom"],
        ),
        OfflineModel::new(
            "culinary-logic-v2",
            "Molecular Reasoning Engine",
            "2.1.0",
            ModelType::Reasoning,
            0.88,
            &[
                "flavor-pairing",
                "recipe-structuring",
                "substitution-logic",
                "waste-prediction",
            ],
        ),
    ]
}

/// Read-mostly model catalog with copy-on-write registration
#[derive(Debug)]
pub struct ModelRegistry {
    models: RwLock<Arc<Vec<OfflineModel>>>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_default_models()
    }
}

impl ModelRegistry {
    /// Create a registry from a seed list; later duplicates of an id are ignored
    pub fn new(seed: Vec<OfflineModel>) -> Self {
        let mut seen = HashSet::new();
        let models: Vec<OfflineModel> = seed
            .into_iter()
            .filter(|m| seen.insert(m.id.clone()))
            .collect();

        Self {
            models: RwLock::new(Arc::new(models)),
        }
    }

    pub fn with_default_models() -> Self {
        Self::new(default_models())
    }

    /// Current immutable snapshot of all models
    pub fn snapshot(&self) -> Arc<Vec<OfflineModel>> {
        // A poisoned lock still guards a fully-built snapshot
        let guard = self.models.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// All registered models of a capability class
    pub fn models_by_type(&self, model_type: ModelType) -> Vec<OfflineModel> {
        self.snapshot()
            .iter()
            .filter(|m| m.model_type == model_type)
            .cloned()
            .collect()
    }

    /// Deduplicated union of coverage across models of a capability class
    ///
    /// Labels keep the order in which they were first seen.
    pub fn aggregate_coverage(&self, model_type: ModelType) -> Vec<String> {
        let snapshot = self.snapshot();
        let mut seen = HashSet::new();
        let mut coverage = Vec::new();

        for model in snapshot.iter().filter(|m| m.model_type == model_type) {
            for label in &model.coverage {
                if seen.insert(label.as_str()) {
                    coverage.push(label.clone());
                }
            }
        }

        coverage
    }

    /// Register a model; a duplicate id is a silent no-op
    ///
    /// Returns true if the model was added.
    pub fn register_model(&self, model: OfflineModel) -> bool {
        let mut guard = self.models.write().unwrap_or_else(|e| e.into_inner());

        if guard.iter().any(|m| m.id == model.id) {
            debug!(model_id = %model.id, "Model already registered");
            return false;
        }

        info!(
            model_id = %model.id,
            "Augmented registry with {} ({})",
            model.name,
            model.version
        );

        let mut next = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(model);
        *guard = Arc::new(next);
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_models: self.len(),
            detection_classes: self.aggregate_coverage(ModelType::Detection).len(),
            classification_classes: self.aggregate_coverage(ModelType::Classification).len(),
            reasoning_models: self.models_by_type(ModelType::Reasoning).len(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_seed() {
        let registry = ModelRegistry::with_default_models();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.models_by_type(ModelType::Detection).len(), 1);
        assert_eq!(registry.models_by_type(ModelType::Reasoning)[0].version, "2.1.0");
    }

    #[test]
    fn test_aggregate_coverage_deduplicates() {
        let registry = ModelRegistry::with_default_models();
        registry.register_model(OfflineModel::new(
            "herb-net",
            "HerbNet",
            "0.3.0",
            ModelType::Classification,
            0.9,
            &["basil", "mint", "thyme"],
        ));

        let coverage = registry.aggregate_coverage(ModelType::Classification);
        assert_eq!(coverage.iter().filter(|c| *c == "basil").count(), 1);
        assert!(coverage.contains(&"mint".to_string()));
        assert_eq!(coverage.len(), 7);
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = ModelRegistry::with_default_models();
        let model = OfflineModel::new("x", "X", "1", ModelType::Detection, 0.5, &["egg"]);

        assert!(registry.register_model(model.clone()));
        assert!(!registry.register_model(model));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_duplicate_ids_in_seed() {
        let model = OfflineModel::new("a", "A", "1", ModelType::Detection, 0.5, &["egg"]);
        let registry = ModelRegistry::new(vec![model.clone(), model]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_registration() {
        let registry = ModelRegistry::with_default_models();
        let before = registry.snapshot();
        registry.register_model(OfflineModel::new(
            "late",
            "Late",
            "1",
            ModelType::Reasoning,
            0.5,
            &[],
        ));
        assert_eq!(before.len(), 3);
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_concurrent_registration_and_lookup() {
        let registry = Arc::new(ModelRegistry::with_default_models());
        let mut handles = Vec::new();

        for i in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                registry.register_model(OfflineModel::new(
                    format!("model-{}", i % 4),
                    "Concurrent",
                    "1",
                    ModelType::Classification,
                    0.5,
                    &["kale"],
                ));
                for model in registry.snapshot().iter() {
                    assert!(!model.id.is_empty());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.len(), 3 + 4);
    }

    #[test]
    fn test_stats() {
        let stats = ModelRegistry::with_default_models().stats();
        assert_eq!(stats.total_models, 3);
        assert_eq!(stats.detection_classes, 7);
        assert_eq!(stats.classification_classes, 6);
        assert_eq!(stats.reasoning_models, 1);
    }
}
