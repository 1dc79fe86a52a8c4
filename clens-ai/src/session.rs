//! Kitchen Session
//!
//! Composes one user-facing flow: scan → reasoning engine → fusion.
//! A perception failure is returned as-is so the caller can resubmit; a
//! reasoning failure degrades to the offline generator.

use crate::fusion::fuse;
use crate::perception::{PerceptionError, PerceptionPipeline, TargetedRescan};
use crate::offline::synthesize_offline_protocol;
use crate::reasoning::{OfflineReasoningEngine, ProtocolRequest, ReasoningEngine};
use crate::registry::{ModelRegistry, RegistryStats};
use crate::types::ImagePayload;
use clens_common::models::{Ingredient, NeuralProtocol, RecallHypothesis, UserPreferences};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct KitchenSession {
    pipeline: PerceptionPipeline,
    rescan: TargetedRescan,
    engine: Arc<dyn ReasoningEngine>,
}

impl KitchenSession {
    pub fn new(pipeline: PerceptionPipeline, engine: Arc<dyn ReasoningEngine>) -> Self {
        Self {
            pipeline,
            rescan: TargetedRescan::default(),
            engine,
        }
    }

    /// Session that never leaves the device
    pub fn offline(pipeline: PerceptionPipeline) -> Self {
        let engine = Arc::new(OfflineReasoningEngine::new(Arc::clone(pipeline.registry())));
        Self::new(pipeline, engine)
    }

    pub fn with_rescan(mut self, rescan: TargetedRescan) -> Self {
        self.rescan = rescan;
        self
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        self.pipeline.registry()
    }

    pub async fn scan(&self, image: &ImagePayload) -> Result<Vec<Ingredient>, PerceptionError> {
        self.pipeline.run(image).await
    }

    pub async fn scan_with_cancel(
        &self,
        image: &ImagePayload,
        cancel: &CancellationToken,
    ) -> Result<Vec<Ingredient>, PerceptionError> {
        self.pipeline.run_with_cancel(image, cancel).await
    }

    /// Accept recall hypotheses above the rescan bar
    pub fn rescan(&self, hypotheses: &[RecallHypothesis]) -> Vec<Ingredient> {
        self.rescan.rescan(hypotheses)
    }

    /// Generate and reconcile a protocol for the inventory
    ///
    /// Dismissed ingredients are not sent to the engine.
    pub async fn plan(
        &self,
        inventory: &[Ingredient],
        preferences: &UserPreferences,
    ) -> NeuralProtocol {
        let request = ProtocolRequest {
            ingredients: inventory
                .iter()
                .filter(|i| !i.is_dismissed())
                .cloned()
                .collect(),
            preferences: preferences.clone(),
        };

        let protocol = match self.engine.generate(&request).await {
            Ok(mut protocol) => {
                // Only the fusion layer may set affinity, impact and risk
                protocol.clear_fusion_output();
                protocol
            }
            Err(e) => {
                warn!(
                    engine = self.engine.name(),
                    error = %e,
                    "Reasoning engine unavailable, using offline generator"
                );
                synthesize_offline_protocol(
                    &request.ingredients,
                    &request.preferences,
                    self.registry(),
                )
            }
        };

        let fused = fuse(inventory, &protocol);
        info!(
            protocol_id = %fused.id,
            offline = fused.is_offline,
            risk = ?fused.substitution_risk,
            "Protocol ready"
        );
        fused
    }

    /// Scan an image and plan a protocol for what was found
    pub async fn scan_and_plan(
        &self,
        image: &ImagePayload,
        preferences: &UserPreferences,
    ) -> Result<(Vec<Ingredient>, NeuralProtocol), PerceptionError> {
        let inventory = self.scan(image).await?;
        let protocol = self.plan(&inventory, preferences).await;
        Ok((inventory, protocol))
    }

    pub fn registry_stats(&self) -> RegistryStats {
        self.registry().stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::{PipelineConfig, ReplayDetector};
    use crate::reasoning::ReasoningError;
    use crate::types::{BoundingBox, Detection};
    use async_trait::async_trait;
    use clens_common::models::{ImpactMetrics, SubstitutionRisk, VerificationStatus};

    struct DownEngine;

    #[async_trait]
    impl ReasoningEngine for DownEngine {
        fn name(&self) -> &str {
            "down"
        }

        async fn generate(&self, _: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError> {
            Err(ReasoningError::Network("connection refused".to_string()))
        }
    }

    struct EchoEngine;

    #[async_trait]
    impl ReasoningEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, req: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError> {
            let mut protocol = crate::fusion::test_support::protocol(&[], &[]);
            protocol.ingredients_used = req.ingredients.iter().map(|i| i.name.clone()).collect();
            protocol.ingredients_used.push("Saffron".to_string());
            Ok(protocol)
        }
    }

    /// Claims a verdict of its own alongside an ingredient nobody saw
    struct SelfGradingEngine;

    #[async_trait]
    impl ReasoningEngine for SelfGradingEngine {
        fn name(&self) -> &str {
            "self-grading"
        }

        async fn generate(&self, req: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError> {
            let mut protocol = EchoEngine.generate(req).await?;
            protocol.molecular_affinity = Some(99);
            protocol.substitution_risk = Some(SubstitutionRisk::Safe);
            protocol.impact_metrics = Some(ImpactMetrics {
                co2_saved_kg: 50.0,
                water_saved_litres: 10_000,
                waste_avoided_grams: 5000.0,
            });
            Ok(protocol)
        }
    }

    fn pipeline() -> PerceptionPipeline {
        let detections = vec![
            Detection::new("pear", BoundingBox::new(0.0, 0.0, 200.0, 200.0), 0.99, "yolo"),
            Detection::new("spinach", BoundingBox::new(0.0, 0.0, 150.0, 100.0), 0.96, "yolo"),
        ];
        PerceptionPipeline::new(
            PipelineConfig::default(),
            Arc::new(ModelRegistry::with_default_models()),
            Arc::new(ReplayDetector::new("yolo", detections)),
        )
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_offline() {
        let session = KitchenSession::new(pipeline(), Arc::new(DownEngine));
        let (inventory, protocol) = session
            .scan_and_plan(&ImagePayload::default(), &UserPreferences::default())
            .await
            .unwrap();

        assert_eq!(inventory.len(), 2);
        assert!(protocol.is_offline);
        assert!(protocol.is_fused());
        assert_eq!(protocol.substitution_risk, Some(SubstitutionRisk::Safe));
    }

    #[tokio::test]
    async fn test_dismissed_items_not_sent_and_hallucination_flagged() {
        let session = KitchenSession::new(pipeline(), Arc::new(EchoEngine));
        let mut inventory = session.scan(&ImagePayload::default()).await.unwrap();
        inventory[1].verification_status = Some(VerificationStatus::Dismissed);

        let protocol = session.plan(&inventory, &UserPreferences::default()).await;
        assert_eq!(protocol.ingredients_used, vec!["Pear"]);
        assert_eq!(protocol.missing_ingredients, vec!["Saffron"]);
        assert_eq!(protocol.substitution_risk, Some(SubstitutionRisk::Experimental));
    }

    #[tokio::test]
    async fn test_engine_supplied_verdict_is_replaced() {
        let session = KitchenSession::new(pipeline(), Arc::new(SelfGradingEngine));
        let inventory = session.scan(&ImagePayload::default()).await.unwrap();

        let protocol = session.plan(&inventory, &UserPreferences::default()).await;
        assert_eq!(protocol.missing_ingredients, vec!["Saffron"]);
        assert_eq!(protocol.substitution_risk, Some(SubstitutionRisk::Experimental));
        assert_ne!(protocol.molecular_affinity, Some(99));
    }

    #[tokio::test]
    async fn test_engine_supplied_verdict_dropped_when_fusion_aborts() {
        let session = KitchenSession::new(pipeline(), Arc::new(SelfGradingEngine));
        let mut inventory = session.scan(&ImagePayload::default()).await.unwrap();
        inventory[0].mass_grams = 0.0;

        let protocol = session.plan(&inventory, &UserPreferences::default()).await;
        assert!(!protocol.is_fused());
        assert!(protocol.substitution_risk.is_none());
        assert!(protocol.molecular_affinity.is_none());
        assert!(protocol.impact_metrics.is_none());
    }

    #[test]
    fn test_rescan_and_stats() {
        let session = KitchenSession::offline(pipeline());
        let found = session.rescan(&[
            RecallHypothesis {
                name: "basil".to_string(),
                confidence: 0.6,
            },
            RecallHypothesis {
                name: "mint".to_string(),
                confidence: 0.2,
            },
        ]);
        assert_eq!(found.len(), 1);
        assert_eq!(session.registry_stats().total_models, 3);
    }
}
