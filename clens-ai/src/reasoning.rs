//! Reasoning Engine Interface
//!
//! The external engine that turns an inventory description into a narrative
//! protocol. Its output is untrusted and always goes through the fusion
//! layer before reaching a user.

use crate::offline::synthesize_offline_protocol;
use crate::registry::ModelRegistry;
use async_trait::async_trait;
use clens_common::config::ReasoningSettings;
use clens_common::models::{Ingredient, NeuralProtocol, UserPreferences};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Request sent to a reasoning engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolRequest {
    pub ingredients: Vec<Ingredient>,
    pub preferences: UserPreferences,
}

/// Reasoning engine error
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Request never reached the engine or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Engine answered with a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Engine answered with something that is not a protocol
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Protocol generation capability
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError>;
}

/// On-device engine backed by the offline blueprint generator
pub struct OfflineReasoningEngine {
    registry: Arc<ModelRegistry>,
}

impl OfflineReasoningEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ReasoningEngine for OfflineReasoningEngine {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError> {
        Ok(synthesize_offline_protocol(
            &request.ingredients,
            &request.preferences,
            &self.registry,
        ))
    }
}

/// Remote engine reached over HTTP
///
/// POSTs the request as JSON and expects a protocol as the JSON response body.
pub struct HttpReasoningEngine {
    http_client: Client,
    endpoint: String,
}

impl HttpReasoningEngine {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ReasoningError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ReasoningError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    /// Build from settings; `None` when no endpoint is configured
    pub fn from_settings(settings: &ReasoningSettings) -> Result<Option<Self>, ReasoningError> {
        match &settings.endpoint {
            Some(endpoint) => {
                Self::new(endpoint.clone(), Duration::from_millis(settings.timeout_ms)).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReasoningEngine for HttpReasoningEngine {
    fn name(&self) -> &str {
        "http"
    }

    async fn generate(&self, request: &ProtocolRequest) -> Result<NeuralProtocol, ReasoningError> {
        debug!(
            endpoint = %self.endpoint,
            ingredients = request.ingredients.len(),
            "Requesting protocol from reasoning engine"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ReasoningError::Network(format!("Reasoning request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReasoningError::Api(format!(
                "Reasoning engine returned {}: {}",
                status, body
            )));
        }

        let mut protocol: NeuralProtocol = response.json().await.map_err(|e| {
            ReasoningError::Parse(format!("Failed to parse reasoning response: {}", e))
        })?;

        if protocol.clear_fusion_output() {
            debug!(protocol_id = %protocol.id, "Discarded fusion fields supplied by engine");
        }
        debug!(protocol_id = %protocol.id, "Reasoning engine returned protocol");
        Ok(protocol)
    }
}
