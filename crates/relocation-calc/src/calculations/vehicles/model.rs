use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

/// One named model input. Numeric features are single-element float tensors,
/// categorical ones are strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Float(f32),
    Text(String),
}

pub type ModelInputs = BTreeMap<String, FeatureValue>;

/// Model outputs. Only the categorical `label` output is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutputs {
    #[serde(default)]
    pub label: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("failed to load model '{model}': {reason}")]
    Load { model: String, reason: String },
    #[error("model run failed: {0}")]
    Run(String),
}

/// A loaded model that can be evaluated concurrently.
#[async_trait]
pub trait InferenceSession: Send + Sync {
    async fn run(&self, inputs: ModelInputs) -> Result<ModelOutputs, InferenceError>;
}

/// Creates inference sessions. Loading is expensive and happens once per handle.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model: &str) -> Result<Arc<dyn InferenceSession>, InferenceError>;
}

/// Load state reported by readiness probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    NotLoaded,
    Loaded,
}

/// Lazily loaded, shared model session.
///
/// Concurrent first callers wait on a single load; a failed load leaves the
/// handle empty so the next call tries again.
pub struct ModelHandle {
    model: String,
    loader: Arc<dyn ModelLoader>,
    session: OnceCell<Arc<dyn InferenceSession>>,
}

impl ModelHandle {
    pub fn new(model: impl Into<String>, loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            model: model.into(),
            loader,
            session: OnceCell::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn state(&self) -> ModelState {
        if self.session.initialized() {
            ModelState::Loaded
        } else {
            ModelState::NotLoaded
        }
    }

    pub async fn session(&self) -> Result<Arc<dyn InferenceSession>, InferenceError> {
        let session = self
            .session
            .get_or_try_init(|| async {
                tracing::info!(model = %self.model, "loading car ownership model");
                self.loader.load(&self.model).await
            })
            .await?;
        Ok(Arc::clone(session))
    }

    pub async fn run(&self, inputs: ModelInputs) -> Result<ModelOutputs, InferenceError> {
        self.session().await?.run(inputs).await
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("model", &self.model)
            .field("state", &self.state())
            .finish()
    }
}
