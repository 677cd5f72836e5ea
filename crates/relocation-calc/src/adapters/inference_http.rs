use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::calculations::vehicles::{
    InferenceError, InferenceSession, ModelInputs, ModelLoader, ModelOutputs,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct InferRequest<'a> {
    inputs: &'a ModelInputs,
}

/// Loads models hosted by a model-serving endpoint.
#[derive(Debug, Clone)]
pub struct HttpModelLoader {
    client: reqwest::Client,
    base_url: String,
}

impl HttpModelLoader {
    pub fn new(base_url: impl Into<String>) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| InferenceError::Run(error.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model.trim_start_matches('/'))
    }
}

#[async_trait]
impl ModelLoader for HttpModelLoader {
    async fn load(&self, model: &str) -> Result<Arc<dyn InferenceSession>, InferenceError> {
        let url = self.model_url(model);
        let load_error = |reason: String| InferenceError::Load {
            model: model.to_string(),
            reason,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|error| load_error(error.to_string()))?;
        if !response.status().is_success() {
            return Err(load_error(format!("status {}", response.status().as_u16())));
        }

        tracing::info!(%model, "model available on inference service");
        Ok(Arc::new(HttpInferenceSession {
            client: self.client.clone(),
            infer_url: format!("{url}/infer"),
        }))
    }
}

/// Session evaluating one hosted model.
#[derive(Debug, Clone)]
pub struct HttpInferenceSession {
    client: reqwest::Client,
    infer_url: String,
}

#[async_trait]
impl InferenceSession for HttpInferenceSession {
    async fn run(&self, inputs: ModelInputs) -> Result<ModelOutputs, InferenceError> {
        let response = self
            .client
            .post(&self.infer_url)
            .json(&InferRequest { inputs: &inputs })
            .send()
            .await
            .map_err(|error| InferenceError::Run(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Run(format!(
                "inference service returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        response
            .json::<ModelOutputs>()
            .await
            .map_err(|error| InferenceError::Run(error.to_string()))
    }
}
