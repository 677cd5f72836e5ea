use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::accessibility::{
    AccessibilityMapRequest, AccessibilityMapResponse, GatewayError, RoutingGateway,
    TimeDistanceRequest, TimeDistanceResponse,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Routing gateway backed by the routing service's JSON API.
#[derive(Debug, Clone)]
pub struct HttpRoutingGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRoutingGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|error| GatewayError::Transport(error.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, GatewayError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "(no body)".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|error| GatewayError::Decode(error.to_string()))
    }
}

#[async_trait]
impl RoutingGateway for HttpRoutingGateway {
    async fn accessibility_map(
        &self,
        request: AccessibilityMapRequest,
    ) -> Result<AccessibilityMapResponse, GatewayError> {
        self.post("accessibility-map", &request).await
    }

    async fn time_distance_by_mode(
        &self,
        request: TimeDistanceRequest,
    ) -> Result<TimeDistanceResponse, GatewayError> {
        self.post("time-distance-by-mode", &request).await
    }
}
