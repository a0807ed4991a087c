//! HTTP client for the proxy's `/tip` and `/plan` endpoints.
//!
//! [`HttpGenerator`] implements both generation traits from the core
//! crate, mapping HTTP outcomes onto [`GenerationError`]:
//! 429 is rate limiting, other non-2xx statuses carry the `error` field
//! of the body, and a 2xx without the expected text field is malformed.
//! There is no retry here; the caller decides whether to try again.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use kisan_sathi_core::generation::{GenerationError, PlanGenerator, TipGenerator};
use kisan_sathi_core::models::{ErrorResponse, PlanRequest, PlanResponse, TipRequest, TipResponse};

use crate::config::ClientConfig;

pub struct HttpGenerator {
    base_url: String,
    bearer: Option<String>,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(
        base_url: impl Into<String>,
        bearer: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer,
            client,
        })
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            config.bearer(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<B: Serialize + Sync, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, GenerationError> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "generation endpoint responded");
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            if status.as_u16() == 429 {
                return Err(GenerationError::RateLimited(message));
            }
            return Err(GenerationError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PlanGenerator for HttpGenerator {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<String, GenerationError> {
        let response: PlanResponse = self.post("plan", request).await?;
        Ok(response.plan_text)
    }
}

#[async_trait]
impl TipGenerator for HttpGenerator {
    async fn generate_tip(&self, request: &TipRequest) -> Result<String, GenerationError> {
        let response: TipResponse = self.post("tip", request).await?;
        if response.text_tip.trim().is_empty() {
            return Err(GenerationError::Malformed("empty textTip".to_string()));
        }
        Ok(response.text_tip)
    }
}
