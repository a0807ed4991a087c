//! Client for the upstream AI completion gateway.
//!
//! The gateway speaks the OpenAI chat-completions protocol. The bearer
//! credential is read from the environment on every request, so a
//! missing key fails the request immediately rather than at startup.
//!
//! # Failure mapping
//!
//! - credential not set → [`GatewayError::NotConfigured`], never retried
//! - HTTP 429 → [`GatewayError::RateLimited`]
//! - any other non-2xx → [`GatewayError::Upstream`]
//! - network failure → [`GatewayError::Transport`]
//! - 2xx without message content → [`GatewayError::EmptyResponse`]

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewayConfig;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("AI gateway credential not configured (set {0})")]
    NotConfigured(String),

    #[error("AI gateway rate limit exceeded")]
    RateLimited,

    #[error("AI gateway returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("AI gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI gateway returned no content")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Clone)]
pub struct GatewayClient {
    url: String,
    model: String,
    api_key_env: String,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url: config.url.clone(),
            model: config.model.clone(),
            api_key_env: config.api_key_env.clone(),
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> Result<String, GatewayError> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GatewayError::NotConfigured(self.api_key_env.clone()))
    }

    /// Send one system + user exchange and return the reply text.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, GatewayError> {
        let api_key = self.api_key()?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
        };

        let started = std::time::Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            warn!(model = %self.model, "AI gateway rate limited");
            return Err(GatewayError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %body, "AI gateway error");
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        debug!(
            model = %self.model,
            duration_ms = started.elapsed().as_millis() as u64,
            "AI gateway completion"
        );
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GatewayError::EmptyResponse)
    }
}
