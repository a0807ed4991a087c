//! Remote text generation seams.
//!
//! The orchestrator never talks HTTP itself; it calls a [`PlanGenerator`].
//! The app crate implements both traits over reqwest, and tests plug in
//! scripted fakes.

use async_trait::async_trait;

use crate::models::{PlanRequest, TipRequest};

/// Why a generation request produced no text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The endpoint answered 429. Callers may back off; nothing retries
    /// automatically.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Any other non-2xx answer.
    #[error("generation endpoint returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx answer without a usable text field.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Produce tomorrow's plan text for the request.
    async fn generate_plan(&self, request: &PlanRequest) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait TipGenerator: Send + Sync {
    /// Produce one short tip.
    async fn generate_tip(&self, request: &TipRequest) -> Result<String, GenerationError>;
}
