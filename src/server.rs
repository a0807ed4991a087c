//! The two AI proxy functions, served over HTTP.
//!
//! Each endpoint turns a small JSON request into a prompt, forwards it to
//! the AI gateway, and returns the reply text. No state is kept between
//! calls.
//!
//! # Endpoints
//!
//! | Method | Path | Body | Success |
//! |--------|------|------|---------|
//! | `POST` | `/tip` | `{ crop?, stage?, location? }` | `{ "textTip": "..." }` |
//! | `POST` | `/plan` | `{ crop, stage, location?, recentTips }` | `{ "planText": "..." }` |
//! | `GET`  | `/health` | | `{ "status": "ok", "version": "..." }` |
//!
//! # Error Contract
//!
//! Every failure is a non-2xx status with `{ "error": "<message>" }`:
//! `400` malformed request, `401` missing or wrong bearer token, `429`
//! gateway rate limit (`"Too many requests"`), `500` anything else,
//! including a missing gateway credential.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted. Preflight `OPTIONS`
//! requests get an empty `200`.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use kisan_sathi_core::models::{
    ErrorResponse, PlanRequest, PlanResponse, TipRequest, TipResponse,
};
use kisan_sathi_core::orchestrator::RECENT_TIP_CONTEXT;

use crate::config::Config;
use crate::gateway::{GatewayClient, GatewayError};
use crate::prompts;

/// Shared state for the route handlers.
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<GatewayClient>,
    /// Bearer token callers must present, if any.
    auth_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(gateway: GatewayClient, auth_token: Option<String>) -> Self {
        Self {
            gateway: Arc::new(gateway),
            auth_token: auth_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let gateway = GatewayClient::new(&config.gateway)?;
        let auth_token = match config.server.auth_token_env.as_deref() {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                anyhow::anyhow!("server.auth_token_env is set but {} is not", var)
            })?),
            None => None,
        };
        Ok(Self::new(gateway, auth_token))
    }
}

/// Build the router with CORS applied. Exposed for embedding and tests.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tip", post(handle_tip))
        .route("/plan", post(handle_plan))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the proxy server on `[server].bind` and runs until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    if std::env::var(&config.gateway.api_key_env).is_err() {
        warn!(
            var = %config.gateway.api_key_env,
            "gateway credential not set; requests will fail with 500"
        );
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, model = %config.gateway.model, "proxy listening");
    println!("Kisan Sathi proxy listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

/// Handler error rendered as `{ "error": message }`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: message.into(),
    }
}

fn unauthorized() -> ApiError {
    ApiError {
        status: StatusCode::UNAUTHORIZED,
        message: "Unauthorized".to_string(),
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::RateLimited => ApiError {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Too many requests".to_string(),
            },
            GatewayError::NotConfigured(_) => {
                error!(error = %err, "proxy misconfigured");
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Server configuration error".to_string(),
                }
            }
            other => ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: other.to_string(),
            },
        }
    }
}

fn check_auth(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.auth_token else {
        return Ok(());
    };
    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == &**expected => Ok(()),
        _ => Err(unauthorized()),
    }
}

/// Parse a JSON body; an empty body reads as `T::default()` when allowed.
fn parse_body<T: DeserializeOwned>(body: &Bytes, empty: Option<T>) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return empty.ok_or_else(|| bad_request("request body must be JSON"));
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("invalid request body: {}", e)))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /tip ============

async fn handle_tip(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TipResponse>, ApiError> {
    check_auth(&state, &headers)?;
    let req: TipRequest = parse_body(&body, Some(TipRequest::default()))?;

    let text = state
        .gateway
        .complete(prompts::TIP_SYSTEM_PROMPT, &prompts::tip_user_prompt(&req))
        .await?;

    info!(crop = ?req.crop, chars = text.chars().count(), "tip generated");
    Ok(Json(TipResponse { text_tip: text }))
}

// ============ POST /plan ============

async fn handle_plan(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PlanResponse>, ApiError> {
    check_auth(&state, &headers)?;
    let mut req: PlanRequest = parse_body(&body, None)?;
    if req.crop.trim().is_empty() || req.stage.trim().is_empty() {
        return Err(bad_request("crop and stage must not be empty"));
    }
    // Only the newest tips are forwarded, as the client would send them.
    let excess = req.recent_tips.len().saturating_sub(RECENT_TIP_CONTEXT);
    if excess > 0 {
        req.recent_tips.drain(..excess);
    }

    let text = state
        .gateway
        .complete(prompts::PLAN_SYSTEM_PROMPT, &prompts::plan_user_prompt(&req))
        .await?;

    info!(
        crop = %req.crop,
        stage = %req.stage,
        context_tips = req.recent_tips.len(),
        "plan generated"
    );
    Ok(Json(PlanResponse { plan_text: text }))
}
