//! Shared fixtures: a fake AI gateway and a proxy wired to it.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use kisan_sathi::config::GatewayConfig;
use kisan_sathi::gateway::GatewayClient;
use kisan_sathi::server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// How the fake gateway answers.
#[derive(Clone, Debug)]
pub enum Mode {
    Reply(String),
    Status(u16),
}

/// One request the fake gateway received.
#[derive(Clone, Debug)]
pub struct Captured {
    pub authorization: Option<String>,
    pub body: Value,
}

impl Captured {
    /// Concatenated message contents, for asserting on prompts.
    pub fn prompt_text(&self) -> String {
        self.body["messages"]
            .as_array()
            .map(|msgs| {
                msgs.iter()
                    .filter_map(|m| m["content"].as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct FakeGateway {
    mode: Arc<Mutex<Mode>>,
    calls: Arc<Mutex<Vec<Captured>>>,
}

impl FakeGateway {
    pub fn set_mode(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> Vec<Captured> {
        self.calls.lock().unwrap().clone()
    }
}

async fn chat(State(g): State<FakeGateway>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    g.calls.lock().unwrap().push(Captured {
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    let mode = g.mode.lock().unwrap().clone();
    match mode {
        Mode::Reply(text) => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        Mode::Status(code) => (
            StatusCode::from_u16(code).unwrap(),
            Json(json!({ "error": { "message": "upstream says no" } })),
        )
            .into_response(),
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Start a fake chat-completions gateway. Returns its completions URL.
pub async fn spawn_gateway(mode: Mode) -> (String, FakeGateway) {
    let gateway = FakeGateway {
        mode: Arc::new(Mutex::new(mode)),
        calls: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(chat))
        .with_state(gateway.clone());
    let base = serve(app).await;
    (format!("{}/v1/chat/completions", base), gateway)
}

/// Start the proxy against `gateway_url`, reading the key from `key_env`.
pub async fn spawn_proxy(gateway_url: &str, key_env: &str, auth_token: Option<&str>) -> String {
    let config = GatewayConfig {
        url: gateway_url.to_string(),
        model: "test-model".to_string(),
        api_key_env: key_env.to_string(),
        timeout_secs: 5,
    };
    let client = GatewayClient::new(&config).unwrap();
    let state = AppState::new(client, auth_token.map(str::to_string));
    serve(build_router(state)).await
}

/// Gateway plus proxy with a credential set under a test-unique variable.
pub async fn spawn_stack(mode: Mode, key_env: &str) -> (String, FakeGateway) {
    std::env::set_var(key_env, "sk-test");
    let (gateway_url, gateway) = spawn_gateway(mode).await;
    let proxy = spawn_proxy(&gateway_url, key_env, None).await;
    (proxy, gateway)
}
