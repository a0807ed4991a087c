//! HTTP-level tests for the `/tip` and `/plan` proxy functions, run
//! against a fake AI gateway.

mod common;

use common::{spawn_gateway, spawn_proxy, spawn_stack, Mode};
use serde_json::{json, Value};

async fn post_json(url: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_tip_success() {
    let (proxy, gateway) = spawn_stack(Mode::Reply("धान खेतमा पानी राख्नुहोस्".into()), "KISAN_T_TIP_OK").await;

    let (status, body) = post_json(
        &format!("{}/tip", proxy),
        json!({ "crop": "rice", "stage": "flowering", "location": "Chitwan" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["textTip"], "धान खेतमा पानी राख्नुहोस्");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].authorization.as_deref(), Some("Bearer sk-test"));
    assert_eq!(calls[0].body["model"], "test-model");
    let prompt = calls[0].prompt_text();
    assert!(prompt.contains("Crop: rice"));
    assert!(prompt.contains("Location: Chitwan"));
}

#[tokio::test]
async fn test_tip_accepts_empty_body() {
    let (proxy, _gateway) = spawn_stack(Mode::Reply("tip".into()), "KISAN_T_TIP_EMPTY").await;
    let resp = reqwest::Client::new()
        .post(format!("{}/tip", proxy))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["textTip"], "tip");
}

#[tokio::test]
async fn test_plan_success_forwards_recent_tips() {
    let (proxy, gateway) = spawn_stack(Mode::Reply("बिहान: ...".into()), "KISAN_T_PLAN_OK").await;

    let (status, body) = post_json(
        &format!("{}/plan", proxy),
        json!({
            "crop": "wheat",
            "stage": "tillering",
            "recentTips": ["Apply urea after irrigation", "Watch for aphids"]
        }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["planText"], "बिहान: ...");
    let prompt = gateway.calls()[0].prompt_text();
    assert!(prompt.contains("- Apply urea after irrigation"));
    assert!(prompt.contains("- Watch for aphids"));
}

#[tokio::test]
async fn test_plan_forwards_only_newest_ten_tips() {
    let (proxy, gateway) = spawn_stack(Mode::Reply("plan".into()), "KISAN_T_PLAN_CAP").await;
    let tips: Vec<String> = (0..25).map(|i| format!("advice {}", i)).collect();

    let (status, _) = post_json(
        &format!("{}/plan", proxy),
        json!({ "crop": "rice", "stage": "flowering", "recentTips": tips }),
    )
    .await;

    assert_eq!(status, 200);
    let prompt = gateway.calls()[0].prompt_text();
    let forwarded = prompt.lines().filter(|l| l.starts_with("- advice ")).count();
    assert_eq!(forwarded, 10);
    assert!(prompt.contains("- advice 15\n"));
    assert!(prompt.contains("- advice 24\n"));
    assert!(!prompt.contains("- advice 14\n"));
}

#[tokio::test]
async fn test_rate_limit_surfaces_as_429() {
    let (proxy, _gateway) = spawn_stack(Mode::Status(429), "KISAN_T_RATE").await;

    let (status, body) = post_json(&format!("{}/tip", proxy), json!({})).await;
    assert_eq!(status, 429);
    assert_eq!(body, json!({ "error": "Too many requests" }));

    let (status, body) = post_json(
        &format!("{}/plan", proxy),
        json!({ "crop": "maize", "stage": "sowing", "recentTips": [] }),
    )
    .await;
    assert_eq!(status, 429);
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn test_upstream_failure_is_500_with_error() {
    let (proxy, _gateway) = spawn_stack(Mode::Status(503), "KISAN_T_UPSTREAM").await;
    let (status, body) = post_json(&format!("{}/tip", proxy), json!({ "crop": "rice" })).await;
    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_empty_completion_is_500() {
    let (proxy, _gateway) = spawn_stack(Mode::Reply("   ".into()), "KISAN_T_EMPTY_REPLY").await;
    let (status, body) = post_json(
        &format!("{}/plan", proxy),
        json!({ "crop": "rice", "stage": "harvest", "recentTips": [] }),
    )
    .await;
    assert_eq!(status, 500);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_missing_credential_fails_without_calling_gateway() {
    std::env::remove_var("KISAN_T_NO_KEY");
    let (gateway_url, gateway) = spawn_gateway(Mode::Reply("unused".into())).await;
    let proxy = spawn_proxy(&gateway_url, "KISAN_T_NO_KEY", None).await;

    let (status, body) = post_json(&format!("{}/tip", proxy), json!({})).await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "Server configuration error");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_plan_requires_crop_and_stage() {
    let (proxy, gateway) = spawn_stack(Mode::Reply("x".into()), "KISAN_T_PLAN_BAD").await;

    let (status, body) = post_json(&format!("{}/plan", proxy), json!({ "crop": "rice" })).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, _) = post_json(
        &format!("{}/plan", proxy),
        json!({ "crop": "rice", "stage": "  " }),
    )
    .await;
    assert_eq!(status, 400);

    let resp = reqwest::Client::new()
        .post(format!("{}/plan", proxy))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_preflight_is_permissive_and_empty() {
    let (proxy, _gateway) = spawn_stack(Mode::Reply("x".into()), "KISAN_T_CORS").await;
    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{}/plan", proxy))
        .header("Origin", "https://kisan.example")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization, content-type")
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
    assert!(resp.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bearer_token_enforced_when_configured() {
    std::env::set_var("KISAN_T_AUTH_KEY", "sk-test");
    let (gateway_url, _gateway) = spawn_gateway(Mode::Reply("tip".into())).await;
    let proxy = spawn_proxy(&gateway_url, "KISAN_T_AUTH_KEY", Some("farmer-token")).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/tip", proxy))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = client
        .post(format!("{}/tip", proxy))
        .bearer_auth("wrong")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);

    let resp = client
        .post(format!("{}/tip", proxy))
        .bearer_auth("farmer-token")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn test_health() {
    let (proxy, _gateway) = spawn_stack(Mode::Reply("x".into()), "KISAN_T_HEALTH").await;
    let body: Value = reqwest::get(format!("{}/health", proxy))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}
