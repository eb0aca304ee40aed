//! HTTP API exercised in-process through the router

use atlas_engine::handlers::{router, AppState};
use atlas_engine::{InMemoryWeightStore, ScenarioMatcher, StaticCatalog};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn app_with(catalog: StaticCatalog) -> axum::Router {
    let weights = InMemoryWeightStore::new();
    weights.set_weight("v-01", 0.82).await;

    let loaded_at = catalog.loaded_at();
    let matcher = ScenarioMatcher::new(Arc::new(catalog), Arc::new(weights));
    router(Arc::new(AppState {
        matcher,
        default_top_k: 3,
        catalog_loaded_at: loaded_at,
    }))
}

async fn sample_app() -> axum::Router {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/scenarios.json");
    app_with(StaticCatalog::from_json_file(path).await.unwrap()).await
}

fn v01_input() -> Value {
    json!({
        "c1_context": "inside_pdr", "c1_behavior": "ranging",
        "c2_action": "breaks_low", "c2_close": "inside",
        "c3_action": "breaks_high", "c3_close": "inside",
        "c4_action": "inside_bar", "c4_close": "inside"
    })
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_encode() {
    let (status, body) = send(sample_app().await, post("/encode", v01_input())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"]["c2_action"], 2);
    assert_eq!(body["features"]["c3_action"], 1);
    assert_eq!(body["features"]["c1_context"], 0);
}

#[tokio::test]
async fn test_invalid_choice_is_rejected() {
    let mut input = v01_input();
    input["c2_close"] = json!("sideways");
    let (status, _) = send(sample_app().await, post("/encode", input)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_matches_default_and_explicit_top_k() {
    let (status, body) = send(
        sample_app().await,
        post("/matches", json!({ "input": v01_input() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let matches = body["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 3);
    assert_eq!(matches[0]["scenario"]["id"], "v-01");
    assert_eq!(matches[0]["match_type"], "exact");
    assert_eq!(matches[0]["similarity"], 1.0);
    assert_eq!(matches[0]["confidence_weight"], 0.82);

    let (_, body) = send(
        sample_app().await,
        post("/matches", json!({ "input": v01_input(), "top_k": 1 })),
    )
    .await;
    assert_eq!(body["matches"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_best_match() {
    let (status, body) = send(sample_app().await, post("/matches/best", v01_input())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scenario"]["label"], "V-01");
    assert_eq!(body["match_type"], "exact");
    assert!(body.get("distance").is_none());

    let empty = app_with(StaticCatalog::empty()).await;
    let (status, _) = send(empty, post("/matches/best", v01_input())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scenario_lookup() {
    let (status, body) = send(sample_app().await, get("/scenarios/h-01")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "pdh_break");

    let (status, _) = send(sample_app().await, get("/scenarios/zz-99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(sample_app().await, get("/scenarios")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "v-01");
}

#[tokio::test]
async fn test_stats_choices_health() {
    let (_, stats) = send(sample_app().await, get("/scenarios/stats")).await;
    assert_eq!(stats["by_category"][1]["label"], "Inside PDR");

    let (_, choices) = send(sample_app().await, get("/choices")).await;
    assert_eq!(choices["candle_actions"].as_array().unwrap().len(), 4);

    let (status, health) = send(sample_app().await, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["weight_store"], "memory");
}
