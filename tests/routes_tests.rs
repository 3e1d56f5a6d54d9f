//! HTTP behaviour of the scoring API.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use phishsentry_engine::{
    routes::{router, TIMEOUT_DETAIL},
    EngineConfig, Evaluator, ScoreReport, ScoringEngine, ScoringError,
};
use serde_json::{json, Value};
use std::{collections::BTreeMap, collections::HashSet, sync::Arc, time::Duration};
use tower::ServiceExt;

enum MockEngine {
    Report(ScoreReport),
    Fail(ScoringError),
    Slow(Duration),
}

impl ScoringEngine for MockEngine {
    fn score_url(&self, _url: &str) -> Result<ScoreReport, ScoringError> {
        match self {
            MockEngine::Report(report) => Ok(report.clone()),
            MockEngine::Fail(err) => Err(err.clone()),
            MockEngine::Slow(delay) => {
                std::thread::sleep(*delay);
                Err(ScoringError::Failed("finished too late".to_string()))
            }
        }
    }
}

fn app(engine: impl ScoringEngine + 'static) -> Router {
    router(Arc::new(engine), Duration::from_secs(2))
}

async fn post_score(app: Router, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/score")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn score_endpoint_returns_engine_report() {
    let report = ScoreReport {
        risk_score: 0.7,
        reasons: vec!["Detected suspicious keyword".to_string()],
        signals: BTreeMap::from([(
            "matched_indicators".to_string(),
            Some("Login keyword detected".to_string()),
        )]),
    };

    let (status, body) = post_score(
        app(MockEngine::Report(report)),
        json!({"url": "https://example.com/login"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], json!(0.7));
    assert_eq!(body["reasons"], json!(["Detected suspicious keyword"]));
    assert_eq!(body["signals"]["matched_indicators"], json!("Login keyword detected"));
    assert_eq!(body["signals"]["timeout_seconds"], Value::Null);
}

#[tokio::test]
async fn score_endpoint_validates_url() {
    let (status, _) = post_score(app(Evaluator::default()), json!({"url": "not-a-url"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post_score(app(Evaluator::default()), json!({"url": "ftp://example.com"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn score_endpoint_rejects_non_positive_timeout() {
    let (status, _) = post_score(
        app(Evaluator::default()),
        json!({"url": "https://example.com", "timeout_seconds": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn score_endpoint_handles_engine_timeout() {
    let (status, body) = post_score(
        app(MockEngine::Fail(ScoringError::Timeout("Model timed out after 2s".to_string()))),
        json!({"url": "https://example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["detail"], json!("Model timed out after 2s"));
}

#[tokio::test]
async fn score_endpoint_enforces_request_timeout() {
    let (status, body) = post_score(
        app(MockEngine::Slow(Duration::from_millis(500))),
        json!({"url": "https://example.com", "timeout_seconds": 0.05}),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["detail"], json!(TIMEOUT_DETAIL));
}

#[tokio::test]
async fn score_endpoint_handles_engine_error() {
    let (status, body) = post_score(
        app(MockEngine::Fail(ScoringError::Failed("Engine failure".to_string()))),
        json!({"url": "https://example.com"}),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], json!("Engine failure"));
}

#[tokio::test]
async fn evaluator_backed_endpoint_honours_blocklist() {
    let config = EngineConfig {
        blocklist: HashSet::from(["http://evil.example".to_string()]),
        ..EngineConfig::default()
    };
    let (status, body) = post_score(
        app(Evaluator::new(config)),
        json!({"url": "http://evil.example", "timeout_seconds": 1.5}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], json!(1.0));
    assert_eq!(body["reasons"], json!(["URL is on the blocklist"]));
    assert_eq!(body["signals"]["label"], json!("block"));
    assert_eq!(body["signals"]["timeout_seconds"], json!("1.5"));
}

#[tokio::test]
async fn evaluator_backed_endpoint_explains_heuristics() {
    let (status, body) = post_score(
        app(Evaluator::default()),
        json!({"url": "http://login-secure-update.example.com/account"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let reasons = body["reasons"].as_array().unwrap();
    assert!(!reasons.is_empty());
    assert!(reasons.iter().any(|r| r.as_str().unwrap().contains("keyword")));
    assert_eq!(body["signals"]["label"], json!("benign"));
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app(Evaluator::default()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], json!("healthy"));
}
