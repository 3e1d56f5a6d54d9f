use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use std::{sync::Arc, time::Duration, time::Instant};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use url::Url;

use crate::{
    error::{validation_error, AppError},
    service::{ScoringEngine, ScoringError},
    types::{ScoreRequest, ScoreResponse},
};

pub const TIMEOUT_DETAIL: &str = "Scoring operation exceeded timeout.";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn ScoringEngine>,
    pub default_timeout: Duration,
}

pub fn router(engine: Arc<dyn ScoringEngine>, default_timeout: Duration) -> Router {
    Router::new()
        .route("/score", post(score))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState {
            engine,
            default_timeout,
        })
}

pub async fn score(
    State(state): State<AppState>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let start = Instant::now();
    metrics::counter!("score_requests_total").increment(1);

    let url = validate_url(&payload.url)?;
    let timeout = match payload.timeout_seconds {
        Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
            .map_err(|_| validation_error("timeout_seconds is out of range"))?,
        Some(_) => return Err(validation_error("timeout_seconds must be greater than 0")),
        None => state.default_timeout,
    };

    info!("Received score request for {}", url);

    let engine = state.engine.clone();
    let task_url = url.clone();
    let outcome = tokio::time::timeout(
        timeout,
        tokio::task::spawn_blocking(move || engine.score_url(&task_url)),
    )
    .await;

    let report = match outcome {
        Err(_) => {
            warn!("Scoring {} exceeded {:?}", url, timeout);
            return Err(AppError::Timeout(TIMEOUT_DETAIL.to_string()));
        }
        Ok(Err(join_error)) => {
            return Err(AppError::Engine(format!("Scoring task failed: {}", join_error)))
        }
        Ok(Ok(Err(ScoringError::Timeout(detail)))) => {
            return Err(AppError::Timeout(non_empty(detail, TIMEOUT_DETAIL)))
        }
        Ok(Ok(Err(ScoringError::Failed(detail)))) => {
            return Err(AppError::Engine(non_empty(detail, "Failed to compute score.")))
        }
        Ok(Ok(Ok(report))) => report,
    };

    let mut signals = report.signals;
    signals.insert(
        "timeout_seconds".to_string(),
        payload.timeout_seconds.map(|secs| secs.to_string()),
    );

    metrics::histogram!("score_request_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

    Ok(Json(ScoreResponse {
        risk_score: report.risk_score.clamp(0.0, 1.0),
        reasons: report.reasons,
        signals,
    }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Accepts absolute http(s) URLs with a host. The original string is kept
/// so list lookups see exactly what the caller sent.
fn validate_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|e| validation_error(&format!("Invalid URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(validation_error("URL scheme must be http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(validation_error("URL must include a host"));
    }
    Ok(trimmed.to_string())
}

fn non_empty(detail: String, fallback: &str) -> String {
    if detail.is_empty() {
        fallback.to_string()
    } else {
        detail
    }
}
