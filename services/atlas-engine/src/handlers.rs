use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::encoder::{choice_tables, ChoiceTables, UserInput};
use crate::{AtlasError, CatalogStats, FeatureVector, MatchResult, RankedMatch, Scenario, ScenarioMatcher};

/// Application state shared across handlers
pub struct AppState {
    pub matcher: ScenarioMatcher,
    pub default_top_k: usize,
    pub catalog_loaded_at: DateTime<Utc>,
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/encode", post(encode))
        .route("/matches", post(find_matches))
        .route("/matches/best", post(find_best_match))
        .route("/scenarios", get(list_scenarios))
        .route("/scenarios/stats", get(scenario_stats))
        .route("/scenarios/{id}", get(get_scenario))
        .route("/choices", get(get_choices))
        .route("/health", get(health_check))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(e: AtlasError) -> (StatusCode, String) {
    let status = match &e {
        AtlasError::InvalidChoice { .. } | AtlasError::OutOfDomain { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AtlasError::ScenarioNotFound(_) => StatusCode::NOT_FOUND,
        AtlasError::InvalidWeights(_) | AtlasError::Catalog(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AtlasError::WeightStore { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, e.to_string())
}

/// POST /encode - Feature vector for an observation
pub async fn encode(
    State(state): State<Arc<AppState>>,
    Json(input): Json<UserInput>,
) -> Json<EncodeResponse> {
    Json(EncodeResponse {
        features: state.matcher.encode_input(&input),
    })
}

/// POST /matches - Closest scenarios for an observation
pub async fn find_matches(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MatchRequest>,
) -> Json<MatchResponse> {
    let top_k = req.top_k.unwrap_or(state.default_top_k);
    let features = state.matcher.encode_input(&req.input);
    let matches = state.matcher.find_matches(&features, top_k).await;

    let fallbacks = matches.iter().filter(|m| m.weight_fallback).count();
    if fallbacks > 0 {
        warn!("{} of {} matches use a fallback weight", fallbacks, matches.len());
    }

    Json(MatchResponse { features, matches })
}

/// POST /matches/best - Single closest scenario
pub async fn find_best_match(
    State(state): State<Arc<AppState>>,
    Json(input): Json<UserInput>,
) -> Result<Json<MatchResult>, (StatusCode, String)> {
    let features = state.matcher.encode_input(&input);
    match state.matcher.find_best_match(&features).await {
        Some(best) => {
            info!(
                "Best match {} ({:?}, similarity {:.4})",
                best.scenario.label, best.match_type, best.similarity
            );
            Ok(Json(best))
        }
        None => Err((StatusCode::NOT_FOUND, "Scenario catalog is empty".to_string())),
    }
}

/// GET /scenarios - Full catalog in catalog order
pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> Json<Vec<Arc<Scenario>>> {
    Json(state.matcher.all_scenarios().to_vec())
}

/// GET /scenarios/{id}
pub async fn get_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Arc<Scenario>>, (StatusCode, String)> {
    state
        .matcher
        .scenario_by_id(&id)
        .map(Json)
        .ok_or_else(|| error_response(AtlasError::ScenarioNotFound(id)))
}

/// GET /scenarios/stats - Counts per category and bias
pub async fn scenario_stats(State(state): State<Arc<AppState>>) -> Json<CatalogStats> {
    Json(state.matcher.catalog_stats())
}

/// GET /choices - Selectable values with display labels
pub async fn get_choices() -> Json<ChoiceTables> {
    Json(choice_tables())
}

/// GET /health - Service health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let scenarios = state.matcher.all_scenarios().len();

    Json(HealthResponse {
        status: if scenarios > 0 { "healthy".to_string() } else { "degraded".to_string() },
        scenarios,
        weight_store: state.matcher.weight_store_name().to_string(),
        catalog_loaded_at: state.catalog_loaded_at,
    })
}

// Request/response types
#[derive(Debug, serde::Deserialize)]
pub struct MatchRequest {
    pub input: UserInput,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, serde::Serialize)]
pub struct EncodeResponse {
    pub features: FeatureVector,
}

#[derive(Debug, serde::Serialize)]
pub struct MatchResponse {
    pub features: FeatureVector,
    pub matches: Vec<RankedMatch>,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub scenarios: usize,
    pub weight_store: String,
    pub catalog_loaded_at: DateTime<Utc>,
}
