use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::{RefreshOutcome, ScoreResult, ServiceInfo, StoredProfile, UserRecord};
use crate::scoring::ScoringEngine;
use crate::store::{mock, UserStore};
use crate::validation::ProfileInput;

/// Shared application state injected into handlers.
///
/// Both collaborators are resolved once at startup: `store` is `None` when
/// no database is configured, and the engine holds `None` when no model
/// artifact was found. Every call site branches on presence once.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// External profile store, when configured.
    pub store: Option<UserStore>,
    /// Scoring engine with the optional model handle.
    pub engine: ScoringEngine,
}

/// Builds the application router. Rate limiting and the `/health` probe are
/// layered on in `main` so tests can drive these routes directly.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/users/:id", get(get_user))
        .route("/predict", post(predict))
        .route("/users/:id/refresh-score", post(refresh_score))
        .route("/ws/:id", get(crate::ws::ws_handler))
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// GET /
///
/// Service info: which optional collaborators are present and which
/// operations are available.
pub async fn index(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: "incluscore-api",
        version: env!("CARGO_PKG_VERSION"),
        status: "healthy",
        model_loaded: state.engine.model_loaded(),
        store_connected: state.store.is_some(),
        endpoints: vec![
            "/users/{id}",
            "/predict",
            "/users/{id}/refresh-score",
            "/ws/{id}",
        ],
    })
}

/// Liveness probe. Mounted outside the rate limiter in `main`.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "incluscore-api",
            "version": env!("CARGO_PKG_VERSION"),
            "server_time": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// GET /users/:id
///
/// Fetches a user and their financial profile from the external store when
/// one is configured, else from the mock dataset.
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserRecord>, AppError> {
    tracing::info!("GET /users/{}", user_id);

    match &state.store {
        Some(store) => {
            let user = store
                .fetch_user(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            let financial_profile = store.fetch_profile(user_id).await?.ok_or_else(|| {
                AppError::NotFound(format!("Financial profile for user {} not found", user_id))
            })?;
            Ok(Json(UserRecord {
                user,
                financial_profile,
            }))
        }
        None => mock::user(user_id)
            .map(Json)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id))),
    }
}

/// POST /predict
///
/// Validates the submitted financial profile and returns the full scoring
/// result. Validation failures come back as 400 with every violation
/// listed.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<ScoreResult>, AppError> {
    let profile = input.validate()?;
    let result = state.engine.score(&profile);

    tracing::info!(
        credit_score = result.credit_score,
        confidence = result.confidence,
        "scored profile"
    );

    Ok(Json(result))
}

/// POST /users/:id/refresh-score
///
/// Runs the score-refresh simulation against the identified user's stored
/// profile. 404 when the user is unknown in the active source.
pub async fn refresh_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<RefreshOutcome>, AppError> {
    tracing::info!("POST /users/{}/refresh-score", user_id);

    let profile: StoredProfile = match &state.store {
        Some(store) => store.fetch_profile(user_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Financial profile for user {} not found", user_id))
        })?,
        None => mock::profile(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?,
    };

    // A stored profile that can no longer pass validation after the
    // simulated bump is a data problem, not a caller error
    let outcome = state
        .engine
        .simulate_refresh(&profile.to_input())
        .map_err(|e| {
            AppError::Internal(format!(
                "refresh simulation produced an invalid profile for user {}: {}",
                user_id, e
            ))
        })?;

    Ok(Json(outcome))
}
