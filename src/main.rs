mod config;
mod errors;
mod handlers;
mod model;
mod models;
mod scoring;
mod store;
mod validation;
mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::model::CreditModel;
use crate::scoring::ScoringEngine;
use crate::store::UserStore;

/// Main entry point for the application.
///
/// Initializes tracing and configuration, then resolves the two optional
/// collaborators exactly once: the external profile store (mock-data mode
/// when absent) and the trained model artifact (permanent rule-based
/// scoring when absent). Neither absence is fatal.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "incluscore_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Connect to the external profile store if one is configured. A failed
    // connection degrades to mock-data mode rather than aborting startup.
    let store = match &config.database_url {
        Some(url) => match UserStore::connect(url).await {
            Ok(store) => {
                tracing::info!("Profile store connection established");
                Some(store)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Profile store connection failed, using mock data");
                None
            }
        },
        None => None,
    };

    // Load the trained model artifact, if present
    let model = match CreditModel::load(&config.model_path) {
        Ok(model) => {
            tracing::info!(
                n_estimators = model.n_estimators(),
                "Model artifact loaded"
            );
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Model not available, using rule-based scoring");
            None
        }
    };

    let engine = ScoringEngine::new(model);

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        store,
        engine,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    let rate_limited = handlers::router(app_state.clone()).layer(
        ServiceBuilder::new().layer(GovernorLayer {
            config: governor_conf,
        }),
    );

    // Health check bypasses rate limiting for deployment probes
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(rate_limited);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
