pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proficiency_core::catalog::default_catalog;
use proficiency_core::{AchievementEngine, ProgressOrchestrator};

use crate::config::Config;
use crate::db::Database;
use crate::services::progress::ProgressService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub progress: Arc<ProgressService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, orchestrator: ProgressOrchestrator, config: Config) -> Self {
        let db = Arc::new(db);
        Self {
            progress: Arc::new(ProgressService::new(db.clone(), orchestrator)),
            db,
            config: Arc::new(config),
        }
    }
}

/// Build the full router. Everything except health and registration requires
/// a bearer token.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Vocabulary routes
        .route("/api/vocabulary/queue", get(routes::vocabulary::queue))
        .route("/api/vocabulary/stats", get(routes::vocabulary::stats))
        .route("/api/vocabulary/:term_id/review", post(routes::vocabulary::review))
        // Listening and speaking routes
        .route("/api/listening/:exercise_id/result", post(routes::listening::submit_result))
        .route("/api/speaking/:scenario_id/result", post(routes::speaking::submit_result))
        // Progress routes
        .route("/api/progress/practice-session", post(routes::progress::practice_session))
        .route("/api/progress/streak", get(routes::progress::streak))
        .route("/api/progress/daily", get(routes::progress::daily))
        .route("/api/progress/achievements", get(routes::progress::achievements))
        .route("/api/progress/level", get(routes::progress::level))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/users/register", post(routes::users::register))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url, config.database_max_connections).await?;

    tracing::info!("Running migrations...");
    db.run_migrations().await?;

    let seeded = db.seed_achievements(&default_catalog()).await?;
    let engine = AchievementEngine::new(db.get_achievement_catalog().await?);
    tracing::info!(seeded, loaded = engine.catalog().len(), "achievement catalog ready");

    let orchestrator = ProgressOrchestrator::with_algorithm("sm2", engine)?;
    tracing::info!(algorithm = orchestrator.scheduler().name(), "review scheduler ready");

    let addr = config.bind_addr();
    let app = build_router(AppState::new(db, orchestrator, config));

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
