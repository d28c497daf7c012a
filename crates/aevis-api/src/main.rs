//! aevis-api - HTTP API server for the aevis visibility pipeline.
//!
//! Configuration (environment variables):
//!   AEVIS_STORE               - "postgres" (default) or "memory" (demo mode)
//!   DATABASE_URL              - Postgres connection string (postgres mode)
//!   AEVIS_ENGINES             - comma-separated engine names (simulated)
//!   AEVIS_ADAPTER_TIMEOUT_SECS / AEVIS_ADAPTER_RETRIES - orchestration tuning
//!   AEVIS_HOST / AEVIS_PORT   - bind address
//!   RUST_LOG                  - standard env filter

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use aevis_api::{build_router, AppState};
use aevis_db::memory::MemoryDatabase;
use aevis_db::Database;
use aevis_engines::EngineRegistry;
use aevis_pipeline::{CheckOrchestrator, OrchestratorConfig};

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aevis_api=debug,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = EngineRegistry::from_env();
    let config = OrchestratorConfig::from_env();
    info!(
        engine_count = registry.len(),
        adapter_timeout_secs = config.adapter_timeout.as_secs(),
        "Configured engine fan-out"
    );

    let store_mode = std::env::var("AEVIS_STORE").unwrap_or_else(|_| "postgres".to_string());
    let state = if store_mode == "memory" {
        // Demo mode: hermetic in-memory store seeded with one project so
        // the trigger endpoint is usable immediately.
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let project = db.seed_project(owner, "Example AEO", "example.com", "Example");
        let keyword = db.seed_keyword(&project, "cloud hosting");
        info!(
            user_id = %owner,
            project_id = %project.id,
            keyword_id = %keyword.id,
            "Demo store seeded"
        );

        let store = Arc::new(db.store.clone());
        let keywords = Arc::new(db.keywords.clone());
        let projects = Arc::new(db.projects.clone());
        let orchestrator = Arc::new(CheckOrchestrator::new(
            store.clone(),
            keywords.clone(),
            projects.clone(),
            registry,
            config,
        ));
        AppState {
            store,
            keywords,
            projects,
            orchestrator,
        }
    } else {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let db = Database::connect(&database_url).await?;
        db.migrate().await?;

        let store = Arc::new(db.store.clone());
        let keywords = Arc::new(db.keywords.clone());
        let projects = Arc::new(db.projects.clone());
        let orchestrator = Arc::new(CheckOrchestrator::new(
            store.clone(),
            keywords.clone(),
            projects.clone(),
            registry,
            config,
        ));
        AppState {
            store,
            keywords,
            projects,
            orchestrator,
        }
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT]),
        );

    let host = std::env::var("AEVIS_HOST")
        .unwrap_or_else(|_| aevis_core::defaults::API_HOST.to_string());
    let port = std::env::var("AEVIS_PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(aevis_core::defaults::API_PORT);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
