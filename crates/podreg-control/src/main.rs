//! podreg control service.
//!
//! Runs the pod coordinator over a `RocksDB` registry and serves health
//! endpoints.
//!
//! # HTTP Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /ready` - Readiness check (lists pods through the coordinator)

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use podreg_control::{ControlConfig, HttpPodInfoGetter, PodInfoCache, PodInfoGetter, PodStorage};
use podreg_core::Selector;
use podreg_scheduler::{
    FirstFitScheduler, KubeCloud, KubeNodes, MinionLister, StaticMinionLister,
};
use podreg_store::{Registry, RocksRegistry};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    storage: PodStorage,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "podreg-control",
    })
}

async fn ready_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.storage.list(&Selector::everything()).await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "registry unavailable")
        }
    }
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,podreg=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting podreg control service");

    let config = ControlConfig::from_env();

    let registry: Arc<dyn Registry> = Arc::new(RocksRegistry::open(&config.data_dir)?);
    tracing::info!(data_dir = %config.data_dir, "Initialized RocksDB registry");

    // Cluster nodes back both the minion list and address lookups when
    // reachable.
    let nodes = match KubeNodes::try_default().await {
        Ok(nodes) => Some(nodes),
        Err(e) => {
            tracing::warn!(error = %e, "Kubernetes unavailable, host addresses will not be resolved");
            None
        }
    };

    let minions: Arc<dyn MinionLister> = match (&config.minions, &nodes) {
        (Some(list), _) => Arc::new(StaticMinionLister::new(list.clone())),
        (None, Some(nodes)) => Arc::new(nodes.clone()),
        (None, None) => return Err("no MINIONS configured and Kubernetes is unavailable".into()),
    };

    let live: Arc<dyn PodInfoGetter> =
        Arc::new(HttpPodInfoGetter::new(config.info_port, config.info_timeout())?);
    let cache = Arc::new(PodInfoCache::new());
    tokio::spawn(Arc::clone(&cache).run_refresher(
        Arc::clone(&registry),
        Arc::clone(&live),
        config.cache_refresh(),
    ));

    let mut builder = PodStorage::builder(
        Arc::clone(&registry),
        Arc::new(FirstFitScheduler::new(Arc::clone(&registry))),
        minions,
    )
    .info_cache(cache)
    .live_info(live)
    .poll_period(config.poll_period())
    .max_poll_attempts(config.max_poll_attempts);
    if let Some(nodes) = nodes {
        builder = builder.cloud(Arc::new(KubeCloud::new(nodes)));
    }
    let storage = builder.build();

    let app = create_router(AppState { storage });

    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
