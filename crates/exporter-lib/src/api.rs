//! HTTP API for health checks and the metrics endpoint

use crate::exposition;
use crate::families::FamilyCatalog;
use crate::health::{ComponentStatus, HealthRegistry};
use crate::observability::ExporterMetrics;
use crate::store::AutoscalerStore;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: ExporterMetrics,
    pub catalog: FamilyCatalog,
    pub store: Arc<AutoscalerStore>,
}

impl AppState {
    pub fn new(
        health_registry: HealthRegistry,
        metrics: ExporterMetrics,
        catalog: FamilyCatalog,
        store: Arc<AutoscalerStore>,
    ) -> Self {
        Self {
            health_registry,
            metrics,
            catalog,
            store,
        }
    }
}

/// Health check - 200 if healthy or degraded, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check - 200 once the initial list is synced
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Autoscaler families followed by the exporter's own metrics
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    let start = Instant::now();
    let autoscalers = state.store.list();
    let families = exposition::gather(&state.catalog, &autoscalers);
    let rendered = families.len();

    let mut buffer = Vec::new();
    let encoded = exposition::encode(&families, &mut buffer)
        .and_then(|_| exposition::encode(&prometheus::gather(), &mut buffer));

    if let Err(e) = encoded {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    state.metrics.set_families_rendered(rendered as i64);
    state
        .metrics
        .observe_scrape_duration(start.elapsed().as_secs_f64());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition::content_type())],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("API server failed")?;

    Ok(())
}
