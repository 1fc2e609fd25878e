//! HPA Exporter - HorizontalPodAutoscaler metrics for Prometheus
//!
//! Watches autoscalers through the Kubernetes API and serves their state
//! as `kube_hpa_*` gauges on `/metrics`.

use anyhow::{anyhow, Context, Result};
use exporter_lib::{
    api,
    health::HealthRegistry,
    observability::{ExporterMetrics, StructuredLogger},
    source::{AutoscalerWatcher, StoreUpdater},
    store::AutoscalerStore,
};
use std::future::Future;
use std::sync::Arc;
use tokio::{
    sync::broadcast,
    task::{JoinError, JoinHandle},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = config::ExporterConfig::load()?;
    let namespace = config.watch_namespace().map(str::to_string);
    info!(node_name = %config.node_name, namespace = ?namespace, "Exporter configured");

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = ExporterMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);

    // Built once, shared read-only by every scrape
    let catalog = exporter_lib::autoscaler_metric_families();
    logger.log_startup(EXPORTER_VERSION, namespace.as_deref(), catalog.len());

    let store = Arc::new(AutoscalerStore::new());
    let client = kube::Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let updater = StoreUpdater::new(
        Arc::clone(&store),
        health_registry.clone(),
        metrics.clone(),
        logger.clone(),
    );
    let watcher = AutoscalerWatcher::new(client, namespace, updater);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics.clone(),
        catalog,
        store,
    ));

    let (shutdown_tx, _) = broadcast::channel(1);
    let mut watcher_handle = tokio::spawn(watcher.run(shutdown_tx.subscribe()));
    let mut api_handle = tokio::spawn(api::serve(config.port, app_state));

    let outcome = supervise(
        tokio::signal::ctrl_c(),
        &mut watcher_handle,
        &mut api_handle,
        &logger,
    )
    .await;

    let _ = shutdown_tx.send(());
    api_handle.abort();
    info!("Shutting down");

    outcome
}

type TaskHandle = JoinHandle<Result<()>>;

/// Wait for the shutdown signal or for the first background task to stop.
///
/// Only the shutdown signal counts as a clean exit: the watcher and the API
/// server are expected to run until told otherwise.
async fn supervise(
    shutdown: impl Future<Output = std::io::Result<()>>,
    watcher_handle: &mut TaskHandle,
    api_handle: &mut TaskHandle,
    logger: &StructuredLogger,
) -> Result<()> {
    tokio::select! {
        res = shutdown => {
            res.context("Failed to listen for shutdown signal")?;
            logger.log_shutdown("SIGINT received");
            Ok(())
        }
        res = watcher_handle => {
            logger.log_shutdown("watcher exited");
            task_exit("Autoscaler watcher", res)
        }
        res = api_handle => {
            logger.log_shutdown("API server exited");
            task_exit("API server", res)
        }
    }
}

fn task_exit(task: &str, res: std::result::Result<Result<()>, JoinError>) -> Result<()> {
    let err = match res {
        Ok(Ok(())) => anyhow!("{} exited unexpectedly", task),
        Ok(Err(e)) => e.context(format!("{} failed", task)),
        Err(e) => anyhow::Error::new(e).context(format!("{} task panicked", task)),
    };
    error!(task, error = %format!("{:#}", err), "Background task stopped");
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    fn idle_task() -> TaskHandle {
        tokio::spawn(pending::<Result<()>>())
    }

    async fn crashing_task() -> Result<()> {
        panic!("watch loop crashed")
    }

    #[tokio::test]
    async fn test_shutdown_signal_is_clean_exit() {
        let logger = StructuredLogger::new("test-node");
        let mut watcher = idle_task();
        let mut api = idle_task();

        let outcome = supervise(async { Ok(()) }, &mut watcher, &mut api, &logger).await;

        assert!(outcome.is_ok());
        watcher.abort();
        api.abort();
    }

    #[tokio::test]
    async fn test_api_server_failure_is_returned() {
        let logger = StructuredLogger::new("test-node");
        let mut watcher = idle_task();
        let mut api: TaskHandle =
            tokio::spawn(async { Err(anyhow!("Failed to bind 0.0.0.0:8080")) });

        let err = supervise(pending(), &mut watcher, &mut api, &logger)
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.starts_with("API server failed"));
        assert!(message.contains("Failed to bind 0.0.0.0:8080"));
        watcher.abort();
    }

    #[tokio::test]
    async fn test_watcher_panic_is_returned() {
        let logger = StructuredLogger::new("test-node");
        let mut watcher = tokio::spawn(crashing_task());
        let mut api = idle_task();

        let err = supervise(pending(), &mut watcher, &mut api, &logger)
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).starts_with("Autoscaler watcher task panicked"));
        api.abort();
    }

    #[tokio::test]
    async fn test_task_returning_early_is_an_error() {
        let logger = StructuredLogger::new("test-node");
        let mut watcher: TaskHandle = tokio::spawn(async { Ok(()) });
        let mut api = idle_task();

        let err = supervise(pending(), &mut watcher, &mut api, &logger)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Autoscaler watcher exited unexpectedly");
        api.abort();
    }
}
