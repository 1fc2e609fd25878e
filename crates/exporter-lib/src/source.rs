//! Autoscaler list/watch source
//!
//! Streams HorizontalPodAutoscaler objects from the API server and keeps the
//! [`AutoscalerStore`] in sync. Reconnects use the watcher's default backoff.

use crate::health::{components, HealthRegistry};
use crate::models::Autoscaler;
use crate::observability::{watch_events, ExporterMetrics, StructuredLogger};
use crate::store::AutoscalerStore;
use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Applies watch events to the store and reports progress
#[derive(Clone)]
pub struct StoreUpdater {
    store: Arc<AutoscalerStore>,
    health: HealthRegistry,
    metrics: ExporterMetrics,
    logger: StructuredLogger,
}

impl StoreUpdater {
    pub fn new(
        store: Arc<AutoscalerStore>,
        health: HealthRegistry,
        metrics: ExporterMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            store,
            health,
            metrics,
            logger,
        }
    }

    /// Apply one watch event
    pub async fn handle_event(&self, event: watcher::Event<HorizontalPodAutoscaler>) {
        match event {
            watcher::Event::Applied(hpa) => {
                debug!(namespace = ?hpa.namespace(), name = %hpa.name_any(), "Autoscaler applied");
                self.store.apply(Autoscaler::from(&hpa));
                self.metrics.inc_watch_event(watch_events::APPLIED);
            }
            watcher::Event::Deleted(hpa) => {
                let namespace = hpa.namespace().unwrap_or_default();
                debug!(namespace = %namespace, name = %hpa.name_any(), "Autoscaler deleted");
                self.store.delete(&namespace, &hpa.name_any());
                self.metrics.inc_watch_event(watch_events::DELETED);
            }
            watcher::Event::Restarted(hpas) => {
                self.store.replace_all(hpas.iter().map(Autoscaler::from));
                self.metrics.inc_watch_event(watch_events::RESTARTED);
                self.logger.log_watch_restarted(hpas.len());
                self.health.set_synced(true).await;
            }
        }

        self.metrics.set_autoscalers_tracked(self.store.len() as i64);
        self.health.set_healthy(components::WATCHER).await;
    }

    /// Record a watch stream error; the stream keeps retrying
    pub async fn handle_error(&self, error: &watcher::Error) {
        self.logger.log_watch_error(&error.to_string());
        self.metrics.inc_watch_errors();
        self.health
            .set_degraded(components::WATCHER, error.to_string())
            .await;
    }
}

/// Watches autoscalers in one namespace, or all namespaces
pub struct AutoscalerWatcher {
    client: Client,
    namespace: Option<String>,
    updater: StoreUpdater,
}

impl AutoscalerWatcher {
    pub fn new(client: Client, namespace: Option<String>, updater: StoreUpdater) -> Self {
        Self {
            client,
            namespace,
            updater,
        }
    }

    fn api(&self) -> Api<HorizontalPodAutoscaler> {
        match &self.namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        }
    }

    /// Run until shutdown or until the watch stream ends
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        info!(namespace = ?self.namespace, "Starting autoscaler watcher");

        let mut stream = watcher(self.api(), watcher::Config::default())
            .default_backoff()
            .boxed();

        loop {
            tokio::select! {
                item = stream.next() => match item {
                    Some(Ok(event)) => self.updater.handle_event(event).await,
                    Some(Err(e)) => self.updater.handle_error(&e).await,
                    None => {
                        self.updater
                            .health
                            .set_unhealthy(components::WATCHER, "Watch stream ended")
                            .await;
                        anyhow::bail!("autoscaler watch stream ended");
                    }
                },
                _ = shutdown.recv() => {
                    info!("Shutting down autoscaler watcher");
                    break;
                }
            }
        }

        Ok(())
    }
}
