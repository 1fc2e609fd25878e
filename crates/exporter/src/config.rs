//! Exporter configuration

use anyhow::{Context, Result};
use serde::Deserialize;

/// Exporter configuration, read from `EXPORTER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// Node name from Kubernetes downward API
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// HTTP port for health and metrics
    #[serde(default = "default_port")]
    pub port: u16,

    /// Namespace to watch; empty watches all namespaces
    #[serde(default)]
    pub namespace: String,
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_port() -> u16 {
    8080
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            port: default_port(),
            namespace: String::new(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("EXPORTER"))
            .build()
            .context("Failed to read exporter configuration")?;

        config
            .try_deserialize()
            .context("Invalid exporter configuration")
    }

    /// Namespace scope, `None` for all namespaces
    pub fn watch_namespace(&self) -> Option<&str> {
        match self.namespace.trim() {
            "" => None,
            ns => Some(ns),
        }
    }
}
