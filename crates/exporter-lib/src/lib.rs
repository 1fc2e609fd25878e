//! Library for the HorizontalPodAutoscaler metrics exporter
//!
//! This crate provides:
//! - Snapshots of autoscaler objects and their conversion from the API types
//! - Flattening of autoscaler specs, statuses and conditions into samples
//! - The ordered catalog of `kube_hpa_*` metric families
//! - Text exposition, a snapshot store and the list/watch source
//! - Health checks and observability

pub mod api;
pub mod convert;
pub mod exposition;
pub mod families;
pub mod health;
pub mod labels;
pub mod metric;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod source;
pub mod store;

pub use families::{autoscaler_metric_families, wrap_autoscaler_func, FamilyCatalog};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use metric::{Family, FamilyGenerator, Metric, MetricType};
pub use models::*;
pub use observability::{ExporterMetrics, StructuredLogger};
pub use quantity::{Quantity, QuantityError};
pub use store::AutoscalerStore;
