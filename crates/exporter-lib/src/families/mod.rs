//! Metric families generated from HorizontalPodAutoscaler snapshots
//!
//! The catalog is built once by [`autoscaler_metric_families`] and shared
//! read-only afterwards. Every generation function is wrapped by
//! [`wrap_autoscaler_func`], which prepends the `namespace` and `hpa` labels
//! to each sample.

mod condition;
mod spec;
mod status;


pub use condition::{condition_metrics, metrics_from_conditions};
pub use spec::metrics_from_specs;
pub use status::metrics_from_statuses;

use crate::labels::{kube_labels_to_prometheus_labels, DEFAULT_LABELS};
use crate::metric::{Family, FamilyGenerator, Metric, MetricType};
use crate::models::Autoscaler;
use std::sync::Arc;

pub const METADATA_GENERATION: &str = "kube_hpa_metadata_generation";
pub const SPEC_MAX_REPLICAS: &str = "kube_hpa_spec_max_replicas";
pub const SPEC_MIN_REPLICAS: &str = "kube_hpa_spec_min_replicas";
pub const SPEC_METRICS: &str = "kube_hpa_spec_metrics";
pub const STATUS_CURRENT_REPLICAS: &str = "kube_hpa_status_current_replicas";
pub const STATUS_DESIRED_REPLICAS: &str = "kube_hpa_status_desired_replicas";
pub const LABELS: &str = "kube_hpa_labels";
pub const STATUS_CONDITION: &str = "kube_hpa_status_condition";
pub const STATUS_CURRENT_METRICS: &str = "kube_hpa_status_currentmetrics";

/// Ordered, immutable set of family generators
#[derive(Debug, Clone)]
pub struct FamilyCatalog {
    generators: Arc<[FamilyGenerator]>,
}

impl FamilyCatalog {
    pub fn new(generators: Vec<FamilyGenerator>) -> Self {
        Self {
            generators: generators.into(),
        }
    }

    pub fn generators(&self) -> &[FamilyGenerator] {
        &self.generators
    }

    pub fn get(&self, name: &str) -> Option<&FamilyGenerator> {
        self.generators.iter().find(|g| g.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.generators.iter().map(|g| g.name)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Run every generator against one snapshot, in catalog order
    pub fn generate_all(&self, hpa: &Autoscaler) -> Vec<Family> {
        self.generators.iter().map(|g| g.generate(hpa)).collect()
    }
}

/// Wrap a generation function so every sample starts with the default labels
pub fn wrap_autoscaler_func<F>(f: F) -> impl Fn(&Autoscaler) -> Family + Send + Sync + 'static
where
    F: Fn(&Autoscaler) -> Family + Send + Sync + 'static,
{
    move |hpa: &Autoscaler| {
        let mut family = f(hpa);
        let default_values = [hpa.namespace.as_str(), hpa.name.as_str()];
        for metric in &mut family.metrics {
            metric.prepend_labels(&DEFAULT_LABELS, &default_values);
        }
        family
    }
}

fn gauge<F>(name: &'static str, help: &'static str, f: F) -> FamilyGenerator
where
    F: Fn(&Autoscaler) -> Family + Send + Sync + 'static,
{
    FamilyGenerator::new(name, MetricType::Gauge, help, wrap_autoscaler_func(f))
}

fn single(value: f64) -> Family {
    Family::from_metrics(vec![Metric::new(value)])
}

/// Build the autoscaler family catalog
pub fn autoscaler_metric_families() -> FamilyCatalog {
    FamilyCatalog::new(vec![
        gauge(
            METADATA_GENERATION,
            "The generation observed by the HorizontalPodAutoscaler controller.",
            |a| single(a.generation as f64),
        ),
        gauge(
            SPEC_MAX_REPLICAS,
            "Upper limit for the number of pods that can be set by the autoscaler; cannot be smaller than MinReplicas.",
            |a| single(a.max_replicas as f64),
        ),
        gauge(
            SPEC_MIN_REPLICAS,
            "Lower limit for the number of pods that can be set by the autoscaler, default 1.",
            |a| match a.min_replicas {
                Some(min) => single(min as f64),
                None => Family::from_metrics(Vec::new()),
            },
        ),
        gauge(
            SPEC_METRICS,
            "Metrics used to calculate the desired replica count",
            |a| Family::from_metrics(metrics_from_specs(&a.metrics)),
        ),
        gauge(
            STATUS_CURRENT_REPLICAS,
            "Current number of replicas of pods managed by this autoscaler.",
            |a| single(a.current_replicas as f64),
        ),
        gauge(
            STATUS_DESIRED_REPLICAS,
            "Desired number of replicas of pods managed by this autoscaler.",
            |a| single(a.desired_replicas as f64),
        ),
        gauge(
            LABELS,
            "Kubernetes labels converted to Prometheus labels.",
            |a| {
                let (label_keys, label_values) = kube_labels_to_prometheus_labels(&a.labels);
                Family::from_metrics(vec![Metric {
                    label_keys,
                    label_values,
                    value: 1.0,
                }])
            },
        ),
        gauge(
            STATUS_CONDITION,
            "The condition of this autoscaler.",
            |a| Family::from_metrics(metrics_from_conditions(&a.conditions)),
        ),
        gauge(
            STATUS_CURRENT_METRICS,
            "Current metrics is the last read state of the metrics used by this autoscaler",
            |a| Family::from_metrics(metrics_from_statuses(&a.current_metrics)),
        ),
    ])
}
