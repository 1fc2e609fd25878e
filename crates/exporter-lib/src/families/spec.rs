//! Samples for `spec.metrics`

use crate::labels::{
    target_types, METRIC_NAME_LABEL, NAME_LABEL, TARGET_TYPE_LABEL, TYPE_LABEL,
};
use crate::metric::Metric;
use crate::models::{MetricSourceType, MetricSpec, MetricTarget};

/// Flatten target metrics into samples, at most one per entry
///
/// Entries whose target payload is missing, or whose target type is not
/// valid for the source kind, are skipped.
pub fn metrics_from_specs(specs: &[MetricSpec]) -> Vec<Metric> {
    specs.iter().filter_map(metric_from_spec).collect()
}

fn metric_from_spec(spec: &MetricSpec) -> Option<Metric> {
    let (kind, name_label, name, target) = match spec {
        MetricSpec::Resource { name, target } => {
            (MetricSourceType::Resource, NAME_LABEL, name, target)
        }
        MetricSpec::Pods {
            metric_name,
            target,
        } => (MetricSourceType::Pods, METRIC_NAME_LABEL, metric_name, target),
        MetricSpec::Object {
            metric_name,
            target,
        } => (MetricSourceType::Object, METRIC_NAME_LABEL, metric_name, target),
        MetricSpec::External {
            metric_name,
            target,
        } => (
            MetricSourceType::External,
            METRIC_NAME_LABEL,
            metric_name,
            target,
        ),
        MetricSpec::Unsupported(_) => return None,
    };

    let (target_type, value) = target_value(kind, target)?;

    Some(
        Metric::new(value)
            .with_label(TYPE_LABEL, kind.as_str())
            .with_label(name_label, name.as_str())
            .with_label(TARGET_TYPE_LABEL, target_type),
    )
}

/// Resolve the `target_type` label and value for a target of the given kind
fn target_value(kind: MetricSourceType, target: &MetricTarget) -> Option<(&'static str, f64)> {
    use MetricSourceType::*;

    match (kind, target) {
        (Resource, MetricTarget::Utilization(utilization)) => {
            utilization.map(|v| (target_types::AVERAGE_UTILIZATION, v as f64))
        }
        (_, MetricTarget::AverageValue(quantity)) => {
            quantity.map(|q| (target_types::AVERAGE_VALUE, q.as_f64()))
        }
        (Object | External, MetricTarget::Value(quantity)) => {
            quantity.map(|q| (target_types::VALUE, q.as_f64()))
        }
        (Pods | Object | External, MetricTarget::Utilization(_))
        | (Resource | Pods, MetricTarget::Value(_))
        | (_, MetricTarget::Unsupported(_)) => None,
    }
}
