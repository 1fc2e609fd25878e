//! Samples for `status.currentMetrics`

use crate::labels::{
    target_types, METRIC_NAME_LABEL, NAME_LABEL, TARGET_TYPE_LABEL, TYPE_LABEL,
};
use crate::metric::Metric;
use crate::models::{MetricSourceType, MetricStatus, MetricValueStatus};

/// Flatten observed metrics into samples
///
/// Resource and Pods statuses yield at most one sample. Object and External
/// statuses report `AverageValue` and `Value` as independent channels and may
/// yield two.
pub fn metrics_from_statuses(statuses: &[MetricStatus]) -> Vec<Metric> {
    let mut out = Vec::with_capacity(statuses.len());

    for status in statuses {
        match status {
            MetricStatus::Resource { name, current } => {
                let observed = current
                    .average_utilization
                    .map(|v| (target_types::AVERAGE_UTILIZATION, v as f64))
                    .or_else(|| average_value(current));
                if let Some((target_type, value)) = observed {
                    out.push(status_metric(
                        MetricSourceType::Resource,
                        NAME_LABEL,
                        name,
                        target_type,
                        value,
                    ));
                }
            }
            MetricStatus::Pods {
                metric_name,
                current,
            } => {
                if let Some((target_type, value)) = average_value(current) {
                    out.push(status_metric(
                        MetricSourceType::Pods,
                        METRIC_NAME_LABEL,
                        metric_name,
                        target_type,
                        value,
                    ));
                }
            }
            MetricStatus::Object {
                metric_name,
                current,
            } => push_value_channels(&mut out, MetricSourceType::Object, metric_name, current),
            MetricStatus::External {
                metric_name,
                current,
            } => push_value_channels(&mut out, MetricSourceType::External, metric_name, current),
            MetricStatus::Unsupported(_) => {}
        }
    }

    out
}

/// Emit one sample per populated channel, `AverageValue` first
fn push_value_channels(
    out: &mut Vec<Metric>,
    kind: MetricSourceType,
    metric_name: &str,
    current: &MetricValueStatus,
) {
    if let Some((target_type, value)) = average_value(current) {
        out.push(status_metric(
            kind,
            METRIC_NAME_LABEL,
            metric_name,
            target_type,
            value,
        ));
    }
    if let Some(quantity) = current.value {
        out.push(status_metric(
            kind,
            METRIC_NAME_LABEL,
            metric_name,
            target_types::VALUE,
            quantity.as_f64(),
        ));
    }
}

fn average_value(current: &MetricValueStatus) -> Option<(&'static str, f64)> {
    current
        .average_value
        .map(|q| (target_types::AVERAGE_VALUE, q.as_f64()))
}

fn status_metric(
    kind: MetricSourceType,
    name_label: &str,
    name: &str,
    target_type: &str,
    value: f64,
) -> Metric {
    Metric::new(value)
        .with_label(TYPE_LABEL, kind.as_str())
        .with_label(name_label, name)
        .with_label(TARGET_TYPE_LABEL, target_type)
}
