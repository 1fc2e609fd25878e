//! Label names and conversion of Kubernetes labels to Prometheus labels

use std::collections::{BTreeMap, HashSet};

/// Labels prepended to every autoscaler sample, in order
pub const DEFAULT_LABELS: [&str; 2] = [NAMESPACE_LABEL, HPA_LABEL];

pub const NAMESPACE_LABEL: &str = "namespace";
pub const HPA_LABEL: &str = "hpa";

pub const TYPE_LABEL: &str = "type";
pub const NAME_LABEL: &str = "name";
pub const METRIC_NAME_LABEL: &str = "metric_name";
pub const TARGET_TYPE_LABEL: &str = "target_type";
pub const CONDITION_LABEL: &str = "condition";
pub const STATUS_LABEL: &str = "status";

/// Prefix applied to every converted Kubernetes label key
pub const KUBE_LABEL_PREFIX: &str = "label_";

/// `target_type` label values
pub mod target_types {
    pub const AVERAGE_UTILIZATION: &str = "AverageUtilization";
    pub const AVERAGE_VALUE: &str = "AverageValue";
    pub const VALUE: &str = "Value";
}

/// Convert Kubernetes labels into aligned Prometheus label keys and values
///
/// Keys are visited in sorted order, sanitized and prefixed with
/// [`KUBE_LABEL_PREFIX`]. When two keys sanitize to the same name only the
/// first one is kept.
pub fn kube_labels_to_prometheus_labels(
    labels: &BTreeMap<String, String>,
) -> (Vec<String>, Vec<String>) {
    let mut keys = Vec::with_capacity(labels.len());
    let mut values = Vec::with_capacity(labels.len());
    let mut seen = HashSet::with_capacity(labels.len());

    for (key, value) in labels {
        let label_name = format!("{}{}", KUBE_LABEL_PREFIX, sanitize_label_name(key));
        if !seen.insert(label_name.clone()) {
            tracing::debug!(key = %key, label = %label_name, "Dropping colliding label");
            continue;
        }
        keys.push(label_name);
        values.push(value.clone());
    }

    (keys, values)
}

/// Replace every character outside `[a-zA-Z0-9_]` with `_`
pub fn sanitize_label_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
