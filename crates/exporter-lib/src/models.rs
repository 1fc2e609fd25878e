//! Core data models for the HPA exporter
//!
//! An [`Autoscaler`] is a read-only snapshot of one HorizontalPodAutoscaler.
//! Metric sources and their targets are modelled as enums so every kind the
//! exporter understands is matched exhaustively and everything else lands in
//! an explicit `Unsupported` variant.

use crate::quantity::Quantity;
use std::collections::BTreeMap;
use std::fmt;

/// Snapshot of a HorizontalPodAutoscaler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Autoscaler {
    pub namespace: String,
    pub name: String,
    pub generation: i64,
    pub labels: BTreeMap<String, String>,
    pub max_replicas: i32,
    pub min_replicas: Option<i32>,
    pub metrics: Vec<MetricSpec>,
    pub current_replicas: i32,
    pub desired_replicas: i32,
    pub conditions: Vec<Condition>,
    pub current_metrics: Vec<MetricStatus>,
}

impl Autoscaler {
    /// Store key, `namespace/name`
    pub fn key(&self) -> String {
        object_key(&self.namespace, &self.name)
    }
}

/// Build the `namespace/name` key used by the snapshot store
pub fn object_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

/// Metric source kind, as reported in the `type` label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricSourceType {
    Resource,
    Pods,
    Object,
    External,
}

impl MetricSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSourceType::Resource => "Resource",
            MetricSourceType::Pods => "Pods",
            MetricSourceType::Object => "Object",
            MetricSourceType::External => "External",
        }
    }

    pub fn parse(kind: &str) -> Option<Self> {
        match kind {
            "Resource" => Some(MetricSourceType::Resource),
            "Pods" => Some(MetricSourceType::Pods),
            "Object" => Some(MetricSourceType::Object),
            "External" => Some(MetricSourceType::External),
            _ => None,
        }
    }
}

impl fmt::Display for MetricSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired value of a metric; the tag decides which payload is meaningful
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricTarget {
    /// Percentage of the requested resource, averaged across pods
    Utilization(Option<i32>),
    AverageValue(Option<Quantity>),
    Value(Option<Quantity>),
    /// Target type this exporter does not interpret
    Unsupported(String),
}

/// Target metric of an autoscaler, one per entry of `spec.metrics`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricSpec {
    Resource { name: String, target: MetricTarget },
    Pods { metric_name: String, target: MetricTarget },
    Object { metric_name: String, target: MetricTarget },
    External { metric_name: String, target: MetricTarget },
    /// Source kind this exporter does not interpret (e.g. `ContainerResource`)
    Unsupported(String),
}

/// Observed value channels of a metric
///
/// Channels are independent: Object and External statuses may carry both
/// `average_value` and `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricValueStatus {
    pub average_utilization: Option<i32>,
    pub average_value: Option<Quantity>,
    pub value: Option<Quantity>,
}

/// Last observed state of a metric, one per entry of `status.currentMetrics`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricStatus {
    Resource { name: String, current: MetricValueStatus },
    Pods { metric_name: String, current: MetricValueStatus },
    Object { metric_name: String, current: MetricValueStatus },
    External { metric_name: String, current: MetricValueStatus },
    Unsupported(String),
}

/// Tri-state condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl ConditionStatus {
    /// Every status value, in exposition order
    pub const ALL: [ConditionStatus; 3] = [
        ConditionStatus::True,
        ConditionStatus::False,
        ConditionStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }

    /// Parse an API status string; anything unrecognized is `Unknown`
    pub fn parse(status: &str) -> Self {
        match status {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Autoscaler condition such as `AbleToScale` or `ScalingActive`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub condition_type: String,
    pub status: ConditionStatus,
}

impl Condition {
    pub fn new(condition_type: impl Into<String>, status: ConditionStatus) -> Self {
        Self {
            condition_type: condition_type.into(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_source_type_round_trip() {
        for kind in [
            MetricSourceType::Resource,
            MetricSourceType::Pods,
            MetricSourceType::Object,
            MetricSourceType::External,
        ] {
            assert_eq!(MetricSourceType::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MetricSourceType::parse("ContainerResource"), None);
    }

    #[test]
    fn test_condition_status_parse() {
        assert_eq!(ConditionStatus::parse("True"), ConditionStatus::True);
        assert_eq!(ConditionStatus::parse("False"), ConditionStatus::False);
        assert_eq!(ConditionStatus::parse("Unknown"), ConditionStatus::Unknown);
        assert_eq!(ConditionStatus::parse("true"), ConditionStatus::Unknown);
    }

    #[test]
    fn test_autoscaler_key() {
        let hpa = Autoscaler {
            namespace: "default".to_string(),
            name: "web".to_string(),
            ..Default::default()
        };
        assert_eq!(hpa.key(), "default/web");
    }
}
