//! Conversion from Kubernetes API objects into [`Autoscaler`] snapshots
//!
//! Conversion never fails. Missing sections become defaults, unknown kinds
//! become `Unsupported`, and quantities that cannot be parsed are treated as
//! absent.

use crate::models::{
    Autoscaler, Condition, ConditionStatus, MetricSourceType, MetricSpec, MetricStatus,
    MetricTarget, MetricValueStatus,
};
use crate::quantity::Quantity;
use k8s_openapi::api::autoscaling::v2 as api;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity as ApiQuantity;
use tracing::debug;

impl From<&api::HorizontalPodAutoscaler> for Autoscaler {
    fn from(hpa: &api::HorizontalPodAutoscaler) -> Self {
        let meta = &hpa.metadata;
        let mut snapshot = Autoscaler {
            namespace: meta.namespace.clone().unwrap_or_default(),
            name: meta.name.clone().unwrap_or_default(),
            generation: meta.generation.unwrap_or_default(),
            labels: meta.labels.clone().unwrap_or_default(),
            ..Default::default()
        };

        if let Some(spec) = &hpa.spec {
            snapshot.max_replicas = spec.max_replicas;
            snapshot.min_replicas = spec.min_replicas;
            snapshot.metrics = spec
                .metrics
                .iter()
                .flatten()
                .map(convert_metric_spec)
                .collect();
        }

        if let Some(status) = &hpa.status {
            snapshot.current_replicas = status.current_replicas.unwrap_or_default();
            snapshot.desired_replicas = status.desired_replicas;
            snapshot.conditions = status
                .conditions
                .iter()
                .flatten()
                .map(|c| Condition::new(c.type_.clone(), ConditionStatus::parse(&c.status)))
                .collect();
            snapshot.current_metrics = status
                .current_metrics
                .iter()
                .flatten()
                .map(convert_metric_status)
                .collect();
        }

        snapshot
    }
}

impl From<api::HorizontalPodAutoscaler> for Autoscaler {
    fn from(hpa: api::HorizontalPodAutoscaler) -> Self {
        Autoscaler::from(&hpa)
    }
}

fn convert_metric_spec(spec: &api::MetricSpec) -> MetricSpec {
    let converted = match MetricSourceType::parse(&spec.type_) {
        Some(MetricSourceType::Resource) => spec.resource.as_ref().map(|r| MetricSpec::Resource {
            name: r.name.clone(),
            target: convert_target(&r.target),
        }),
        Some(MetricSourceType::Pods) => spec.pods.as_ref().map(|p| MetricSpec::Pods {
            metric_name: p.metric.name.clone(),
            target: convert_target(&p.target),
        }),
        Some(MetricSourceType::Object) => spec.object.as_ref().map(|o| MetricSpec::Object {
            metric_name: o.metric.name.clone(),
            target: convert_target(&o.target),
        }),
        Some(MetricSourceType::External) => {
            spec.external.as_ref().map(|e| MetricSpec::External {
                metric_name: e.metric.name.clone(),
                target: convert_target(&e.target),
            })
        }
        None => None,
    };

    converted.unwrap_or_else(|| MetricSpec::Unsupported(spec.type_.clone()))
}

fn convert_target(target: &api::MetricTarget) -> MetricTarget {
    match target.type_.as_str() {
        "Utilization" => MetricTarget::Utilization(target.average_utilization),
        "AverageValue" => MetricTarget::AverageValue(parse_quantity(target.average_value.as_ref())),
        "Value" => MetricTarget::Value(parse_quantity(target.value.as_ref())),
        other => MetricTarget::Unsupported(other.to_string()),
    }
}

fn convert_metric_status(status: &api::MetricStatus) -> MetricStatus {
    let converted = match MetricSourceType::parse(&status.type_) {
        Some(MetricSourceType::Resource) => {
            status.resource.as_ref().map(|r| MetricStatus::Resource {
                name: r.name.clone(),
                current: convert_value_status(&r.current),
            })
        }
        Some(MetricSourceType::Pods) => status.pods.as_ref().map(|p| MetricStatus::Pods {
            metric_name: p.metric.name.clone(),
            current: convert_value_status(&p.current),
        }),
        Some(MetricSourceType::Object) => status.object.as_ref().map(|o| MetricStatus::Object {
            metric_name: o.metric.name.clone(),
            current: convert_value_status(&o.current),
        }),
        Some(MetricSourceType::External) => {
            status.external.as_ref().map(|e| MetricStatus::External {
                metric_name: e.metric.name.clone(),
                current: convert_value_status(&e.current),
            })
        }
        None => None,
    };

    converted.unwrap_or_else(|| MetricStatus::Unsupported(status.type_.clone()))
}

fn convert_value_status(current: &api::MetricValueStatus) -> MetricValueStatus {
    MetricValueStatus {
        average_utilization: current.average_utilization,
        average_value: parse_quantity(current.average_value.as_ref()),
        value: parse_quantity(current.value.as_ref()),
    }
}

fn parse_quantity(quantity: Option<&ApiQuantity>) -> Option<Quantity> {
    let raw = &quantity?.0;
    match raw.parse() {
        Ok(q) => Some(q),
        Err(e) => {
            debug!(quantity = %raw, error = %e, "Ignoring unparsable quantity");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hpa(value: serde_json::Value) -> api::HorizontalPodAutoscaler {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_full_object() {
        let obj = hpa(json!({
            "apiVersion": "autoscaling/v2",
            "kind": "HorizontalPodAutoscaler",
            "metadata": {
                "namespace": "default",
                "name": "web",
                "generation": 3,
                "labels": { "app": "web" }
            },
            "spec": {
                "scaleTargetRef": { "apiVersion": "apps/v1", "kind": "Deployment", "name": "web" },
                "minReplicas": 1,
                "maxReplicas": 5,
                "metrics": [
                    {
                        "type": "Resource",
                        "resource": {
                            "name": "cpu",
                            "target": { "type": "Utilization", "averageUtilization": 70 }
                        }
                    },
                    {
                        "type": "Pods",
                        "pods": {
                            "metric": { "name": "packets-per-second" },
                            "target": { "type": "AverageValue", "averageValue": "1500m" }
                        }
                    }
                ]
            },
            "status": {
                "currentReplicas": 2,
                "desiredReplicas": 3,
                "conditions": [
                    { "type": "AbleToScale", "status": "True" },
                    { "type": "ScalingActive", "status": "Bogus" }
                ],
                "currentMetrics": [
                    {
                        "type": "Object",
                        "object": {
                            "describedObject": { "kind": "Ingress", "name": "main" },
                            "metric": { "name": "requests-per-second" },
                            "current": { "averageValue": "2", "value": "500m" }
                        }
                    }
                ]
            }
        }));

        let snapshot = Autoscaler::from(&obj);

        assert_eq!(snapshot.namespace, "default");
        assert_eq!(snapshot.name, "web");
        assert_eq!(snapshot.generation, 3);
        assert_eq!(snapshot.labels.get("app").map(String::as_str), Some("web"));
        assert_eq!(snapshot.min_replicas, Some(1));
        assert_eq!(snapshot.max_replicas, 5);
        assert_eq!(
            snapshot.metrics,
            vec![
                MetricSpec::Resource {
                    name: "cpu".to_string(),
                    target: MetricTarget::Utilization(Some(70)),
                },
                MetricSpec::Pods {
                    metric_name: "packets-per-second".to_string(),
                    target: MetricTarget::AverageValue(Some(Quantity::from_milli(1500))),
                },
            ]
        );
        assert_eq!(snapshot.current_replicas, 2);
        assert_eq!(snapshot.desired_replicas, 3);
        assert_eq!(
            snapshot.conditions,
            vec![
                Condition::new("AbleToScale", ConditionStatus::True),
                Condition::new("ScalingActive", ConditionStatus::Unknown),
            ]
        );
        assert_eq!(
            snapshot.current_metrics,
            vec![MetricStatus::Object {
                metric_name: "requests-per-second".to_string(),
                current: MetricValueStatus {
                    average_utilization: None,
                    average_value: Some(Quantity::from_milli(2000)),
                    value: Some(Quantity::from_milli(500)),
                },
            }]
        );
    }

    #[test]
    fn test_convert_minimal_object() {
        let snapshot = Autoscaler::from(hpa(json!({
            "apiVersion": "autoscaling/v2",
            "kind": "HorizontalPodAutoscaler",
            "metadata": { "name": "bare" }
        })));

        assert_eq!(snapshot.name, "bare");
        assert_eq!(snapshot.namespace, "");
        assert_eq!(snapshot.min_replicas, None);
        assert!(snapshot.metrics.is_empty());
        assert!(snapshot.conditions.is_empty());
    }

    #[test]
    fn test_target_carries_only_tagged_field() {
        let target: api::MetricTarget = serde_json::from_value(json!({
            "type": "Utilization",
            "averageValue": "3"
        }))
        .unwrap();

        assert_eq!(convert_target(&target), MetricTarget::Utilization(None));
    }

    #[test]
    fn test_unknown_kinds_are_unsupported() {
        let spec: api::MetricSpec = serde_json::from_value(json!({
            "type": "ContainerResource",
            "containerResource": {
                "name": "cpu",
                "container": "app",
                "target": { "type": "Utilization", "averageUtilization": 50 }
            }
        }))
        .unwrap();
        assert_eq!(
            convert_metric_spec(&spec),
            MetricSpec::Unsupported("ContainerResource".to_string())
        );

        // Declared kind without its payload
        let spec: api::MetricSpec = serde_json::from_value(json!({ "type": "External" })).unwrap();
        assert_eq!(
            convert_metric_spec(&spec),
            MetricSpec::Unsupported("External".to_string())
        );
    }

    #[test]
    fn test_unparsable_quantity_is_absent() {
        let current: api::MetricValueStatus = serde_json::from_value(json!({
            "averageValue": "lots",
            "value": "1Ki"
        }))
        .unwrap();

        let converted = convert_value_status(&current);
        assert_eq!(converted.average_value, None);
        assert_eq!(converted.value, Some(Quantity::from_milli(1_024_000)));
    }
}
