//! Prometheus text exposition of generated families

use crate::families::FamilyCatalog;
use crate::metric::{Metric, MetricType};
use crate::models::Autoscaler;
use prometheus::proto;
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while encoding the exposition
#[derive(Debug, Error)]
pub enum ExpositionError {
    #[error("failed to encode metric families: {0}")]
    Encode(#[from] prometheus::Error),
}

/// Content type of the text exposition
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Build one protobuf family per catalog entry across all snapshots
///
/// Families are returned in catalog order; samples follow snapshot order.
/// Families without samples are left out.
pub fn gather(catalog: &FamilyCatalog, autoscalers: &[Arc<Autoscaler>]) -> Vec<proto::MetricFamily> {
    let mut out = Vec::with_capacity(catalog.len());

    for generator in catalog.generators() {
        let mut family = proto::MetricFamily::default();
        family.set_name(generator.name.to_string());
        family.set_help(generator.help.to_string());
        family.set_field_type(proto_type(generator.metric_type));

        for autoscaler in autoscalers {
            for metric in generator.generate(autoscaler).metrics {
                family.mut_metric().push(proto_metric(&metric));
            }
        }

        if !family.get_metric().is_empty() {
            out.push(family);
        }
    }

    out
}

/// Encode families in the text exposition format
pub fn encode(families: &[proto::MetricFamily], buf: &mut Vec<u8>) -> Result<(), ExpositionError> {
    TextEncoder::new().encode(families, buf)?;
    Ok(())
}

fn proto_type(metric_type: MetricType) -> proto::MetricType {
    match metric_type {
        MetricType::Gauge => proto::MetricType::GAUGE,
    }
}

fn proto_metric(metric: &Metric) -> proto::Metric {
    let mut out = proto::Metric::default();
    for (key, value) in metric.labels() {
        let mut pair = proto::LabelPair::default();
        pair.set_name(key.to_string());
        pair.set_value(value.to_string());
        out.mut_label().push(pair);
    }

    let mut gauge = proto::Gauge::default();
    gauge.set_value(metric.value);
    out.set_gauge(gauge);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::autoscaler_metric_families;
    use crate::models::{Condition, ConditionStatus, MetricSpec, MetricTarget};
    use crate::quantity::Quantity;

    fn autoscaler(namespace: &str, name: &str) -> Arc<Autoscaler> {
        Arc::new(Autoscaler {
            namespace: namespace.to_string(),
            name: name.to_string(),
            generation: 2,
            max_replicas: 6,
            min_replicas: Some(1),
            metrics: vec![MetricSpec::Resource {
                name: "memory".to_string(),
                target: MetricTarget::AverageValue(Some(Quantity::from_milli(1500))),
            }],
            current_replicas: 2,
            desired_replicas: 2,
            conditions: vec![Condition::new("AbleToScale", ConditionStatus::True)],
            ..Default::default()
        })
    }

    fn render_string(autoscalers: &[Arc<Autoscaler>]) -> String {
        let mut buf = Vec::new();
        encode(&gather(&autoscaler_metric_families(), autoscalers), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_text_format() {
        let text = render_string(&[autoscaler("default", "web")]);

        assert!(text.contains(
            "# HELP kube_hpa_spec_max_replicas Upper limit for the number of pods that can be set by the autoscaler; cannot be smaller than MinReplicas.\n"
        ));
        assert!(text.contains("# TYPE kube_hpa_spec_max_replicas gauge\n"));
        assert!(text.contains("kube_hpa_spec_max_replicas{namespace=\"default\",hpa=\"web\"} 6\n"));
        assert!(text.contains(
            "kube_hpa_spec_metrics{namespace=\"default\",hpa=\"web\",type=\"Resource\",name=\"memory\",target_type=\"AverageValue\"} 1.5\n"
        ));
        assert!(text.contains(
            "kube_hpa_status_condition{namespace=\"default\",hpa=\"web\",condition=\"AbleToScale\",status=\"Unknown\"} 0\n"
        ));
    }

    #[test]
    fn test_empty_families_are_skipped() {
        let text = render_string(&[autoscaler("default", "web")]);
        assert!(!text.contains("kube_hpa_status_currentmetrics"));

        assert!(render_string(&[]).is_empty());
    }

    #[test]
    fn test_families_merge_across_snapshots() {
        let families = gather(
            &autoscaler_metric_families(),
            &[autoscaler("a", "one"), autoscaler("b", "two")],
        );

        let generation = families
            .iter()
            .find(|f| f.get_name() == "kube_hpa_metadata_generation")
            .unwrap();
        assert_eq!(generation.get_metric().len(), 2);
        assert_eq!(generation.get_metric()[1].get_label()[1].get_value(), "two");

        let names: Vec<&str> = families.iter().map(|f| f.get_name()).collect();
        assert_eq!(names.first(), Some(&"kube_hpa_metadata_generation"));
        assert_eq!(names.iter().filter(|n| **n == "kube_hpa_labels").count(), 1);
    }

    #[test]
    fn test_exposition_is_idempotent() {
        let autoscalers = [autoscaler("default", "web")];
        assert_eq!(render_string(&autoscalers), render_string(&autoscalers));
    }

    #[test]
    fn test_label_values_are_escaped() {
        let mut hpa = (*autoscaler("default", "web")).clone();
        hpa.labels
            .insert("note".to_string(), "say \"hi\"".to_string());

        let text = render_string(&[Arc::new(hpa)]);
        assert!(text.contains("label_note=\"say \\\"hi\\\"\""));
    }
}
