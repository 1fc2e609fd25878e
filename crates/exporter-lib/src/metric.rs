//! Metric records, families and family generators
//!
//! A [`FamilyGenerator`] binds a metric name, type and help text to a
//! function that turns one [`Autoscaler`] snapshot into a [`Family`].

use crate::models::Autoscaler;
use std::fmt;

/// Exposition type of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled sample
///
/// `label_keys` and `label_values` are positionally aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label_keys: Vec<String>,
    pub label_values: Vec<String>,
    pub value: f64,
}

impl Metric {
    /// A sample without labels
    pub fn new(value: f64) -> Self {
        Self {
            label_keys: Vec::new(),
            label_values: Vec::new(),
            value,
        }
    }

    /// Append a label pair, keeping keys and values aligned
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push_label(key, value);
        self
    }

    pub fn push_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.label_keys.push(key.into());
        self.label_values.push(value.into());
    }

    /// Prepend label pairs in order, ahead of the existing labels
    pub fn prepend_labels(&mut self, keys: &[&str], values: &[&str]) {
        self.label_keys
            .splice(0..0, keys.iter().map(|k| k.to_string()));
        self.label_values
            .splice(0..0, values.iter().map(|v| v.to_string()));
    }

    /// Iterate over `(key, value)` pairs
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.label_keys
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Look up a label value by key
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// A named group of samples sharing type and help text
#[derive(Debug, Clone, PartialEq)]
pub struct Family {
    pub name: String,
    pub metric_type: MetricType,
    pub help: String,
    pub metrics: Vec<Metric>,
}

impl Family {
    /// An unnamed family; [`FamilyGenerator::generate`] fills in the metadata
    pub fn from_metrics(metrics: Vec<Metric>) -> Self {
        Self {
            name: String::new(),
            metric_type: MetricType::Gauge,
            help: String::new(),
            metrics,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Function producing one family from one snapshot
pub type GenerateFn = Box<dyn Fn(&Autoscaler) -> Family + Send + Sync>;

/// A named metric definition
pub struct FamilyGenerator {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    generate_fn: GenerateFn,
}

impl FamilyGenerator {
    pub fn new<F>(name: &'static str, metric_type: MetricType, help: &'static str, f: F) -> Self
    where
        F: Fn(&Autoscaler) -> Family + Send + Sync + 'static,
    {
        Self {
            name,
            metric_type,
            help,
            generate_fn: Box::new(f),
        }
    }

    /// Run the generation function and stamp the family with this definition
    pub fn generate(&self, hpa: &Autoscaler) -> Family {
        let mut family = (self.generate_fn)(hpa);
        family.name = self.name.to_string();
        family.metric_type = self.metric_type;
        family.help = self.help.to_string();
        family
    }
}

impl fmt::Debug for FamilyGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyGenerator")
            .field("name", &self.name)
            .field("metric_type", &self.metric_type)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}
