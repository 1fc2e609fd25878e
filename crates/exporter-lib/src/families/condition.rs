//! Fan-out of autoscaler conditions into one indicator per status value

use crate::labels::{CONDITION_LABEL, STATUS_LABEL};
use crate::metric::Metric;
use crate::models::{Condition, ConditionStatus};

/// One sample per possible status, `1` for the actual status and `0` otherwise
pub fn condition_metrics(condition: &Condition) -> [Metric; 3] {
    ConditionStatus::ALL.map(|candidate| {
        Metric::new(if candidate == condition.status { 1.0 } else { 0.0 })
            .with_label(CONDITION_LABEL, condition.condition_type.as_str())
            .with_label(STATUS_LABEL, candidate.as_str())
    })
}

/// Fan out every condition, keeping each condition's samples contiguous
pub fn metrics_from_conditions(conditions: &[Condition]) -> Vec<Metric> {
    let mut out = Vec::with_capacity(conditions.len() * ConditionStatus::ALL.len());
    for condition in conditions {
        out.extend(condition_metrics(condition));
    }
    out
}
