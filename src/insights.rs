use tracing::debug;

use crate::config::Thresholds;
use crate::error::{InsightError, InsightResult};
use crate::models::{Metric, ReasonEntry, Record, SuggestionEntry};
use crate::selector::select_high_performers;

pub const LOW_INTERACTIONS_REASON: &str =
    "Number of interactions has been low; try increasing them.";
pub const LOW_CONTACTS_REASON: &str =
    "Number of contacts is low; focus on strengthening relationships.";

pub fn low_discount_reason(min_average_discount: f64) -> String {
    format!("Discounts are below {min_average_discount}%; consider offering better price offers.")
}

/// Mean of each compared metric over the high performers.
#[derive(Debug, Clone, PartialEq)]
pub struct HighPerformerBaseline {
    means: [f64; 6],
}

impl HighPerformerBaseline {
    pub fn from_records(high: &[&Record]) -> Self {
        let mut means = [0.0; 6];
        if high.is_empty() {
            return Self { means };
        }
        for record in high {
            for (slot, metric) in means.iter_mut().zip(Metric::ALL) {
                *slot += record.metric(metric);
            }
        }
        let count = high.len() as f64;
        for slot in means.iter_mut() {
            *slot /= count;
        }
        Self { means }
    }

    pub fn target(&self, metric: Metric) -> f64 {
        self.means[metric as usize]
    }
}

/// Relative shortfall of `actual` against `target`, in percent.
pub fn percent_gap(metric: Metric, target: f64, actual: f64) -> InsightResult<f64> {
    if target == 0.0 {
        return Err(InsightError::DegenerateMetric {
            metric: metric.column(),
        });
    }
    let gap = (target - actual) / target * 100.0;
    if !gap.is_finite() {
        return Err(InsightError::DegenerateMetric {
            metric: metric.column(),
        });
    }
    Ok(gap)
}

fn recommendations(record: &Record, baseline: &HighPerformerBaseline) -> Vec<String> {
    let mut out = Vec::new();
    for metric in Metric::ALL {
        match percent_gap(metric, baseline.target(metric), record.metric(metric)) {
            Ok(gap) if gap > 0.0 => out.push(metric.recommendation(gap)),
            Ok(_) => {}
            Err(err) => debug!(customer = %record.customer, %err, "suppressed recommendation"),
        }
    }
    out
}

pub fn generate_suggestions(
    records: &[Record],
    low_performers: &[&Record],
    thresholds: &Thresholds,
) -> Vec<SuggestionEntry> {
    let high = select_high_performers(records, thresholds.high_performer_fraction);
    let baseline = HighPerformerBaseline::from_records(&high);

    low_performers
        .iter()
        .map(|record| SuggestionEntry {
            customer: record.customer.clone(),
            region: record.region.clone(),
            total_sales: record.total,
            suggestions: recommendations(record, &baseline),
        })
        .collect()
}

pub fn compute_reasons(low_performers: &[&Record], thresholds: &Thresholds) -> Vec<ReasonEntry> {
    low_performers
        .iter()
        .map(|record| {
            let mut reasons = Vec::new();
            if record.interactions < thresholds.min_interactions {
                reasons.push(LOW_INTERACTIONS_REASON.to_string());
            }
            if record.average_discount() < thresholds.min_average_discount {
                reasons.push(low_discount_reason(thresholds.min_average_discount));
            }
            if record.total_contacts < thresholds.min_total_contacts {
                reasons.push(LOW_CONTACTS_REASON.to_string());
            }
            ReasonEntry {
                customer: record.customer.clone(),
                region: record.region.clone(),
                total_sales: record.total,
                reasons,
            }
        })
        .collect()
}
