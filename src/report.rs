use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::Thresholds;
use crate::insights;
use crate::models::Dataset;
use crate::selector;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionSummary {
    pub region: String,
    pub customers: usize,
    pub total_sales: f64,
}

/// Per-region customer counts and sales, sorted by sales descending.
pub fn summarize_by_region(dataset: &Dataset) -> Vec<RegionSummary> {
    let mut map: BTreeMap<&str, (usize, f64)> = BTreeMap::new();

    for record in &dataset.records {
        let entry = map.entry(record.region.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.total;
    }

    let mut summaries: Vec<RegionSummary> = map
        .into_iter()
        .map(|(region, (customers, total_sales))| RegionSummary {
            region: region.to_string(),
            customers,
            total_sales,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_sales
            .partial_cmp(&a.total_sales)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    summaries
}

pub fn build_report(dataset: &Dataset, count: usize, thresholds: &Thresholds) -> String {
    let low = selector::select_low_performers(&dataset.records, count);
    let suggestions = insights::generate_suggestions(&dataset.records, &low, thresholds);
    let reasons = insights::compute_reasons(&low, thresholds);
    let regions = summarize_by_region(dataset);

    let mut output = String::new();

    let _ = writeln!(output, "# Customer Sales Insights Report");
    let _ = writeln!(
        output,
        "Generated for {} customers (dataset {} loaded {})",
        dataset.len(),
        dataset.id,
        dataset.uploaded_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Regional Mix");

    if regions.is_empty() {
        let _ = writeln!(output, "No regions recorded in this dataset.");
    } else {
        for summary in regions.iter() {
            let _ = writeln!(
                output,
                "- {}: {} customers, {:.2} total sales",
                summary.region, summary.customers, summary.total_sales
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lowest Performing Customers");

    if low.is_empty() {
        let _ = writeln!(output, "No customers in this dataset.");
    } else {
        for record in low.iter() {
            let _ = writeln!(
                output,
                "- {} ({}) total {:.2} across {} interactions and {} contacts",
                record.customer,
                record.region,
                record.total,
                record.interactions,
                record.total_contacts
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggested Improvements");

    for entry in suggestions.iter() {
        let _ = writeln!(output, "### {} ({})", entry.customer, entry.region);
        if entry.suggestions.is_empty() {
            let _ = writeln!(output, "- Already matches high performers on every metric.");
        }
        for suggestion in entry.suggestions.iter() {
            let _ = writeln!(output, "- {suggestion}");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Reasons for Low Business");

    for entry in reasons.iter() {
        let _ = writeln!(output, "### {} ({})", entry.customer, entry.region);
        if entry.reasons.is_empty() {
            let _ = writeln!(output, "- No threshold rule triggered.");
        }
        for reason in entry.reasons.iter() {
            let _ = writeln!(output, "- {reason}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;
    use crate::selector::tests::record;

    fn dataset() -> Dataset {
        let south = Record {
            region: "South".to_string(),
            interactions: 3,
            total_contacts: 2,
            discount_q1: 5.0,
            discount_q2: 5.0,
            discount_q3: 5.0,
            discount_q4: 5.0,
            ..record("Beta", 40.0)
        };
        Dataset::new(vec![record("Acme", 400.0), south, record("Gamma", 200.0)])
    }

    #[test]
    fn regions_sort_by_sales() {
        let summaries = summarize_by_region(&dataset());
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].region, "North");
        assert_eq!(summaries[0].customers, 2);
        assert_eq!(summaries[0].total_sales, 600.0);
    }

    #[test]
    fn report_lists_every_section() {
        let report = build_report(&dataset(), 1, &Thresholds::default());
        assert!(report.starts_with("# Customer Sales Insights Report"));
        assert!(report.contains("## Lowest Performing Customers\n- Beta (South) total 40.00"));
        assert!(report.contains("- Increase interactions by 75.0% to match high performers."));
        assert!(report.contains("- Number of contacts is low; focus on strengthening relationships."));
        assert!(!report.contains("Gamma (North) total"));
    }

    #[test]
    fn empty_dataset_prints_none_lines() {
        let report = build_report(&Dataset::new(vec![]), 2, &Thresholds::default());
        assert!(report.contains("## Regional Mix\nNo regions recorded in this dataset."));
        assert!(report.contains("## Lowest Performing Customers\nNo customers in this dataset."));
    }
}
