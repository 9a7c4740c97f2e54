use std::cmp::Ordering;

use crate::models::Record;

/// The `n` records with the smallest Total, ascending. Ties keep upload order.
pub fn select_low_performers(records: &[Record], n: usize) -> Vec<&Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    // sort_by is stable; -0.0 and 0.0 compare equal
    ranked.sort_by(|a, b| a.total.partial_cmp(&b.total).unwrap_or(Ordering::Equal));
    ranked.truncate(n.min(records.len()));
    ranked
}

/// Top `ceil(fraction * len)` records by Total, descending. Ties keep upload order.
pub fn select_high_performers(records: &[Record], fraction: f64) -> Vec<&Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();
    ranked.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(Ordering::Equal));
    ranked.truncate(high_performer_count(records.len(), fraction));
    ranked
}

pub fn high_performer_count(len: usize, fraction: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let count = (fraction.clamp(0.0, 1.0) * len as f64).ceil() as usize;
    count.clamp(1, len)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(customer: &str, total: f64) -> Record {
        Record {
            customer: customer.to_string(),
            region: "North".to_string(),
            q1: total / 4.0,
            discount_q1: 25.0,
            q2: total / 4.0,
            discount_q2: 25.0,
            q3: total / 4.0,
            discount_q3: 25.0,
            q4: total / 4.0,
            discount_q4: 25.0,
            total,
            interactions: 12,
            total_contacts: 12,
        }
    }

    fn totals(selected: &[&Record]) -> Vec<f64> {
        selected.iter().map(|r| r.total).collect()
    }

    #[test]
    fn picks_lowest_totals_ascending() {
        let records = vec![
            record("a", 100.0),
            record("b", 50.0),
            record("c", 300.0),
            record("d", 200.0),
        ];
        assert_eq!(totals(&select_low_performers(&records, 2)), vec![50.0, 100.0]);
    }

    #[test]
    fn signed_zero_totals_tie_in_upload_order() {
        let records = vec![record("first", 0.0), record("second", -0.0)];
        assert_eq!(select_low_performers(&records, 1)[0].customer, "first");
        assert_eq!(select_high_performers(&records, 0.5)[0].customer, "first");
    }

    #[test]
    fn count_is_capped_by_dataset_size() {
        let records = vec![record("a", 3.0), record("b", 1.0)];
        let selected = select_low_performers(&records, 10);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].customer, "b");
    }

    #[test]
    fn ties_prefer_earlier_rows() {
        let records = vec![
            record("first", 10.0),
            record("low", 5.0),
            record("second", 10.0),
            record("third", 10.0),
        ];
        let selected = select_low_performers(&records, 3);
        let names: Vec<&str> = selected.iter().map(|r| r.customer.as_str()).collect();
        assert_eq!(names, vec!["low", "first", "second"]);
    }

    #[test]
    fn selection_never_exceeds_complement() {
        let records: Vec<Record> = [7.0, 3.0, 9.0, 1.0, 4.0, 4.0, 8.0]
            .iter()
            .enumerate()
            .map(|(i, t)| record(&format!("c{i}"), *t))
            .collect();
        for n in 1..=records.len() + 1 {
            let selected = select_low_performers(&records, n);
            assert_eq!(selected.len(), n.min(records.len()));
            let max_selected = selected.iter().map(|r| r.total).fold(f64::MIN, f64::max);
            let selected_ptrs: Vec<*const Record> =
                selected.iter().map(|r| *r as *const Record).collect();
            for other in records
                .iter()
                .filter(|r| !selected_ptrs.contains(&(*r as *const Record)))
            {
                assert!(max_selected <= other.total);
            }
        }
    }

    #[test]
    fn high_performer_count_rounds_up() {
        assert_eq!(high_performer_count(4, 0.25), 1);
        assert_eq!(high_performer_count(5, 0.25), 2);
        assert_eq!(high_performer_count(3, 0.25), 1);
        assert_eq!(high_performer_count(1, 0.25), 1);
        assert_eq!(high_performer_count(0, 0.25), 0);
    }

    #[test]
    fn high_performers_are_largest_totals() {
        let records = vec![
            record("a", 100.0),
            record("b", 50.0),
            record("c", 300.0),
            record("d", 200.0),
            record("e", 250.0),
        ];
        let top = select_high_performers(&records, 0.25);
        assert_eq!(totals(&top), vec![300.0, 250.0]);
    }
}
