//! Read-only projections over a completed dataset.

use crate::types::{ProductDataset, ProductRecord};

/// Every record in batch order.
pub fn all(dataset: &ProductDataset) -> &[ProductRecord] {
    dataset.records()
}

/// The `n` largest price changes, descending. Ties keep batch order.
pub fn top_changes(dataset: &ProductDataset, n: usize) -> Vec<&ProductRecord> {
    let mut ranked: Vec<&ProductRecord> = dataset.records().iter().collect();
    // sort_by is stable
    ranked.sort_by(|a, b| b.price_change.total_cmp(&a.price_change));
    ranked.truncate(n);
    ranked
}

/// Records flagged as outliers, in batch order.
pub fn outliers(dataset: &ProductDataset) -> Vec<&ProductRecord> {
    dataset.records().iter().filter(|r| r.is_outlier).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use serde_json::json;

    fn dataset(changes: &[(&str, f64)]) -> ProductDataset {
        let items: Vec<_> = changes
            .iter()
            .map(|(name, change)| {
                json!({
                    "product": {
                        "name": name,
                        "salesPrice": {
                            "current": { "wholeNumber": 1000.0 - change },
                            "previous": { "wholeNumber": 1000.0 }
                        }
                    }
                })
            })
            .collect();
        Pipeline::new().process_items(&items)
    }

    fn names(records: &[&ProductRecord]) -> Vec<String> {
        records.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_top_changes_descending() {
        let ds = dataset(&[("a", 5.0), ("b", 50.0), ("c", -10.0), ("d", 20.0)]);
        assert_eq!(names(&top_changes(&ds, 2)), vec!["b", "d"]);
    }

    #[test]
    fn test_top_changes_ties_keep_batch_order() {
        let ds = dataset(&[("a", 1.0), ("t1", 10.0), ("b", 2.0), ("t2", 10.0), ("t3", 10.0)]);
        assert_eq!(names(&top_changes(&ds, 3)), vec!["t1", "t2", "t3"]);
        assert_eq!(names(&top_changes(&ds, 4)), vec!["t1", "t2", "t3", "b"]);
    }

    #[test]
    fn test_top_changes_fewer_than_n() {
        let ds = dataset(&[("a", 1.0), ("b", 2.0)]);
        assert_eq!(top_changes(&ds, 10).len(), 2);
        assert!(top_changes(&ds, 0).is_empty());
    }

    #[test]
    fn test_outliers_in_batch_order() {
        let ds = dataset(&[
            ("huge", 900.0),
            ("a", 1.0),
            ("b", 2.0),
            ("c", 3.0),
            ("d", 4.0),
            ("e", 5.0),
            ("drop", -900.0),
        ]);
        assert_eq!(names(&outliers(&ds)), vec!["huge", "drop"]);
        assert_eq!(all(&ds).len(), 7);
    }

    #[test]
    fn test_views_on_empty_dataset() {
        let ds = ProductDataset::empty();
        assert!(all(&ds).is_empty());
        assert!(top_changes(&ds, 10).is_empty());
        assert!(outliers(&ds).is_empty());
    }
}
