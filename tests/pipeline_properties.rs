use price_scraper::constants::UNKNOWN_PRODUCT_NAME;
use price_scraper::pipeline::Pipeline;
use price_scraper::storage::fingerprint;
use price_scraper::{views, ScraperError};
use serde_json::{json, Value};

fn item(name: &str, current: Value, previous: Value) -> Value {
    json!({
        "product": {
            "name": name,
            "salesPrice": {
                "current": { "wholeNumber": current },
                "previous": { "wholeNumber": previous }
            }
        }
    })
}

fn payload(items: Vec<Value>) -> Value {
    json!({ "results": [ { "items": items } ] })
}

/// Items whose price change equals `changes[i]` (current price fixed at 0).
fn items_with_changes(changes: &[f64]) -> Vec<Value> {
    changes
        .iter()
        .enumerate()
        .map(|(i, c)| item(&format!("product-{}", i), json!(0), json!(c)))
        .collect()
}

#[test]
fn test_missing_fields_normalize_to_defaults() {
    let items = vec![
        json!({ "product": { "salesPrice": { "previous": { "wholeNumber": 10 } } } }),
        json!({ "product": { "name": "No previous", "salesPrice": { "current": { "wholeNumber": "7" } } } }),
    ];
    let dataset = Pipeline::new().run(&payload(items)).unwrap();
    let records = dataset.records();

    assert_eq!(records[0].name, UNKNOWN_PRODUCT_NAME);
    assert_eq!(records[0].current_price, 0.0);
    assert_eq!(records[0].previous_price, 10.0);

    assert_eq!(records[1].current_price, 7.0);
    assert_eq!(records[1].previous_price, 0.0);
}

#[test]
fn test_derivation_is_total() {
    let items = vec![
        item("discount", json!(80), json!(100)),
        item("rise", json!(120), json!(100)),
        item("no previous", json!(50), json!(null)),
        item("garbage", json!("n/a"), json!([1, 2])),
    ];
    let dataset = Pipeline::new().run(&payload(items)).unwrap();

    for r in dataset.records() {
        assert_eq!(r.price_change, r.previous_price - r.current_price);
        if r.previous_price <= 0.0 {
            assert_eq!(r.price_change_percentage, 0.0);
        }
        assert!(r.price_change_percentage.is_finite());
    }
    assert_eq!(dataset.records()[0].price_change_percentage, 20.0);
    assert_eq!(dataset.records()[1].price_change_percentage, -20.0);
}

#[test]
fn test_iqr_fence_flags_only_extreme_value() {
    let changes = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0];
    let dataset = Pipeline::new().run(&payload(items_with_changes(&changes))).unwrap();

    let flagged: Vec<f64> = views::outliers(&dataset).iter().map(|r| r.price_change).collect();
    assert_eq!(flagged, vec![100.0]);

    let fences = dataset.fences().unwrap();
    assert_eq!(fences.q1, 3.25);
    assert_eq!(fences.q3, 7.75);
}

#[test]
fn test_single_record_never_outlier() {
    for change in [0.0, 5000.0, -5000.0] {
        let dataset = Pipeline::new().run(&payload(items_with_changes(&[change]))).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.records()[0].is_outlier);
    }
}

#[test]
fn test_small_batches_still_classified() {
    let dataset = Pipeline::new().run(&payload(items_with_changes(&[1.0, 2.0, 50.0]))).unwrap();
    assert_eq!(dataset.len(), 3);
    assert!(dataset.fences().is_some());
}

#[test]
fn test_top_n_ties_in_batch_order() {
    let changes = [3.0, 9.0, 1.0, 9.0, 9.0, 4.0];
    let dataset = Pipeline::new().run(&payload(items_with_changes(&changes))).unwrap();

    let names: Vec<&str> = views::top_changes(&dataset, 4).iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["product-1", "product-3", "product-4", "product-5"]);
}

#[test]
fn test_missing_items_container_is_structural_failure() {
    for bad in [
        json!({}),
        json!({ "results": [] }),
        json!({ "results": [ { "products": [] } ] }),
        json!([1, 2, 3]),
    ] {
        match Pipeline::new().run(&bad) {
            Err(ScraperError::MalformedResponse { .. }) => {}
            other => panic!("expected MalformedResponse for {}, got {:?}", bad, other),
        }
    }
}

#[test]
fn test_empty_items_is_valid_empty_dataset() {
    let dataset = Pipeline::new().run(&payload(vec![])).unwrap();
    assert!(dataset.is_empty());
    assert!(dataset.fences().is_none());
    assert!(views::all(&dataset).is_empty());
    assert!(views::top_changes(&dataset, 10).is_empty());
    assert!(views::outliers(&dataset).is_empty());
}

#[test]
fn test_pipeline_is_idempotent() {
    let mut items = items_with_changes(&[12.0, -3.5, 0.0, 44.0, 7.25, 1000.0]);
    items.push(json!({ "product": { "name": null } }));
    let input = payload(items);

    let first = Pipeline::new().run(&input).unwrap();
    let second = Pipeline::new().run(&input).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_vec(&first).unwrap(),
        serde_json::to_vec(&second).unwrap()
    );
    assert_eq!(fingerprint(&first).unwrap(), fingerprint(&second).unwrap());
}

#[test]
fn test_outlier_flag_depends_on_batch() {
    let small = Pipeline::new().run(&payload(items_with_changes(&[1.0, 2.0, 3.0, 4.0, 20.0]))).unwrap();
    assert!(small.records()[4].is_outlier);

    let wide = Pipeline::new()
        .run(&payload(items_with_changes(&[1.0, 2.0, 3.0, 4.0, 20.0, 25.0, 30.0, 35.0])))
        .unwrap();
    assert!(!wide.records()[4].is_outlier);
}

#[test]
fn test_overflowing_changes_flag_nothing() {
    let mut items = items_with_changes(&[1.0, 2.0, 3.0]);
    items.push(item("huge-a", json!(-1.7e308), json!(1.7e308)));
    items.push(item("huge-b", json!(-1.7e308), json!(1.7e308)));
    let dataset = Pipeline::new().run(&payload(items)).unwrap();

    assert_eq!(dataset.records()[3].price_change, f64::INFINITY);
    assert!(dataset.records().iter().all(|r| !r.is_outlier));
}
