use serde_json::Value;

use crate::constants::{CURRENT_PRICE_PATH, NAME_PATH, PREVIOUS_PRICE_PATH, UNKNOWN_PRODUCT_NAME};
use crate::types::{NormalizedProduct, RawItem};

/// Flatten one raw catalog item into name and prices.
///
/// Never fails: a missing or malformed field falls back to its default
/// (`"Unknown"` for the name, `0.0` for prices) so the batch keeps its size.
pub fn normalize_item(item: &RawItem) -> NormalizedProduct {
    NormalizedProduct {
        name: name_at(item, NAME_PATH),
        current_price: price_at(item, CURRENT_PRICE_PATH),
        previous_price: price_at(item, PREVIOUS_PRICE_PATH),
    }
}

fn lookup<'a>(item: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(item, |node, key| node.get(key))
}

fn name_at(item: &Value, path: &[&str]) -> String {
    match lookup(item, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_PRODUCT_NAME.to_string(),
        Some(other) => other.to_string(),
    }
}

fn price_at(item: &Value, path: &[&str]) -> f64 {
    lookup(item, path).map(coerce_number).unwrap_or(0.0)
}

/// Numeric coercion for price fields. Missing and malformed values both
/// collapse to `0.0`.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(name: Value, current: Value, previous: Value) -> Value {
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

    #[test]
    fn test_normalize_well_formed_item() {
        let p = normalize_item(&item(json!("POÄNG"), json!("129"), json!(159)));
        assert_eq!(p.name, "POÄNG");
        assert_eq!(p.current_price, 129.0);
        assert_eq!(p.previous_price, 159.0);
    }

    #[test]
    fn test_missing_fields_default() {
        let p = normalize_item(&json!({ "product": {} }));
        assert_eq!(p.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(p.current_price, 0.0);
        assert_eq!(p.previous_price, 0.0);

        let p = normalize_item(&json!("not even an object"));
        assert_eq!(p.name, UNKNOWN_PRODUCT_NAME);
        assert_eq!(p.current_price, 0.0);
    }

    #[test]
    fn test_null_name_defaults() {
        let p = normalize_item(&item(Value::Null, json!(1), json!(2)));
        assert_eq!(p.name, UNKNOWN_PRODUCT_NAME);
    }

    #[test]
    fn test_non_numeric_prices_become_zero() {
        let p = normalize_item(&item(json!("X"), json!("1,299"), json!({ "amount": 3 })));
        assert_eq!(p.current_price, 0.0);
        assert_eq!(p.previous_price, 0.0);

        let p = normalize_item(&item(json!("X"), json!(true), json!("NaN")));
        assert_eq!(p.current_price, 0.0);
        assert_eq!(p.previous_price, 0.0);
    }

    #[test]
    fn test_coerce_number_trims_strings() {
        assert_eq!(coerce_number(&json!(" 49.5 ")), 49.5);
        assert_eq!(coerce_number(&json!(-3)), -3.0);
        assert_eq!(coerce_number(&Value::Null), 0.0);
    }
}
