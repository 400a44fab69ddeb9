#![forbid(unsafe_code)]

//! Loose value equality for synchronized properties.
//!
//! Property values are [`serde_json::Value`]s. Equality follows a layered
//! rule rather than plain structural `==`:
//!
//! 1. Strings, numbers and booleans compare strictly (same kind, same value).
//!    Numbers compare by numeric value, so `5` equals `5.0`.
//! 2. `null` equals only `null`.
//! 3. Two references to the same array/object are equal.
//! 4. Otherwise arrays/objects are equal only when `json_fallback` is set and
//!    their serialized texts are identical.
//!
//! Object keys serialize in sorted order (`serde_json`'s default map), so two
//! objects with the same entries inserted in a different order serialize to
//! the same text.

use serde_json::Number;

pub use serde_json::Value;

/// Compare two property values using the layered rule in the module docs.
#[must_use]
pub fn is_value_equals(a: &Value, b: &Value, json_fallback: bool) -> bool {
    match a {
        Value::String(x) => matches!(b, Value::String(y) if x == y),
        Value::Number(x) => matches!(b, Value::Number(y) if numbers_equal(x, y)),
        Value::Bool(x) => matches!(b, Value::Bool(y) if x == y),
        Value::Null => b.is_null(),
        Value::Array(_) | Value::Object(_) => {
            if std::ptr::eq(a, b) {
                return true;
            }
            if !json_fallback {
                return false;
            }
            match (serde_json::to_string(a), serde_json::to_string(b)) {
                (Ok(x), Ok(y)) => x == y,
                _ => false,
            }
        }
    }
}

fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Whether a value counts as "empty" for payload purposes:
/// `null`, `false`, `0`, or the empty string.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Serialize an event payload for diagnostic logging.
///
/// Absent or falsy payloads render as `"null"`. Serialization failures are
/// swallowed and also render as `"null"`; this text never feeds back into
/// behavior.
#[must_use]
pub fn describe_payload(data: Option<&Value>) -> String {
    match data {
        Some(value) if !is_falsy(value) => {
            serde_json::to_string(value).unwrap_or_else(|_| String::from("null"))
        }
        _ => String::from("null"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn primitives_strict() {
        assert!(is_value_equals(&json!("a"), &json!("a"), false));
        assert!(!is_value_equals(&json!("5"), &json!(5), true));
        assert!(is_value_equals(&json!(5), &json!(5), false));
        assert!(is_value_equals(&json!(5), &json!(5.0), false));
        assert!(!is_value_equals(&json!(true), &json!(1), true));
        assert!(is_value_equals(&json!(false), &json!(false), false));
    }

    #[test]
    fn falsy_values_do_not_cross_match() {
        assert!(is_value_equals(&Value::Null, &Value::Null, false));
        assert!(!is_value_equals(&Value::Null, &json!(0), true));
        assert!(!is_value_equals(&json!(0), &json!(""), true));
        assert!(!is_value_equals(&json!(""), &Value::Null, true));
        assert!(!is_value_equals(&json!(false), &json!(0), true));
    }

    #[test]
    fn same_reference_is_equal_without_fallback() {
        let v = json!({"a": [1, 2]});
        assert!(is_value_equals(&v, &v, false));
    }

    #[test]
    fn distinct_structures_need_fallback() {
        let a = json!({"a": [1, 2]});
        let b = json!({"a": [1, 2]});
        assert!(!is_value_equals(&a, &b, false));
        assert!(is_value_equals(&a, &b, true));
    }

    #[test]
    fn different_structures_differ() {
        assert!(!is_value_equals(&json!([1, 2]), &json!([2, 1]), true));
        assert!(!is_value_equals(&json!({"a": 1}), &json!({"a": 2}), true));
        assert!(!is_value_equals(&json!([]), &json!({}), true));
    }

    #[test]
    fn key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"x":1,"y":2}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert!(is_value_equals(&a, &b, true));
    }

    #[test]
    fn falsy_classification() {
        assert!(is_falsy(&Value::Null));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!(0)));
        assert!(is_falsy(&json!(0.0)));
        assert!(is_falsy(&json!("")));
        assert!(!is_falsy(&json!([])));
        assert!(!is_falsy(&json!({})));
        assert!(!is_falsy(&json!("0")));
    }

    #[test]
    fn describe_payload_renders_null_for_empty() {
        assert_eq!(describe_payload(None), "null");
        assert_eq!(describe_payload(Some(&json!(0))), "null");
        assert_eq!(describe_payload(Some(&json!(""))), "null");
        assert_eq!(describe_payload(Some(&json!({"id": 7}))), r#"{"id":7}"#);
        assert_eq!(describe_payload(Some(&json!("hi"))), r#""hi""#);
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| json!(n)),
            "[a-z]{0,6}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn fallback_agrees_with_structural_eq(a in arb_value(), b in arb_value()) {
            prop_assert_eq!(is_value_equals(&a, &b, true), a == b);
        }

        #[test]
        fn reflexive_on_clones(a in arb_value()) {
            let b = a.clone();
            prop_assert!(is_value_equals(&a, &b, true));
        }
    }
}
