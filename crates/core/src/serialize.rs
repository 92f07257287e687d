//! Conversion of arbitrary values into plain JSON data.
//!
//! Everything returned to callers passes through [`serialize`], which produces a detached JSON
//! copy: members serde skips are dropped, `None` fields marked `skip_serializing_if` disappear,
//! and timestamps become ISO-8601 strings.

use serde::Serialize;
use serde_json::Value;

/// Produce a JSON deep copy of `value`.
///
/// Never fails. Values serde cannot express as JSON (for example maps with composite keys) are
/// logged and replaced by `null`.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("value is not representable as JSON, using null: {}", e);
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::collections::HashMap;

    #[derive(Serialize)]
    struct WithCallback {
        a: u32,
        #[serde(skip)]
        #[allow(dead_code)]
        on_change: Option<fn() -> u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        missing: Option<String>,
    }

    #[test]
    fn test_drops_skipped_members() {
        let value = WithCallback {
            a: 1,
            on_change: Some(|| 2),
            missing: None,
        };
        assert_eq!(serialize(&value), json!({ "a": 1 }));
    }

    #[test]
    fn test_copies_nested_structures() {
        let original = json!({ "a": 1, "b": { "c": 2 }, "list": [1, 2, { "a": 3 }] });
        let copy = serialize(&original);
        assert_eq!(copy, original);
    }

    #[test]
    fn test_dates_become_iso_strings() {
        let date = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let value = serialize(&HashMap::from([("date", date)]));
        assert_eq!(value["date"], "2026-01-15T00:00:00Z");
    }

    #[test]
    fn test_null_and_primitives_pass_through() {
        assert_eq!(serialize(&Option::<u8>::None), Value::Null);
        assert_eq!(serialize(&42), json!(42));
        assert_eq!(serialize("hello"), json!("hello"));
        assert_eq!(serialize(&true), json!(true));
    }

    #[test]
    fn test_unrepresentable_value_becomes_null() {
        let value = HashMap::from([((1u8, 2u8), "pair")]);
        assert_eq!(serialize(&value), Value::Null);
    }

    #[test]
    fn test_is_idempotent() {
        let inputs = [
            json!(null),
            json!("text"),
            json!([1, "two", { "three": 3.5 }]),
            json!({ "a": { "b": [true, false, null] } }),
        ];
        for input in inputs {
            let once = serialize(&input);
            assert_eq!(serialize(&once), once);
        }
    }
}
