//! Dynamic result model for parsed daemon output.
//!
//! Every command family parses into a [`Parsed`] JSON object. Keys iterate
//! in ascending order (`serde_json` is built without `preserve_order`).

pub use serde_json::{Map, Value};

/// A string-keyed mapping produced by a parser or derived from other results.
pub type Parsed = Map<String, Value>;

/// Take the mapping out of a `json!` object; any other value is empty.
pub fn object(value: Value) -> Parsed {
    match value {
        Value::Object(map) => map,
        _ => Parsed::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_keeps_mapping() {
        let parsed = object(json!({"status": {"version": "2.0.9"}}));
        assert_eq!(parsed["status"]["version"], "2.0.9");
    }

    #[test]
    fn test_object_of_non_mapping_is_empty() {
        assert!(object(json!([1, 2])).is_empty());
        assert!(object(Value::Null).is_empty());
    }

    #[test]
    fn test_keys_are_ordered() {
        let parsed = object(json!({"zeta": 1, "alpha": 2, "mid": 3}));
        let keys: Vec<&String> = parsed.keys().collect();
        assert_eq!(keys, ["alpha", "mid", "zeta"]);
    }
}
