//! Flattening of structured provenance into string-valued attributes.

use serde_json::Value;
use std::collections::BTreeMap;

/// Flatten one level of a JSON object into string attributes.
///
/// Strings are kept verbatim; every other value is stored as its JSON text. A
/// non-object value yields an empty map.
pub fn flatten_attributes(value: &Value) -> BTreeMap<String, String> {
    let Some(object) = value.as_object() else {
        return BTreeMap::new();
    };
    object
        .iter()
        .map(|(key, value)| (key.clone(), stringify(value)))
        .collect()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_are_kept_verbatim() {
        let flat = flatten_attributes(&json!({"url": "https://ex/a.png", "group": ""}));
        assert_eq!(flat["url"], "https://ex/a.png");
        assert_eq!(flat["group"], "");
    }

    #[test]
    fn non_strings_are_stringified() {
        let flat = flatten_attributes(&json!({
            "count": 3,
            "ratio": 0.5,
            "public": true,
            "missing": null,
            "tags": ["a", "b"],
            "nested": {"k": "v"}
        }));
        assert_eq!(flat["count"], "3");
        assert_eq!(flat["ratio"], "0.5");
        assert_eq!(flat["public"], "true");
        assert_eq!(flat["missing"], "null");
        assert_eq!(flat["tags"], r#"["a","b"]"#);
        assert_eq!(flat["nested"], r#"{"k":"v"}"#);
    }

    #[test]
    fn non_objects_flatten_to_nothing() {
        assert!(flatten_attributes(&json!("just a string")).is_empty());
    }
}
