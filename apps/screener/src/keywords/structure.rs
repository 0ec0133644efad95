//! Structured extraction output as a tagged union, plus the depth-bounded flattening
//! used to re-scan it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Traversal stops below this depth; deeper leaves are silently ignored.
pub const MAX_FLATTEN_DEPTH: usize = 10;

/// The generative model's resume output: strings, sequences and maps. Other JSON
/// scalars are carried through but never contribute text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredValue {
    #[default]
    Null,
    Text(String),
    Bool(bool),
    Number(serde_json::Number),
    Sequence(Vec<StructuredValue>),
    Map(BTreeMap<String, StructuredValue>),
}

impl StructuredValue {
    /// Collects every string leaf into one space-joined blob.
    pub fn flatten(&self) -> String {
        let mut parts = Vec::new();
        self.collect_text(0, &mut parts);
        parts.join(" ")
    }

    fn collect_text<'a>(&'a self, depth: usize, out: &mut Vec<&'a str>) {
        if depth > MAX_FLATTEN_DEPTH {
            return;
        }
        match self {
            StructuredValue::Text(s) => out.push(s),
            StructuredValue::Sequence(items) => {
                for item in items {
                    item.collect_text(depth + 1, out);
                }
            }
            StructuredValue::Map(fields) => {
                for value in fields.values() {
                    value.collect_text(depth + 1, out);
                }
            }
            StructuredValue::Null | StructuredValue::Bool(_) | StructuredValue::Number(_) => {}
        }
    }

    pub fn get(&self, key: &str) -> Option<&StructuredValue> {
        match self {
            StructuredValue::Map(fields) => fields.get(key),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StructuredValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[allow(dead_code)]
    pub fn as_sequence(&self) -> Option<&[StructuredValue]> {
        match self {
            StructuredValue::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for StructuredValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => StructuredValue::Null,
            Value::Bool(b) => StructuredValue::Bool(b),
            Value::Number(n) => StructuredValue::Number(n),
            Value::String(s) => StructuredValue::Text(s),
            Value::Array(items) => {
                StructuredValue::Sequence(items.into_iter().map(StructuredValue::from).collect())
            }
            Value::Object(fields) => StructuredValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, StructuredValue::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nested(depth: usize, leaf: &str) -> StructuredValue {
        let mut value = StructuredValue::Text(leaf.to_string());
        for _ in 0..depth {
            value = StructuredValue::Map(BTreeMap::from([("inner".to_string(), value)]));
        }
        value
    }

    #[test]
    fn test_flatten_collects_string_leaves() {
        let value = StructuredValue::from(json!({
            "name": "Jane",
            "years": 7,
            "remote": true,
            "skills": {"technical": ["Liquid", "GraphQL"]},
            "summary": null
        }));
        let flat = value.flatten();
        assert!(flat.contains("Jane"));
        assert!(flat.contains("Liquid GraphQL"));
        assert!(!flat.contains('7'));
        assert!(!flat.contains("true"));
    }

    #[test]
    fn test_flatten_empty_structures() {
        assert_eq!(StructuredValue::Null.flatten(), "");
        assert_eq!(StructuredValue::from(json!({})).flatten(), "");
        assert_eq!(StructuredValue::from(json!([[], {}])).flatten(), "");
    }

    #[test]
    fn test_flatten_stops_at_depth_cap() {
        assert_eq!(nested(MAX_FLATTEN_DEPTH, "kept").flatten(), "kept");
        assert_eq!(nested(MAX_FLATTEN_DEPTH + 1, "dropped").flatten(), "");
    }

    #[test]
    fn test_deserializes_untagged_json() {
        let value: StructuredValue =
            serde_json::from_str(r#"{"workExperience": [{"company": "Acme", "years": 3}]}"#)
                .unwrap();
        let experience = value.get("workExperience").unwrap().as_sequence().unwrap();
        assert_eq!(experience[0].get("company").unwrap().as_text(), Some("Acme"));
        assert!(matches!(
            experience[0].get("years"),
            Some(StructuredValue::Number(_))
        ));
    }

    #[test]
    fn test_serializes_back_to_plain_json() {
        let original = json!({"skills": {"tools": ["Theme Kit"]}, "active": false});
        let value = StructuredValue::from(original.clone());
        assert_eq!(serde_json::to_value(&value).unwrap(), original);
    }
}
