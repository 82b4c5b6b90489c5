//! The Document tree and the attribute paths that address it
//!
//! A Document is always a JSON object at the root. Navigation, the
//! single-branch partial updates built by `put`, the deep merge and leaf
//! removal all live here as pure functions over `serde_json` values.

use crate::error::{StoreError, StoreResult};
use serde_json::{Map, Value};
use std::fmt;

/// The root of a store: a JSON object
pub type Document = Map<String, Value>;

/// Ordered, non-empty list of keys locating a value inside the Document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// Build a path, rejecting an empty segment list
    pub fn new<I, S>(segments: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(StoreError::invalid_argument(
                "attribute path must contain at least one segment",
            ));
        }
        Ok(Self(segments))
    }

    /// Top-level key addressed by this path
    pub fn head(&self) -> &str {
        &self.0[0]
    }

    /// Segments below the top-level key
    pub fn tail(&self) -> &[String] {
        &self.0[1..]
    }

    /// Last segment
    pub fn leaf(&self) -> &str {
        &self.0[self.0.len() - 1]
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Path without its last segment, if anything remains
    pub fn parent(&self) -> Option<AttributePath> {
        if self.0.len() < 2 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" -> "))
    }
}

/// Walk `path` from the root of `document`
///
/// `context` names the store and is used in the error for a missing first
/// segment; deeper misses report the node they were looked up in.
pub fn resolve<'a>(
    document: &'a Document,
    path: &AttributePath,
    context: &str,
) -> StoreResult<&'a Value> {
    let mut current = document
        .get(path.head())
        .ok_or_else(|| StoreError::attribute_missing(path.head(), context))?;

    for segment in path.tail() {
        current = match current {
            Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| StoreError::attribute_missing(segment, current.to_string()))?,
            other => return Err(StoreError::attribute_missing(segment, other.to_string())),
        };
    }

    Ok(current)
}

/// Wrap `value` into a single-branch object following `segments`
///
/// `["a", "b"]` and `V` give `{"a": {"b": V}}`.
pub fn nest(segments: &[String], value: Value) -> Value {
    segments.iter().rev().fold(value, |inner, key| {
        let mut map = Map::new();
        map.insert(key.clone(), inner);
        Value::Object(map)
    })
}

/// Recursive object union; `new` wins on conflict unless both sides are objects
pub fn deep_merge(existing: &Map<String, Value>, new: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = existing.clone();

    for (key, new_value) in new {
        let combined = match (merged.get(key), new_value) {
            (Some(Value::Object(old)), Value::Object(incoming)) => {
                Value::Object(deep_merge(old, incoming))
            }
            _ => new_value.clone(),
        };
        merged.insert(key.clone(), combined);
    }

    merged
}

/// Delete the leaf named by `path`; parents are kept even when left empty
///
/// Returns whether anything was removed.
pub fn remove_leaf(document: &mut Document, path: &AttributePath) -> bool {
    let Some(parent) = path.parent() else {
        return document.remove(path.head()).is_some();
    };

    let mut current = match document.get_mut(parent.head()) {
        Some(value) => value,
        None => return false,
    };
    for segment in parent.tail() {
        current = match current {
            Value::Object(map) => match map.get_mut(segment) {
                Some(value) => value,
                None => return false,
            },
            _ => return false,
        };
    }

    match current {
        Value::Object(map) => map.remove(path.leaf()).is_some(),
        _ => false,
    }
}

/// Parse text into a Document, rejecting non-object roots
pub fn parse_document(text: &str) -> Result<Document, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(format!(
            "expected a JSON object at the root, found {}",
            kind_of(&other)
        )),
        Err(e) => Err(e.to_string()),
    }
}

/// Serialize with four-space indentation
pub fn to_pretty_json(document: &Document) -> StoreResult<String> {
    use serde::Serialize;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    document
        .serialize(&mut serializer)
        .map_err(|e| StoreError::internal(format!("Failed to serialize document: {}", e)))?;
    String::from_utf8(buf)
        .map_err(|e| StoreError::internal(format!("Serialized document is not UTF-8: {}", e)))
}

/// Short human name for a JSON value's type
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> AttributePath {
        AttributePath::new(segments.iter().copied()).unwrap()
    }

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_empty_path_rejected() {
        let err = AttributePath::new(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[test]
    fn test_path_display() {
        assert_eq!(path(&["person", "tyler", "salary"]).to_string(), "person -> tyler -> salary");
    }

    #[test]
    fn test_resolve_nested() {
        let d = doc(json!({"person": {"tyler": {"salary": 10}}}));
        let v = resolve(&d, &path(&["person", "tyler", "salary"]), "store").unwrap();
        assert_eq!(v, &json!(10));
    }

    #[test]
    fn test_resolve_missing_first_segment_names_store() {
        let d = Document::new();
        let err = resolve(&d, &path(&["nope"]), "/data.json").unwrap_err();
        match err {
            StoreError::AttributeMissing { segment, context } => {
                assert_eq!(segment, "nope");
                assert_eq!(context, "/data.json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_through_scalar_fails() {
        let d = doc(json!({"a": 5}));
        let err = resolve(&d, &path(&["a", "b"]), "store").unwrap_err();
        assert!(matches!(err, StoreError::AttributeMissing { ref segment, .. } if segment == "b"));
    }

    #[test]
    fn test_nest_builds_single_branch() {
        let segments = vec!["a".to_string(), "b".to_string()];
        assert_eq!(nest(&segments, json!(1)), json!({"a": {"b": 1}}));
        assert_eq!(nest(&[], json!(1)), json!(1));
    }

    #[test]
    fn test_deep_merge_recurses_into_objects() {
        let existing = doc(json!({"b": {"c": 1}, "keep": true}));
        let new = doc(json!({"b": {"d": 2}}));
        let merged = deep_merge(&existing, &new);
        assert_eq!(Value::Object(merged), json!({"b": {"c": 1, "d": 2}, "keep": true}));
    }

    #[test]
    fn test_deep_merge_new_scalar_replaces_object() {
        let existing = doc(json!({"b": {"c": 1}}));
        let new = doc(json!({"b": 7}));
        assert_eq!(Value::Object(deep_merge(&existing, &new)), json!({"b": 7}));
    }

    #[test]
    fn test_deep_merge_new_object_replaces_scalar() {
        let existing = doc(json!({"b": 7}));
        let new = doc(json!({"b": {"x": 1}}));
        assert_eq!(Value::Object(deep_merge(&existing, &new)), json!({"b": {"x": 1}}));
    }

    #[test]
    fn test_remove_leaf_keeps_empty_parent() {
        let mut d = doc(json!({"a": {"b": 1}}));
        assert!(remove_leaf(&mut d, &path(&["a", "b"])));
        assert_eq!(Value::Object(d), json!({"a": {}}));
    }

    #[test]
    fn test_remove_top_level_key() {
        let mut d = doc(json!({"a": 1, "b": 2}));
        assert!(remove_leaf(&mut d, &path(&["a"])));
        assert_eq!(Value::Object(d), json!({"b": 2}));
    }

    #[test]
    fn test_remove_missing_leaf_is_noop() {
        let mut d = doc(json!({"a": {"b": 1}}));
        assert!(!remove_leaf(&mut d, &path(&["a", "x", "y"])));
        assert!(!remove_leaf(&mut d, &path(&["z"])));
        assert_eq!(Value::Object(d), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        assert!(parse_document("[1, 2]").is_err());
        assert!(parse_document("{not json").is_err());
        assert!(parse_document("{}").unwrap().is_empty());
    }

    #[test]
    fn test_pretty_json_uses_four_spaces() {
        let d = doc(json!({"a": {"b": 1}}));
        let text = to_pretty_json(&d).unwrap();
        assert!(text.contains("\n    \"a\": {\n        \"b\": 1"));
    }
}
