//! JSON definition-document loader.
//!
//! Every document the tool reads goes through the same three passes:
//!
//! 1. **Comment stripping.** Entries keyed `#|comment` are dropped at every
//!    nesting level.
//! 2. **Reference expansion.** A key `#|ref : <name>` is replaced by the
//!    expanded contents of `refs.<name>` from the root document, merged into
//!    the surrounding mapping. Cycles are detected per expansion branch.
//! 3. **Schema validation** (optional) of the fully expanded document.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{io_err, ConfigError};
use crate::schema::Schema;

/// Key of entries removed by comment stripping.
pub const COMMENT_KEY: &str = "#|comment";

/// Root key holding the reference table.
pub const REFS_KEY: &str = "refs";

static REF_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#\|ref *: *([A-Za-z][A-Za-z0-9_-]*) *$").expect("static regex")
});

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Read, de-comment, expand and optionally validate the JSON file at `path`.
pub fn load(path: &Path, schema: Option<Schema>) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    load_str(path, &text, schema)
}

/// Same as [`load`] for text already in memory; `path` is only used in diagnostics.
pub fn load_str(path: &Path, text: &str, schema: Option<Schema>) -> Result<Value, ConfigError> {
    let raw: Value = serde_json::from_str(text).map_err(|e| ConfigError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    prepare(path, &raw, schema)
}

/// Strip, expand and validate an already parsed document.
pub fn prepare(path: &Path, raw: &Value, schema: Option<Schema>) -> Result<Value, ConfigError> {
    let stripped = strip_comments(raw);
    let expanded = expand_refs(&stripped, path)?;
    if let Some(schema) = schema {
        schema.validate(&expanded, path)?;
    }
    Ok(expanded)
}

/// [`load`] followed by deserialization into `T`.
pub fn load_as<T: DeserializeOwned>(path: &Path, schema: Option<Schema>) -> Result<T, ConfigError> {
    let doc = load(path, schema)?;
    from_value(path, doc)
}

/// Deserialize a prepared document, attributing failures to `path`.
pub fn from_value<T: DeserializeOwned>(path: &Path, doc: Value) -> Result<T, ConfigError> {
    serde_json::from_value(doc).map_err(|e| ConfigError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

// ---------------------------------------------------------------------------
// Comment stripping
// ---------------------------------------------------------------------------

/// Remove every `#|comment` entry, at any depth, leaving the rest intact.
pub fn strip_comments(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(k, _)| k.as_str() != COMMENT_KEY)
                .map(|(k, v)| (k.clone(), strip_comments(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_comments).collect()),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Reference expansion
// ---------------------------------------------------------------------------

/// Expand every `#|ref : <name>` key of `root` against `root.refs`.
pub fn expand_refs(root: &Value, path: &Path) -> Result<Value, ConfigError> {
    let empty = Map::new();
    let refs = root
        .get(REFS_KEY)
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    expand(refs, root, &HashSet::new(), path)
}

fn ref_name(key: &str) -> Option<&str> {
    REF_KEY
        .captures(key)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `visited` holds the references already taken on this branch only; siblings
/// each get their own copy.
fn expand(
    refs: &Map<String, Value>,
    value: &Value,
    visited: &HashSet<String>,
    path: &Path,
) -> Result<Value, ConfigError> {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, inner) in map {
                let Some(name) = ref_name(key) else {
                    out.insert(key.clone(), expand(refs, inner, visited, path)?);
                    continue;
                };

                let target = refs.get(name).ok_or_else(|| ConfigError::MissingReference {
                    path: path.to_path_buf(),
                    name: name.to_string(),
                })?;
                if visited.contains(name) {
                    return Err(ConfigError::CircularReference {
                        path: path.to_path_buf(),
                        name: name.to_string(),
                    });
                }

                let mut branch = visited.clone();
                branch.insert(name.to_string());
                match expand(refs, target, &branch, path)? {
                    Value::Object(fragment) => {
                        for (k, v) in fragment {
                            out.insert(k, v);
                        }
                    }
                    _ => {
                        return Err(ConfigError::ReferenceNotMapping {
                            path: path.to_path_buf(),
                            name: name.to_string(),
                        })
                    }
                }
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| expand(refs, item, visited, path))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p() -> &'static Path {
        Path::new("doc.json")
    }

    fn has_ref_markers(value: &Value) -> bool {
        match value {
            Value::Object(map) => map
                .iter()
                .any(|(k, v)| ref_name(k).is_some() || has_ref_markers(v)),
            Value::Array(items) => items.iter().any(has_ref_markers),
            _ => false,
        }
    }

    #[test]
    fn strips_comments_at_every_level() {
        let doc = json!({
            "#|comment": "top",
            "a": { "#|comment": "nested", "b": 1 },
            "list": [ { "#|comment": "in list", "c": 2 } ]
        });
        let out = strip_comments(&doc);
        assert_eq!(out, json!({ "a": { "b": 1 }, "list": [ { "c": 2 } ] }));
    }

    #[test]
    fn ref_key_tolerates_spaces() {
        assert_eq!(ref_name("#|ref:common"), Some("common"));
        assert_eq!(ref_name("#|ref : common-2 "), Some("common-2"));
        assert_eq!(ref_name("#|ref : 2bad"), None);
        assert_eq!(ref_name("ref:common"), None);
    }

    #[test]
    fn reference_is_merged_into_mapping() {
        let doc = json!({
            "refs": { "base": { "x": 1, "y": 2 } },
            "item": { "#|ref : base": "", "z": 3 }
        });
        let out = expand_refs(&doc, p()).unwrap();
        assert_eq!(out["item"], json!({ "x": 1, "y": 2, "z": 3 }));
    }

    #[test]
    fn later_entry_wins_on_collision() {
        let doc = json!({
            "refs": { "base": { "x": 1 } },
            "item": { "#|ref : base": "", "x": 9 }
        });
        let out = expand_refs(&doc, p()).unwrap();
        assert_eq!(out["item"]["x"], json!(9));

        let doc = json!({
            "refs": { "base": { "x": 1 } },
            "item": { "x": 9, "#|ref : base": "" }
        });
        let out = expand_refs(&doc, p()).unwrap();
        assert_eq!(out["item"]["x"], json!(1));
    }

    #[test]
    fn nested_references_expand_recursively() {
        let doc = json!({
            "refs": {
                "inner": { "deep": true },
                "outer": { "#|ref : inner": "", "mid": 1 }
            },
            "item": { "#|ref : outer": "" }
        });
        let out = expand_refs(&doc, p()).unwrap();
        assert_eq!(out["item"], json!({ "deep": true, "mid": 1 }));
        assert!(!has_ref_markers(&out));
    }

    #[test]
    fn same_reference_on_independent_branches_is_legal() {
        let doc = json!({
            "refs": {
                "leaf": { "v": 1 },
                "a": { "#|ref : leaf": "" },
                "b": { "#|ref : leaf": "" }
            },
            "item": { "#|ref : a": "", "other": { "#|ref : b": "" } }
        });
        expand_refs(&doc, p()).expect("diamond is not a cycle");
    }

    #[test]
    fn self_reference_fails() {
        let doc = json!({ "refs": { "a": { "#|ref : a": "" } } });
        let err = expand_refs(&doc, p()).unwrap_err();
        assert!(matches!(err, ConfigError::CircularReference { ref name, .. } if name == "a"));
    }

    #[test]
    fn two_cycle_fails() {
        let doc = json!({
            "refs": { "a": { "#|ref : b": "" }, "b": { "#|ref : a": "" } },
            "item": { "#|ref : a": "" }
        });
        let err = expand_refs(&doc, p()).unwrap_err();
        assert!(matches!(err, ConfigError::CircularReference { .. }));
    }

    #[test]
    fn missing_reference_names_refs_entry() {
        let doc = json!({ "item": { "#|ref : nope": "" } });
        let err = expand_refs(&doc, p()).unwrap_err();
        assert!(err.to_string().contains("[refs][nope]"), "got: {err}");
    }

    #[test]
    fn non_mapping_reference_fails() {
        let doc = json!({ "refs": { "s": "scalar" }, "item": { "#|ref : s": "" } });
        let err = expand_refs(&doc, p()).unwrap_err();
        assert!(matches!(err, ConfigError::ReferenceNotMapping { .. }));
    }

    #[test]
    fn references_inside_arrays_expand() {
        let doc = json!({
            "refs": { "r": { "k": 1 } },
            "list": [ { "#|ref : r": "" } ]
        });
        let out = expand_refs(&doc, p()).unwrap();
        assert_eq!(out["list"][0], json!({ "k": 1 }));
    }

    #[test]
    fn load_str_reports_bad_json_with_path() {
        let err = load_str(Path::new("broken.json"), "{ nope", None).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn expansion_preserves_document_order() {
        let doc = load_str(p(), r#"{ "z": 1, "a": 2, "m": 3 }"#, None).unwrap();
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}
