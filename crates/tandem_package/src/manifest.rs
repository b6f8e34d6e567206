//! Application manifests
//!
//! A manifest is a JSON object addressed by dotted key paths: `window.icon`
//! reads `{"window": {"icon": ...}}`, and writing `icons.32` creates the
//! `icons` object when it is missing. Reads also accept a top-level key
//! spelled with the dots (`{"window.icon": ...}`); the nested form wins.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PackageError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    root: Map<String, Value>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_value(value: Value) -> Result<Self, PackageError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            _ => Err(PackageError::NotAnObject),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, PackageError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Look up the value at a dotted key path, falling back to a flat key
    /// named `path`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.get_nested(path).or_else(|| self.root.get(path))
    }

    fn get_nested(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// The string at `path`; `None` when absent or not a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Store `value` at a dotted key path, replacing whatever was there.
    ///
    /// Missing or non-object intermediates become empty objects.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let Some(last) = segments.pop() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in segments {
            let slot = current
                .entry(segment.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert(last.to_owned(), value.into());
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_read_nested_objects() {
        let manifest = Manifest::from_value(json!({
            "main": "index.html",
            "window": { "icon": "app.png", "width": 800 }
        }))
        .unwrap();

        assert_eq!(manifest.get_str("main"), Some("index.html"));
        assert_eq!(manifest.get_str("window.icon"), Some("app.png"));
        assert_eq!(manifest.get_str("window.width"), None);
        assert_eq!(manifest.get("window.width"), Some(&json!(800)));
        assert_eq!(manifest.get("window.icon.deeper"), None);
        assert_eq!(manifest.get("missing"), None);
    }

    #[test]
    fn flat_dotted_keys_are_a_fallback() {
        let flat = Manifest::from_value(json!({ "window.icon": "flat.png" })).unwrap();
        assert_eq!(flat.get_str("window.icon"), Some("flat.png"));

        let both = Manifest::from_value(json!({
            "window.icon": "flat.png",
            "window": { "icon": "nested.png" }
        }))
        .unwrap();
        assert_eq!(both.get_str("window.icon"), Some("nested.png"));
    }

    #[test]
    fn set_creates_and_replaces_intermediates() {
        let mut manifest = Manifest::from_value(json!({ "app": "not an object" })).unwrap();
        manifest.set("icons.32", "icon.png");
        manifest.set("app.background.scripts", json!(["a.js"]));

        assert_eq!(
            manifest.into_value(),
            json!({
                "icons": { "32": "icon.png" },
                "app": { "background": { "scripts": ["a.js"] } }
            })
        );
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(matches!(
            Manifest::from_json("[1, 2]"),
            Err(PackageError::NotAnObject)
        ));
        assert!(matches!(Manifest::from_json("{"), Err(PackageError::Json(_))));
    }
}
