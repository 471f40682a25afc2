//! Component entity — a named, versioned reusable text fragment.
//!
//! Components carry no behavior beyond identity and storage; personas
//! reference them by name and the store substitutes their text at render
//! time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record;

/// A reusable text fragment, stored as one JSON record per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Unique identifier; equals the storage key the record was loaded from.
    pub name: String,

    /// Short human-readable description.
    pub description: String,

    /// Opaque text payload substituted into persona templates.
    pub text: String,

    /// Caller-managed version number; the store never increments it.
    pub version: u32,
}

impl Component {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        text: impl Into<String>,
        version: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            text: text.into(),
            version,
        }
    }

    /// Serialize this component to `path`, replacing any existing record.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        record::write_atomic(path, self)
    }

    /// Deserialize a component record from `path`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        record::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("greeting.json");

        let component = Component::new("greeting", "opening line", "Hello", 2);
        component.save_to_file(&path).unwrap();

        let loaded = Component::load_from_file(&path).unwrap();
        assert_eq!(loaded, component);
    }

    #[test]
    fn test_save_overwrites_existing_record() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("greeting.json");

        Component::new("greeting", "v1", "Hello", 1)
            .save_to_file(&path)
            .unwrap();
        Component::new("greeting", "v2", "Hi", 2)
            .save_to_file(&path)
            .unwrap();

        let loaded = Component::load_from_file(&path).unwrap();
        assert_eq!(loaded.description, "v2");
        assert_eq!(loaded.text, "Hi");
        assert_eq!(loaded.version, 2);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("no-such-dir").join("c.json");
        let err = Component::new("c", "", "", 1).save_to_file(&path).unwrap_err();
        assert!(matches!(err, Error::IoWrite { .. }));
    }

    #[test]
    fn test_load_rejects_mistyped_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(
            &path,
            r#"{"name": "bad", "description": "d", "text": "t", "version": "one"}"#,
        )
        .unwrap();

        let err = Component::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_load_rejects_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, r#"{"name": "bad"}"#).unwrap();

        let err = Component::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }
}
