//! Persona entity — a named, versioned template referencing components.
//!
//! A persona's template contains zero or more `{{name}}` placeholders.
//! The persona can enumerate which component names it references and
//! render itself given a name→text mapping; it has no authority over
//! whether those components exist — the store enforces that.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::record;

/// Placeholder pattern: the maximal run of non-brace characters between
/// double-brace delimiters. The inner text is taken raw — no trimming.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("valid placeholder regex"));

/// A template with placeholder references, stored as one JSON record per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier; equals the storage key the record was loaded from.
    pub name: String,

    /// Short human-readable description.
    pub description: String,

    /// Template text with `{{componentName}}` substitution points.
    pub template: String,

    /// Caller-managed version number; the store never increments it.
    pub version: u32,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
        version: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            template: template.into(),
            version,
        }
    }

    /// Serialize this persona to `path`, replacing any existing record.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        record::write_atomic(path, self)
    }

    /// Deserialize a persona record from `path`.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        record::load(path)
    }

    /// Distinct component names referenced by the template, lowercased,
    /// in order of first appearance.
    pub fn required_components(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let name = match caps.get(1) {
                Some(m) => m.as_str().to_lowercase(),
                None => continue,
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Substitute every placeholder with `data[lowercase(name)]`.
    ///
    /// Substitution is a single literal pass: substituted text is never
    /// re-scanned for placeholders. A referenced name absent from `data`
    /// is an error naming the persona and the missing component; the
    /// store guarantees a complete map on its own render path.
    pub fn render(&self, data: &HashMap<String, String>) -> Result<String> {
        let mut rendered = String::with_capacity(self.template.len());
        let mut last_end = 0;
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            let whole = match caps.get(0) {
                Some(m) => m,
                None => continue,
            };
            let key = caps
                .get(1)
                .map(|m| m.as_str().to_lowercase())
                .unwrap_or_default();
            let value = match data.get(&key) {
                Some(v) => v,
                None => {
                    return Err(Error::MissingComponent {
                        persona: self.name.clone(),
                        component: key,
                    });
                }
            };
            rendered.push_str(&self.template[last_end..whole.start()]);
            rendered.push_str(value);
            last_end = whole.end();
        }
        rendered.push_str(&self.template[last_end..]);
        Ok(rendered)
    }
}
