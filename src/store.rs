//! Persona store — per-project persistence and integrity for components
//! and personas.
//!
//! The store owns a two-subdirectory layout under one project root, holds
//! no in-memory cache (every call re-reads from disk), and enforces the
//! referential rules between the two entity kinds: a persona can only be
//! saved when every component it references exists, and a component can
//! only be deleted when no persona references it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::component::Component;
use crate::error::{Error, Result};
use crate::persona::Persona;
use crate::record;

// ─────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────

/// Directory under the project root holding both entity kinds.
const SERVICE_DIR: &str = ".cline-personas";
/// Subdirectory for component records.
const COMPONENTS_DIR: &str = "components";
/// Subdirectory for persona records.
const PERSONAS_DIR: &str = "personas";
/// Sentinel file holding the active persona's rendered text.
const RULES_FILE: &str = ".clinerules";

const RECORD_EXT: &str = ".json";

// ─────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────

/// On-disk layout names, fixed at store construction.
///
/// The default reproduces the wire layout existing stores use; tests and
/// embedders can substitute their own names instead of patching paths
/// inside the store.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    /// Service directory under the project root.
    pub service_dir: String,
    /// Component subdirectory inside the service directory.
    pub components_dir: String,
    /// Persona subdirectory inside the service directory.
    pub personas_dir: String,
    /// Sentinel file name under the project root.
    pub rules_file: String,
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self {
            service_dir: SERVICE_DIR.to_string(),
            components_dir: COMPONENTS_DIR.to_string(),
            personas_dir: PERSONAS_DIR.to_string(),
            rules_file: RULES_FILE.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Persona Store
// ─────────────────────────────────────────────────────────────────

/// File-backed store for components and personas under one project root.
pub struct PersonaStore {
    /// Project root; every path the store touches lives beneath it.
    project_root: PathBuf,

    /// Directory and file names, fixed at construction.
    layout: StoreLayout,
}

impl PersonaStore {
    /// Create a store over `project_root` with the standard layout.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::with_layout(project_root, StoreLayout::default())
    }

    /// Create a store with a custom layout.
    pub fn with_layout(project_root: impl Into<PathBuf>, layout: StoreLayout) -> Self {
        Self {
            project_root: project_root.into(),
            layout,
        }
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Path of the sentinel file holding the active representation.
    pub fn rules_path(&self) -> PathBuf {
        self.project_root.join(&self.layout.rules_file)
    }

    fn component_root(&self) -> PathBuf {
        self.project_root
            .join(&self.layout.service_dir)
            .join(&self.layout.components_dir)
    }

    fn persona_root(&self) -> PathBuf {
        self.project_root
            .join(&self.layout.service_dir)
            .join(&self.layout.personas_dir)
    }

    fn component_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.component_root().join(format!("{name}{RECORD_EXT}")))
    }

    fn persona_path(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.persona_root().join(format!("{name}{RECORD_EXT}")))
    }

    /// Create `dir` if absent. Called on write paths only; read and list
    /// paths treat an absent directory as empty.
    fn ensure_dir(dir: &Path) -> Result<()> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            debug!(path = %dir.display(), "Created store directory");
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Component Operations
    // ─────────────────────────────────────────────────────────────

    /// Construct and persist a component, overwriting any existing record.
    pub fn set_component(
        &self,
        name: &str,
        description: &str,
        text: &str,
        version: u32,
    ) -> Result<()> {
        let path = self.component_path(name)?;
        Self::ensure_dir(&self.component_root())?;
        Component::new(name, description, text, version).save_to_file(&path)?;
        debug!(component = %name, version, "Component persisted");
        Ok(())
    }

    /// Load a component by name. Absence is not an error.
    pub fn get_component(&self, name: &str) -> Result<Option<Component>> {
        let path = self.component_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        Component::load_from_file(&path).map(Some)
    }

    /// Names of all stored components, in directory enumeration order.
    pub fn list_components(&self) -> Result<Vec<String>> {
        list_records(&self.component_root())
    }

    /// Delete a component, unless a persona still references it.
    ///
    /// The dependency scan runs before anything is removed; on violation
    /// the error lists every dependent persona and the file is untouched.
    /// Deleting an absent component is a no-op.
    pub fn delete_component(&self, name: &str) -> Result<()> {
        let path = self.component_path(name)?;

        let needle = name.to_lowercase();
        let mut dependents = Vec::new();
        for persona_name in self.list_personas()? {
            let persona = match self.get_persona(&persona_name)? {
                Some(p) => p,
                None => continue,
            };
            if persona.required_components().contains(&needle) {
                dependents.push(persona_name);
            }
        }
        if !dependents.is_empty() {
            return Err(Error::ComponentInUse {
                name: name.to_string(),
                dependents,
            });
        }

        if path.exists() {
            fs::remove_file(&path)?;
            debug!(component = %name, "Component deleted");
        }
        Ok(())
    }

    /// Map every stored component name to its description. Entities that
    /// vanish mid-scan are skipped.
    pub fn describe_components(&self) -> Result<HashMap<String, String>> {
        let mut descriptions = HashMap::new();
        for name in self.list_components()? {
            if let Some(component) = self.get_component(&name)? {
                descriptions.insert(name, component.description);
            }
        }
        Ok(descriptions)
    }

    // ─────────────────────────────────────────────────────────────
    // Persona Operations
    // ─────────────────────────────────────────────────────────────

    /// Validate and persist a persona, overwriting any existing record.
    ///
    /// Every component the template references must exist at call time;
    /// otherwise the save fails naming the first missing component and
    /// nothing is written.
    pub fn set_persona(
        &self,
        name: &str,
        description: &str,
        template: &str,
        version: u32,
    ) -> Result<()> {
        let path = self.persona_path(name)?;
        let persona = Persona::new(name, description, template, version);

        for component_name in persona.required_components() {
            if self.resolve_component(&component_name)?.is_none() {
                return Err(Error::MissingComponent {
                    persona: name.to_string(),
                    component: component_name,
                });
            }
        }

        Self::ensure_dir(&self.persona_root())?;
        persona.save_to_file(&path)?;
        debug!(persona = %name, version, "Persona persisted");
        Ok(())
    }

    /// Load a persona by name. Absence is not an error.
    pub fn get_persona(&self, name: &str) -> Result<Option<Persona>> {
        let path = self.persona_path(name)?;
        if !path.exists() {
            return Ok(None);
        }
        Persona::load_from_file(&path).map(Some)
    }

    /// Names of all stored personas, in directory enumeration order.
    pub fn list_personas(&self) -> Result<Vec<String>> {
        list_records(&self.persona_root())
    }

    /// Delete a persona. No referential constraint applies; deleting an
    /// absent persona is a no-op.
    pub fn delete_persona(&self, name: &str) -> Result<()> {
        let path = self.persona_path(name)?;
        if path.exists() {
            fs::remove_file(&path)?;
            debug!(persona = %name, "Persona deleted");
        }
        Ok(())
    }

    /// Map every stored persona name to its description. Entities that
    /// vanish mid-scan are skipped.
    pub fn describe_personas(&self) -> Result<HashMap<String, String>> {
        let mut descriptions = HashMap::new();
        for name in self.list_personas()? {
            if let Some(persona) = self.get_persona(&name)? {
                descriptions.insert(name, persona.description);
            }
        }
        Ok(descriptions)
    }

    // ─────────────────────────────────────────────────────────────
    // Rendering / Activation
    // ─────────────────────────────────────────────────────────────

    /// Render a persona by resolving every required component's text.
    pub fn render_persona(&self, name: &str) -> Result<String> {
        let persona = self
            .get_persona(name)?
            .ok_or_else(|| Error::PersonaNotFound {
                name: name.to_string(),
            })?;

        let mut data = HashMap::new();
        for component_name in persona.required_components() {
            let component = self.resolve_component(&component_name)?.ok_or_else(|| {
                Error::MissingComponent {
                    persona: name.to_string(),
                    component: component_name.clone(),
                }
            })?;
            data.insert(component_name, component.text);
        }

        persona.render(&data)
    }

    /// Write a persona's rendered text to the sentinel file, making it
    /// the active persona.
    ///
    /// Activation and detection share one representation: the rendered
    /// text. `get_active_persona` compares the same bytes this writes.
    pub fn activate_persona(&self, name: &str) -> Result<()> {
        let rendered = self.render_persona(name)?;
        record::write_bytes_atomic(&self.rules_path(), rendered.as_bytes())?;
        info!(persona = %name, "Persona activated");
        Ok(())
    }

    /// Name of the persona whose rendered text matches the sentinel file
    /// byte-for-byte, if any.
    ///
    /// Activeness is derived, never stored: every known persona is
    /// re-rendered on each call and compared in list order. An absent
    /// sentinel, an unmatched one, and a persona that no longer renders
    /// (store edited externally) all yield the same normal outcome.
    pub fn get_active_persona(&self) -> Result<Option<String>> {
        let rules_path = self.rules_path();
        if !rules_path.exists() {
            return Ok(None);
        }
        let current = fs::read(&rules_path).map_err(|e| Error::IoRead {
            path: rules_path,
            source: e,
        })?;

        for name in self.list_personas()? {
            match self.render_persona(&name) {
                Ok(rendered) if rendered.as_bytes() == current.as_slice() => {
                    return Ok(Some(name));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    // ─────────────────────────────────────────────────────────────
    // Resolution
    // ─────────────────────────────────────────────────────────────

    /// Resolve a component reference case-insensitively.
    ///
    /// Storage is case-preserving, so the stored name may differ from the
    /// (lowercased) reference. The direct lookup covers the common
    /// lowercase-on-disk case without a scan; otherwise stored names are
    /// compared ignoring ASCII case.
    fn resolve_component(&self, name: &str) -> Result<Option<Component>> {
        let direct = match self.get_component(name) {
            Ok(found) => found,
            // A reference that cannot name a stored file is unresolvable,
            // not invalid input; let the caller report the missing name.
            Err(Error::InvalidName { .. }) => None,
            Err(e) => return Err(e),
        };
        if direct.is_some() {
            return Ok(direct);
        }

        for stored in self.list_components()? {
            if stored.eq_ignore_ascii_case(name) {
                return self.get_component(&stored);
            }
        }
        Ok(None)
    }
}

/// Entity names double as file stems; reject the ones that would escape
/// the store directory or collide with directory entries.
fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name collides with a directory entry")
    } else if name.contains(['/', '\\', '\0']) {
        Some("name contains a path separator or NUL")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Record names in `dir`, in directory enumeration order. An absent
/// directory is the same as an empty one.
fn list_records(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let file_name = entry?.file_name().to_string_lossy().to_string();
        if let Some(stem) = file_name.strip_suffix(RECORD_EXT) {
            names.push(stem.to_string());
        }
    }
    Ok(names)
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
