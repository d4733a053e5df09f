//! Unity project layout and `Packages/manifest.json` handling
//!
//! The manifest is edited as an untyped JSON document so that keys this
//! tool does not know about (scoped registries, testables, ...) survive a
//! load/save cycle in their original order.
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::{ProjectManifest, UnityProject};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = UnityProject::validate("MyProject")?;
//! let mut manifest = ProjectManifest::load(project.root())?;
//! manifest.set_dependency("com.unity.xr.meta-openxr", "2.2.0");
//! manifest.save()?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Manifest location relative to the project root
pub const MANIFEST_PATH: &str = "Packages/manifest.json";

/// A Unity project root that has passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnityProject {
    root: PathBuf,
}

impl UnityProject {
    /// Accept `path` only if it is a directory containing `Assets/` and `Packages/`
    pub fn validate<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref();
        let valid = root.is_dir() && root.join("Assets").is_dir() && root.join("Packages").is_dir();
        if !valid {
            return Err(Error::InvalidProject(root.display().to_string()));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("Packages")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_PATH)
    }
}

/// The project's package manifest
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    path: PathBuf,
    document: Map<String, Value>,
}

impl ProjectManifest {
    /// Load `Packages/manifest.json` from a project root
    pub fn load<P: AsRef<Path>>(project_root: P) -> Result<Self> {
        let path = project_root.as_ref().join(MANIFEST_PATH);

        if !path.is_file() {
            return Err(Error::Manifest(format!("{} not found", path.display())));
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| Error::Manifest(format!("cannot read {}: {}", path.display(), e)))?;
        let document: Value = serde_json::from_str(&content)
            .map_err(|e| Error::Manifest(format!("{} is not valid JSON: {}", path.display(), e)))?;

        let Value::Object(document) = document else {
            return Err(Error::Manifest(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        };

        if let Some(deps) = document.get("dependencies") {
            if !deps.is_object() {
                return Err(Error::Manifest(format!(
                    "\"dependencies\" in {} is not an object",
                    path.display()
                )));
            }
        }

        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dependency(&self, identifier: &str) -> Option<&str> {
        self.document
            .get("dependencies")?
            .get(identifier)?
            .as_str()
    }

    /// Add or overwrite a dependency entry, returning the previous value
    pub fn set_dependency(&mut self, identifier: &str, value: &str) -> Option<String> {
        let deps = self
            .document
            .entry("dependencies")
            .or_insert_with(|| Value::Object(Map::new()));

        // load() rejects a non-object, so this only replaces a value set by hand
        if !deps.is_object() {
            *deps = Value::Object(Map::new());
        }

        deps.as_object_mut()
            .and_then(|deps| deps.insert(identifier.to_string(), Value::String(value.to_string())))
            .and_then(|previous| previous.as_str().map(str::to_string))
    }

    /// Render the document with four-space indentation
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.document.serialize(&mut serializer)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| Error::Manifest(e.to_string()))
    }

    pub fn save(&self) -> Result<()> {
        let content = self.to_pretty_string()?;
        fs::write(&self.path, content).map_err(|e| {
            Error::Manifest(format!("cannot write {}: {}", self.path.display(), e))
        })
    }
}

fn versioned_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+?)-[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z.\-]+)?\.tgz$")
            .expect("valid artifact name regex")
    })
}

/// Manifest identifier for an installed artifact file name
///
/// `org.mixedrealitytoolkit.core-3.0.0-pre.1.tgz` becomes
/// `org.mixedrealitytoolkit.core`. Names without a recognisable version keep
/// everything before the last `-`.
pub fn identifier_from_artifact_name(file_name: &str) -> Option<String> {
    if let Some(caps) = versioned_name_pattern().captures(file_name) {
        return Some(caps[1].to_string());
    }

    let stem = file_name.strip_suffix(".tgz").unwrap_or(file_name);
    stem.rfind('-')
        .map(|pos| &stem[..pos])
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
