//! Installing staged artifacts into a Unity project
//!
//! Staged artifacts replace the contents of `Packages/MixedReality` as a
//! whole. The previous directory is kept as a backup until the new one is in
//! place and restored if the swap fails. The manifest is then updated with a
//! `file:` entry per installed artifact plus any requested platform runtimes.
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::{Installer, UnityProject};
//! use std::collections::BTreeSet;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = UnityProject::validate("MyProject")?;
//! let installer = Installer::new(project);
//! let staging = installer.prepare_staging()?;
//! // ... download artifacts into `staging` ...
//! let report = installer.install(&staging, &BTreeSet::new())?;
//! println!("{} packages written to the manifest", report.installed.len());
//! # Ok(())
//! # }
//! ```

use crate::manifest::{identifier_from_artifact_name, ProjectManifest, UnityProject};
use crate::platform::{detect_editor_version, UnityVersion};
use crate::selection::{find_platform_runtime, PlatformDecision};
use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress callback for long-running operations
///
/// Called with:
/// - `message`: Description of current operation (e.g., "Downloading core v3.0.0")
/// - `current`: Items completed so far
/// - `total`: Total items, or 0 when unknown
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Installation directory name below `Packages/`
pub const INSTALL_DIR_NAME: &str = "MixedReality";

const STAGING_DIR_NAME: &str = ".mrfeature-staging";
const BACKUP_SUFFIX: &str = ".mrfeature_backup";

/// A manifest entry written for an installed artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub identifier: String,
    pub manifest_value: String,
}

/// How a requested platform runtime was handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformOutcome {
    pub identifier: String,
    pub decision: PlatformDecision,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<InstalledPackage>,
    pub platform: Vec<PlatformOutcome>,
    /// False when nothing was staged and the existing directory was kept
    pub replaced_install_dir: bool,
}

pub struct Installer {
    project: UnityProject,
    editor_version: Option<UnityVersion>,
    progress: Option<ProgressCallback>,
}

impl Installer {
    /// Create an installer; the editor version is read from the project
    pub fn new(project: UnityProject) -> Self {
        let editor_version = detect_editor_version(project.root());
        match editor_version {
            Some(v) => log::info!("Project editor version: {}", v),
            None => log::warn!("Could not determine the project's editor version"),
        }
        Self {
            project,
            editor_version,
            progress: None,
        }
    }

    pub fn with_editor_version(mut self, editor_version: Option<UnityVersion>) -> Self {
        self.editor_version = editor_version;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn project(&self) -> &UnityProject {
        &self.project
    }

    pub fn editor_version(&self) -> Option<&UnityVersion> {
        self.editor_version.as_ref()
    }

    pub fn install_dir(&self) -> PathBuf {
        self.project.packages_dir().join(INSTALL_DIR_NAME)
    }

    /// Staging location; on the same filesystem as the install directory
    pub fn staging_dir(&self) -> PathBuf {
        self.project.packages_dir().join(STAGING_DIR_NAME)
    }

    /// Create an empty staging directory, clearing leftovers from earlier runs
    pub fn prepare_staging(&self) -> Result<PathBuf> {
        let staging = self.staging_dir();
        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(|e| {
                Error::FileSystem(format!(
                    "Failed to clear staging directory '{}': {}",
                    staging.display(),
                    e
                ))
            })?;
        }
        fs::create_dir_all(&staging)?;
        Ok(staging)
    }

    /// Move staged artifacts into place and update the manifest
    ///
    /// The manifest is loaded before anything on disk changes, so a missing
    /// manifest leaves the project untouched. An empty staging directory
    /// keeps the existing installation directory.
    pub fn install(
        &self,
        staging_dir: &Path,
        platform_requests: &BTreeSet<String>,
    ) -> Result<InstallReport> {
        let mut manifest = ProjectManifest::load(self.project.root())?;
        let install_dir = self.install_dir();
        let mut report = InstallReport::default();

        if list_artifacts(staging_dir)?.is_empty() {
            log::info!(
                "Nothing staged; keeping {} as it is",
                install_dir.display()
            );
            remove_staging(staging_dir);
        } else {
            if let Some(ref cb) = self.progress {
                cb(&format!("Replacing {}", install_dir.display()), 0, 1);
            }
            swap_directory(staging_dir, &install_dir)?;
            report.replaced_install_dir = true;
        }

        if install_dir.is_dir() {
            for file_name in list_artifacts(&install_dir)? {
                let Some(identifier) = identifier_from_artifact_name(&file_name) else {
                    log::warn!("Cannot derive a package name from {}, skipping", file_name);
                    continue;
                };
                let manifest_value = format!("file:{}/{}", INSTALL_DIR_NAME, file_name);
                manifest.set_dependency(&identifier, &manifest_value);
                report.installed.push(InstalledPackage {
                    identifier,
                    manifest_value,
                });
            }
        }

        for identifier in platform_requests {
            let Some(runtime) = find_platform_runtime(identifier) else {
                log::warn!("Unknown platform runtime '{}', skipping", identifier);
                continue;
            };

            let decision = runtime.rule.decide(self.editor_version.as_ref());
            match decision.version() {
                Some(version) => {
                    log::info!("Adding {} v{} ({:?})", identifier, version, decision);
                    manifest.set_dependency(identifier, version);
                }
                None => log::warn!("Not adding {}: {:?}", identifier, decision),
            }
            report.platform.push(PlatformOutcome {
                identifier: identifier.clone(),
                decision,
            });
        }

        manifest.save()?;

        if let Some(ref cb) = self.progress {
            cb("Updated manifest", 1, 1);
        }

        Ok(report)
    }
}

/// Artifact file names in `dir`, sorted; a missing directory has none
fn list_artifacts(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name.ends_with(".tgz"))
        .collect();
    names.sort();
    Ok(names)
}

fn remove_staging(staging_dir: &Path) {
    if staging_dir.exists() {
        if let Err(e) = fs::remove_dir_all(staging_dir) {
            log::warn!(
                "Could not remove staging directory {}: {}",
                staging_dir.display(),
                e
            );
        }
    }
}

/// Replace `dest` with `staging`, restoring the old `dest` on failure
fn swap_directory(staging: &Path, dest: &Path) -> Result<()> {
    let dest_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| INSTALL_DIR_NAME.to_string());
    let backup = dest.with_file_name(format!("{}{}", dest_name, BACKUP_SUFFIX));

    // Remove any stale backup from a previous failed install
    if backup.exists() {
        let _ = fs::remove_dir_all(&backup);
    }

    let had_existing = dest.exists();
    if had_existing {
        fs::rename(dest, &backup).map_err(|e| {
            Error::FileSystem(format!(
                "Failed to back up '{}' to '{}': {}",
                dest.display(),
                backup.display(),
                e
            ))
        })?;
    }

    if let Err(e) = fs::rename(staging, dest) {
        if had_existing {
            if let Err(restore) = fs::rename(&backup, dest) {
                log::error!(
                    "Could not restore '{}' from '{}': {}",
                    dest.display(),
                    backup.display(),
                    restore
                );
            }
        }
        return Err(Error::FileSystem(format!(
            "Failed to move '{}' to '{}': {}",
            staging.display(),
            dest.display(),
            e
        )));
    }

    if had_existing {
        if let Err(e) = fs::remove_dir_all(&backup) {
            log::warn!("Could not remove backup {}: {}", backup.display(), e);
        }
    }

    Ok(())
}
