//! mrfeature - Install Mixed Reality Toolkit components into Unity projects
//!
//! mrfeature reads the toolkit's public release index, resolves the full
//! transitive set of components needed for a selection, downloads the
//! artifacts and wires them into a project's `Packages/manifest.json`.
//!
//! - Transitive resolution across the release index with newest-wins upgrades
//! - Repackaging of dependencies only distributed as source archives
//! - Editor-version-aware platform runtime entries
//! - Atomic replacement of the installation directory with rollback
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::{
//!     ArtifactStore, Config, Installer, ReleaseIndexClient, Resolver, SelectablePackage,
//!     Selection, Stager, UnityProject,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let project = UnityProject::validate("MyProject")?;
//!
//! let catalog = ReleaseIndexClient::from_config(&config)?.fetch_catalog()?;
//! let store = ArtifactStore::from_config(&config)?;
//!
//! let selections = vec![Selection::latest(SelectablePackage::component("input"))];
//! let resolution = Resolver::new(&catalog, &store, &config.resolver).resolve(&selections)?;
//!
//! let installer = Installer::new(project);
//! let staging = installer.prepare_staging()?;
//! Stager::new(&catalog, &store, &config.repackage, config.paths.cache_dir()?)
//!     .stage(&resolution, &staging)?;
//! installer.install(&staging, &resolution.platform_requests)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`version`] - Version comparison for release artifacts
//! - [`index`] - Release index client and catalog
//! - [`artifact`] - Artifact downloads and metadata inspection
//! - [`resolver`] - Transitive dependency resolution
//! - [`repackage`] - Rebuilding externally distributed packages
//! - [`stage`] - Downloading the resolved set
//! - [`installer`] - Installing into a project
//! - [`manifest`] - Project layout and manifest editing
//! - [`platform`] - Unity editor version detection
//! - [`selection`] - Selectable packages and platform runtime rules
//! - [`config`] - User configuration management
//! - [`error`] - Error types and result handling

pub mod artifact;
pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod installer;
pub mod manifest;
pub mod platform;
pub mod repackage;
pub mod resolver;
pub mod selection;
pub mod stage;
pub mod version;

pub use artifact::{ArtifactHandle, ArtifactStore};
pub use config::Config;
pub use error::{Error, Result};
pub use http::HttpClient;
pub use index::{Catalog, CatalogEntry, ReleaseIndexClient};
pub use installer::{InstallReport, Installer, ProgressCallback};
pub use manifest::{ProjectManifest, UnityProject};
pub use platform::{detect_editor_version, UnityVersion};
pub use repackage::RepackageStrategy;
pub use resolver::{CancelToken, Resolution, Resolver};
pub use selection::{PackageKind, PlatformDecision, SelectablePackage, Selection};
pub use stage::{StageReport, Stager};
