//! Transitive dependency resolution over the release index
//!
//! Each selected component is expanded depth-first: its artifact is
//! downloaded, the declared dependencies are read from its metadata, and
//! every in-family dependency is expanded in turn. When the same component is
//! reached at different versions, the newest one wins; an identifier is never
//! downgraded.
//!
//! Failures below the top level are logged and drop only the affected
//! branch, so a partially broken index still yields a usable resolution.
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::{ArtifactStore, Config, ReleaseIndexClient, Resolver, Selection, SelectablePackage};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let catalog = ReleaseIndexClient::from_config(&config)?.fetch_catalog()?;
//! let store = ArtifactStore::from_config(&config)?;
//!
//! let selections = vec![Selection::latest(SelectablePackage::component("uxcore"))];
//! let resolution = Resolver::new(&catalog, &store, &config.resolver).resolve(&selections)?;
//!
//! for (component, version) in &resolution.resolved {
//!     println!("{} v{}", component, version);
//! }
//! # Ok(())
//! # }
//! ```

use crate::artifact::ArtifactStore;
use crate::config::ResolverConfig;
use crate::index::Catalog;
use crate::installer::ProgressCallback;
use crate::selection::{PackageKind, Selection};
use crate::{version, Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dependencies under this prefix come from the host's own registry
pub const FOREIGN_PREFIX: &str = "com.unity.";

/// Shared flag used to stop a long-running resolution or staging pass
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`Error::Cancelled`] once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Outcome of one resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every component to install, at its chosen version
    pub resolved: BTreeMap<String, String>,
    /// Top-level component selections and the version each started from
    pub user_selections: BTreeMap<String, String>,
    /// Platform runtimes to write into the manifest
    pub platform_requests: BTreeSet<String>,
}

impl Resolution {
    /// Components pulled in only as dependencies
    pub fn dependencies_only(&self) -> BTreeMap<String, String> {
        self.resolved
            .iter()
            .filter(|(name, _)| !self.user_selections.contains_key(*name))
            .map(|(name, version)| (name.clone(), version.clone()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty() && self.platform_requests.is_empty()
    }
}

/// Depth-first resolver
///
/// Holds the working state for a single run; [`Resolver::resolve`] consumes it.
pub struct Resolver<'a> {
    catalog: &'a Catalog,
    store: &'a ArtifactStore,
    in_family_prefix: String,
    max_depth: usize,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
    resolved: BTreeMap<String, String>,
    processed: HashSet<(String, String)>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, store: &'a ArtifactStore, config: &ResolverConfig) -> Self {
        Self {
            catalog,
            store,
            in_family_prefix: format!("{}.", catalog.namespace()),
            max_depth: config.max_depth,
            cancel: CancelToken::new(),
            progress: None,
            resolved: BTreeMap::new(),
            processed: HashSet::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Resolve the full install set for the given selections
    ///
    /// Only cancellation aborts the run. Components missing from the catalog,
    /// failed downloads and unreadable metadata are logged and skipped.
    pub fn resolve(mut self, selections: &[Selection]) -> Result<Resolution> {
        let mut user_selections: BTreeMap<String, String> = BTreeMap::new();
        let mut platform_requests = BTreeSet::new();

        for selection in selections {
            let package = &selection.package;
            match package.kind {
                PackageKind::PlatformRuntime => {
                    platform_requests.insert(package.identifier.clone());
                }
                PackageKind::Component => {
                    let Some(version) = self.starting_version(selection) else {
                        continue;
                    };
                    let keep_existing = match user_selections.get(&package.identifier) {
                        Some(existing) => !version::is_newer(existing, &version)?,
                        None => false,
                    };
                    if !keep_existing {
                        user_selections.insert(package.identifier.clone(), version);
                    }
                }
            }
        }

        for (component, version) in &user_selections {
            self.expand(component, version, 0)?;
        }

        log::info!(
            "Resolved {} components ({} selected, {} platform runtimes)",
            self.resolved.len(),
            user_selections.len(),
            platform_requests.len()
        );

        Ok(Resolution {
            resolved: self.resolved,
            user_selections,
            platform_requests,
        })
    }

    /// Version a top-level component starts from: the requested one if the
    /// catalog has it, otherwise the latest
    fn starting_version(&self, selection: &Selection) -> Option<String> {
        let component = &selection.package.identifier;

        if let Some(requested) = &selection.requested_version {
            if self.catalog.has_version(component, requested) {
                return Some(requested.clone());
            }
            log::warn!(
                "{} v{} is not in the release index; using the latest version instead",
                component,
                requested
            );
        }

        match self.catalog.latest_version(component) {
            Ok(version) => Some(version),
            Err(e) => {
                log::warn!("Skipping selection: {}", e);
                None
            }
        }
    }

    fn expand(&mut self, component: &str, version: &str, depth: usize) -> Result<()> {
        self.cancel.check()?;

        let key = (component.to_string(), version.to_string());
        if self.processed.contains(&key) {
            return Ok(());
        }

        match self.resolved.get(component) {
            Some(existing) => match version::is_newer(existing, version) {
                Ok(true) => {
                    log::info!("Upgrading {} from v{} to v{}", component, existing, version);
                }
                Ok(false) => return Ok(()),
                Err(e) => {
                    log::warn!("Ignoring {} v{}: {}", component, version, e);
                    return Ok(());
                }
            },
            None => {
                if let Err(e) = version::validate(version) {
                    log::warn!("Ignoring {} v{}: {}", component, version, e);
                    return Ok(());
                }
            }
        }

        if depth > self.max_depth {
            log::warn!(
                "Dependency chain deeper than {} at {} v{}; not expanding further",
                self.max_depth,
                component,
                version
            );
            return Ok(());
        }

        self.resolved.insert(component.to_string(), version.to_string());
        self.processed.insert(key);

        if let Some(ref cb) = self.progress {
            cb(
                &format!("Resolving {} v{}", component, version),
                self.resolved.len() as u64,
                0,
            );
        }

        let url = match self.catalog.find_artifact_url(component, version) {
            Ok(url) => url,
            Err(e) => {
                log::info!("{}; its dependencies are not expanded", e);
                return Ok(());
            }
        };

        let artifact = match self.store.fetch(&url) {
            Ok(artifact) => artifact,
            Err(e) => {
                log::warn!("Cannot inspect {} v{}: {}", component, version, e);
                return Ok(());
            }
        };
        let dependencies = self.store.read_declared_dependencies(&artifact);
        self.store.discard(artifact);

        for (name, dep_version) in dependencies {
            if name.starts_with(FOREIGN_PREFIX) {
                log::debug!("{} depends on {}; left to the host registry", component, name);
                continue;
            }
            let target = name
                .strip_prefix(self.in_family_prefix.as_str())
                .unwrap_or(&name);
            self.expand(target, &dep_version, depth + 1)?;
        }

        Ok(())
    }
}
