//! Downloading the resolved set into a staging directory
//!
//! Each resolved component is placed into the staging directory as a final
//! artifact, either downloaded as published or rebuilt by its repackaging
//! strategy. A component that cannot be staged is reported and skipped; the
//! rest of the set is still staged.

use crate::artifact::ArtifactStore;
use crate::config::RepackageConfig;
use crate::index::Catalog;
use crate::installer::ProgressCallback;
use crate::repackage::{ExternalArchive, RepackageStrategy};
use crate::resolver::{CancelToken, Resolution};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// An artifact placed in the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedArtifact {
    pub identifier: String,
    pub version: String,
    pub path: PathBuf,
}

/// A resolved component that did not make it into staging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedArtifact {
    pub identifier: String,
    pub version: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub staged: Vec<StagedArtifact>,
    pub skipped: Vec<SkippedArtifact>,
}

pub struct Stager<'a> {
    catalog: &'a Catalog,
    store: &'a ArtifactStore,
    repackage: &'a RepackageConfig,
    work_dir: PathBuf,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl<'a> Stager<'a> {
    /// `work_dir` holds source archives and scratch space for repackaging
    pub fn new<P: Into<PathBuf>>(
        catalog: &'a Catalog,
        store: &'a ArtifactStore,
        repackage: &'a RepackageConfig,
        work_dir: P,
    ) -> Self {
        Self {
            catalog,
            store,
            repackage,
            work_dir: work_dir.into(),
            cancel: CancelToken::new(),
            progress: None,
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

    /// Stage every resolved component into `staging_dir`
    ///
    /// Only cancellation and failing to create `staging_dir` are errors.
    pub fn stage(&self, resolution: &Resolution, staging_dir: &Path) -> Result<StageReport> {
        fs::create_dir_all(staging_dir)?;

        let total = resolution.resolved.len() as u64;
        let mut report = StageReport::default();

        for (index, (identifier, version)) in resolution.resolved.iter().enumerate() {
            self.cancel.check()?;

            if let Some(ref cb) = self.progress {
                cb(
                    &format!("Downloading {} v{}", identifier, version),
                    index as u64,
                    total,
                );
            }

            let outcome = match RepackageStrategy::for_identifier(identifier, self.repackage) {
                RepackageStrategy::Standard => {
                    self.stage_published(identifier, version, staging_dir)
                }
                RepackageStrategy::ExternalArchive(external) => {
                    self.stage_external(&external, version, staging_dir)
                }
            };

            match outcome {
                Ok(path) => {
                    log::info!("Staged {} v{} at {}", identifier, version, path.display());
                    report.staged.push(StagedArtifact {
                        identifier: identifier.clone(),
                        version: version.clone(),
                        path,
                    });
                }
                Err(e) => {
                    log::warn!("Skipping {} v{}: {}", identifier, version, e);
                    report.skipped.push(SkippedArtifact {
                        identifier: identifier.clone(),
                        version: version.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(ref cb) = self.progress {
            cb("Downloads complete", total, total);
        }

        Ok(report)
    }

    fn stage_published(&self, identifier: &str, version: &str, staging_dir: &Path) -> Result<PathBuf> {
        let url = self.catalog.find_artifact_url(identifier, version)?;
        let handle = self.store.fetch_into(&url, staging_dir)?;
        Ok(handle.into_path())
    }

    fn stage_external(
        &self,
        external: &ExternalArchive,
        version: &str,
        staging_dir: &Path,
    ) -> Result<PathBuf> {
        let source = self
            .work_dir
            .join(format!("{}-{}-source.tar.gz", external.identifier, version));

        self.store.fetch_as(&external.source_url(version), &source)?;

        external
            .repackage(&source, version, &self.work_dir, staging_dir)?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "{} in the source archive",
                    external.package_path(version).display()
                ))
            })
    }
}
