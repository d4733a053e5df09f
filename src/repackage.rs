//! Repackaging of dependencies that are not published as installable artifacts
//!
//! The graphics tools package is only distributed as a GitHub source archive.
//! It is rebuilt into a standard artifact: the package folder is pulled out of
//! the source tree and archived again with its contents under `package/`.

use crate::config::RepackageConfig;
use crate::{Error, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, Header};
use walkdir::WalkDir;

pub const GRAPHICS_TOOLS: &str = "com.microsoft.mrtk.graphicstools.unity";

/// Where an externally distributed package comes from and how it is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalArchive {
    /// Identifier used for the rebuilt artifact
    pub identifier: String,
    /// Source archive URL; `{version}` is substituted
    pub url_template: String,
    /// Directory inside the extracted archive; `{version}` is substituted
    pub root_template: String,
    /// Package folder below the root directory
    pub package_dir: String,
}

impl ExternalArchive {
    pub fn source_url(&self, version: &str) -> String {
        self.url_template.replace("{version}", version)
    }

    /// Relative path of the package folder inside the extracted archive
    pub fn package_path(&self, version: &str) -> PathBuf {
        Path::new(&self.root_template.replace("{version}", version)).join(&self.package_dir)
    }

    /// File name of the rebuilt artifact
    pub fn artifact_name(&self, version: &str) -> String {
        format!("{}-{}.tgz", self.identifier, version)
    }

    /// Rebuild the artifact from a downloaded source archive
    ///
    /// The source archive is consumed. The rebuilt artifact is written to
    /// `output_dir`; scratch space is taken from `work_dir`. Returns `Ok(None)`
    /// when the expected package folder is not in the archive.
    pub fn repackage(
        &self,
        source_archive: &Path,
        version: &str,
        work_dir: &Path,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        log::info!("Repackaging {} v{}", self.identifier, version);

        fs::create_dir_all(work_dir)?;
        let scratch = tempfile::Builder::new()
            .prefix("repackage-")
            .tempdir_in(work_dir)?;

        let result = self.repackage_in(source_archive, version, scratch.path(), output_dir);

        if let Err(e) = fs::remove_file(source_archive) {
            log::warn!(
                "Could not remove source archive {}: {}",
                source_archive.display(),
                e
            );
        }
        if let Err(e) = scratch.close() {
            log::warn!("Could not remove repackaging scratch directory: {}", e);
        }

        result
    }

    fn repackage_in(
        &self,
        source_archive: &Path,
        version: &str,
        scratch: &Path,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let extract_dir = scratch.join("extract");
        let staging_dir = scratch.join("package");
        fs::create_dir_all(&extract_dir)?;

        let file = File::open(source_archive)?;
        Archive::new(GzDecoder::new(file))
            .unpack(&extract_dir)
            .map_err(|e| {
                Error::FileSystem(format!(
                    "Failed to extract {}: {}",
                    source_archive.display(),
                    e
                ))
            })?;

        let package_path = extract_dir.join(self.package_path(version));
        if !package_path.is_dir() {
            log::info!(
                "{} not found in {}; nothing to repackage",
                self.package_path(version).display(),
                source_archive.display()
            );
            return Ok(None);
        }

        fs::rename(&package_path, &staging_dir)?;

        fs::create_dir_all(output_dir)?;
        let output = output_dir.join(self.artifact_name(version));
        create_package_tgz(&staging_dir, &output)?;

        log::info!("Rebuilt {}", output.display());
        Ok(Some(output))
    }
}

/// Install strategy for a resolved component, chosen once per identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepackageStrategy {
    /// Download the artifact listed in the release index
    Standard,
    /// Rebuild the artifact from an external source archive
    ExternalArchive(ExternalArchive),
}

impl RepackageStrategy {
    pub fn for_identifier(identifier: &str, config: &RepackageConfig) -> Self {
        match identifier {
            GRAPHICS_TOOLS => RepackageStrategy::ExternalArchive(ExternalArchive {
                identifier: GRAPHICS_TOOLS.to_string(),
                url_template: config.graphics_tools_url.clone(),
                root_template: "MixedReality-GraphicsTools-Unity-{version}".to_string(),
                package_dir: GRAPHICS_TOOLS.to_string(),
            }),
            _ => RepackageStrategy::Standard,
        }
    }
}

/// Archive the contents of `source_dir` under a `package/` root
pub fn create_package_tgz(source_dir: &Path, output: &Path) -> Result<()> {
    let file = File::create(output)?;
    let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

    let package_root = Path::new("package");

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::FileSystem(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| Error::FileSystem(e.to_string()))?;
        let archive_path = package_root.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            let mut header = Header::new_gnu();
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, &archive_path, std::io::empty())?;
        } else if file_type.is_file() {
            let mut file = File::open(entry.path())?;
            let mut header = Header::new_gnu();
            header.set_size(entry.metadata().map_err(|e| Error::FileSystem(e.to_string()))?.len());
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, &archive_path, &mut file)?;
        } else {
            log::debug!("Skipping non-regular entry {}", entry.path().display());
        }
    }

    builder.into_inner()?.finish()?;
    Ok(())
}
