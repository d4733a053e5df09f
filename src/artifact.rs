//! Artifact downloads and metadata inspection
//!
//! Artifacts are gzip tarballs whose contents live under `package/`. The
//! store downloads them into a scratch directory, reads the declared
//! dependencies from `package/package.json` without unpacking, and removes
//! copies that were only needed for inspection.

use crate::http::HttpClient;
use crate::{Config, Error, Result};
use flate2::read::GzDecoder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;

/// Location of the metadata entry inside every artifact
pub const METADATA_ENTRY: &str = "package/package.json";

/// A downloaded artifact on local disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactHandle {
    path: PathBuf,
}

impl ArtifactHandle {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

/// Derive the local file name from the last path segment of a URL
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    let decoded = urlencoding::decode(segment).ok()?;
    let name = decoded.trim();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.to_string())
}

pub struct ArtifactStore {
    http: HttpClient,
    scratch_dir: PathBuf,
}

impl ArtifactStore {
    /// Create a store downloading inspection copies into `scratch_dir`
    pub fn new<P: Into<PathBuf>>(http: HttpClient, scratch_dir: P) -> Result<Self> {
        let scratch_dir = scratch_dir.into();
        fs::create_dir_all(&scratch_dir)?;
        Ok(Self { http, scratch_dir })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            HttpClient::new(&config.network)?,
            config.paths.cache_dir()?.join("inspect"),
        )
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Download an artifact into the scratch directory
    pub fn fetch(&self, url: &str) -> Result<ArtifactHandle> {
        self.fetch_into(url, &self.scratch_dir)
    }

    /// Download an artifact into `dir`, named after the URL's last path segment
    pub fn fetch_into(&self, url: &str, dir: &Path) -> Result<ArtifactHandle> {
        let file_name = file_name_from_url(url).ok_or_else(|| Error::Download {
            url: url.to_string(),
            reason: "URL does not end in a file name".to_string(),
        })?;
        self.fetch_as(url, &dir.join(file_name))
    }

    /// Download `url` to exactly `dest`
    pub fn fetch_as(&self, url: &str, dest: &Path) -> Result<ArtifactHandle> {
        log::info!("Downloading {}", url);

        let bytes = self.http.get_bytes(url).map_err(|e| Error::Download {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, &bytes).map_err(|e| Error::Download {
            url: url.to_string(),
            reason: format!("cannot write {}: {}", dest.display(), e),
        })?;

        log::debug!("Saved {} bytes to {}", bytes.len(), dest.display());
        Ok(ArtifactHandle::new(dest))
    }

    /// Declared dependencies of an artifact
    ///
    /// Missing or malformed metadata is logged and reported as no dependencies.
    pub fn read_declared_dependencies(&self, artifact: &ArtifactHandle) -> BTreeMap<String, String> {
        match read_package_metadata(artifact.path()) {
            Ok(deps) => deps,
            Err(e) => {
                log::warn!("{}; treating as having no dependencies", e);
                BTreeMap::new()
            }
        }
    }

    /// Delete an artifact that was only fetched for inspection
    pub fn discard(&self, artifact: ArtifactHandle) {
        if let Err(e) = fs::remove_file(artifact.path()) {
            log::warn!(
                "Could not remove temporary artifact {}: {}",
                artifact.path().display(),
                e
            );
        }
    }
}

fn is_metadata_entry(path: &Path) -> bool {
    let normalized = path.to_string_lossy().replace('\\', "/");
    normalized.trim_start_matches("./") == METADATA_ENTRY
}

/// Read `package/package.json` from a gzip tarball and return its dependencies
pub fn read_package_metadata(tgz_path: &Path) -> Result<BTreeMap<String, String>> {
    let malformed = |reason: String| Error::MalformedMetadata {
        path: tgz_path.display().to_string(),
        reason,
    };

    let file = File::open(tgz_path).map_err(|e| malformed(e.to_string()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let entries = archive.entries().map_err(|e| malformed(e.to_string()))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| malformed(e.to_string()))?;
        let path = entry.path().map_err(|e| malformed(e.to_string()))?;
        if !is_metadata_entry(&path) {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| malformed(e.to_string()))?;
        let metadata: PackageJson =
            serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
        return Ok(metadata.dependencies);
    }

    Err(malformed(format!("no {} entry", METADATA_ENTRY)))
}
