//! Release index client and the in-memory catalog it produces
//!
//! The release index is a JSON list of releases, each listing downloadable
//! assets. Every asset named `<namespace>.<component>-<version>.tgz` becomes
//! one [`CatalogEntry`].
//!
//! # Examples
//!
//! ```no_run
//! use mrfeature::{Config, ReleaseIndexClient};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! let catalog = ReleaseIndexClient::from_config(&config)?.fetch_catalog()?;
//!
//! for component in catalog.list_components() {
//!     println!("{} (latest {})", component, catalog.latest_version(&component)?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::http::HttpClient;
use crate::selection::{platform_runtimes, SelectablePackage};
use crate::{version, Config, Error, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// One published artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub component: String,
    pub version: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    browser_download_url: String,
}

/// Build the artifact file name pattern for a namespace
///
/// Captures the component name and the version.
pub fn artifact_name_pattern(namespace: &str) -> Regex {
    Regex::new(&format!(
        r"^{}\.(.+?)-([0-9]+\.[0-9]+\.[0-9]+(?:-pre\.[0-9]+)?)\.tgz$",
        regex::escape(namespace)
    ))
    .expect("artifact name pattern is a valid regex")
}

/// Every artifact discoverable in the release index
///
/// Built once per run and passed by reference; never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    namespace: String,
    entries: Vec<CatalogEntry>,
    /// component -> versions, newest first
    versions: BTreeMap<String, Vec<String>>,
}

impl Catalog {
    /// Build a catalog from already-parsed entries
    pub fn from_entries(namespace: &str, entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut versions: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in &entries {
            let list = versions.entry(entry.component.clone()).or_default();
            if !list.contains(&entry.version) {
                list.push(entry.version.clone());
            }
        }

        for list in versions.values_mut() {
            // Versions come from the artifact pattern, so comparison cannot fail here
            let mut failure = None;
            list.sort_by(|a, b| {
                version::compare(b, a).unwrap_or_else(|e| {
                    failure.get_or_insert(e);
                    std::cmp::Ordering::Equal
                })
            });
            if let Some(e) = failure {
                return Err(e);
            }
        }

        Ok(Self {
            namespace: namespace.to_string(),
            entries,
            versions,
        })
    }

    /// Parse a release index response body
    pub fn from_json(namespace: &str, body: &[u8]) -> Result<Self> {
        let releases: Vec<Release> =
            serde_json::from_slice(body).map_err(|e| Error::Parse(e.to_string()))?;

        let pattern = artifact_name_pattern(namespace);
        let entries = releases
            .iter()
            .flat_map(|release| release.assets.iter())
            .filter_map(|asset| {
                let caps = pattern.captures(&asset.name)?;
                if asset.browser_download_url.is_empty() {
                    log::warn!("Asset {} has no download URL, ignoring", asset.name);
                    return None;
                }
                Some(CatalogEntry {
                    component: caps[1].to_string(),
                    version: caps[2].to_string(),
                    url: asset.browser_download_url.clone(),
                })
            })
            .collect();

        Self::from_entries(namespace, entries)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All component names, sorted
    pub fn list_components(&self) -> BTreeSet<String> {
        self.versions.keys().cloned().collect()
    }

    /// Published versions of a component, newest first
    pub fn versions(&self, component: &str) -> &[String] {
        self.versions
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_version(&self, component: &str, version: &str) -> bool {
        self.versions(component).iter().any(|v| v == version)
    }

    pub fn latest_version(&self, component: &str) -> Result<String> {
        self.versions(component)
            .first()
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("component '{}' is not in the catalog", component)))
    }

    pub fn find_artifact_url(&self, component: &str, version: &str) -> Result<String> {
        self.entries
            .iter()
            .find(|e| e.component == component && e.version == version)
            .map(|e| e.url.clone())
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "no artifact for {} v{} in the catalog",
                    component, version
                ))
            })
    }

    /// Menu contents: components in name order, then the platform runtimes
    pub fn selectable_packages(&self) -> Vec<SelectablePackage> {
        self.versions
            .keys()
            .map(|name| SelectablePackage::component(name))
            .chain(
                platform_runtimes()
                    .into_iter()
                    .map(|r| SelectablePackage::platform_runtime(r.display_name, r.identifier)),
            )
            .collect()
    }
}

/// Client for the remote release index
pub struct ReleaseIndexClient {
    url: String,
    namespace: String,
    http: HttpClient,
}

impl ReleaseIndexClient {
    pub fn new(url: &str, namespace: &str, http: HttpClient) -> Self {
        Self {
            url: url.to_string(),
            namespace: namespace.to_string(),
            http,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            &config.index.url,
            &config.index.namespace,
            HttpClient::new(&config.network)?,
        ))
    }

    /// Fetch and parse the release index
    ///
    /// Fails with [`Error::Network`] when the index cannot be reached and
    /// [`Error::Parse`] when the body is not a release list.
    pub fn fetch_catalog(&self) -> Result<Catalog> {
        log::info!("Fetching release index from {}", self.url);

        let body = self
            .http
            .get_bytes(&self.url)
            .map_err(|e| Error::Network(format!("{} ({})", e, self.url)))?;

        let catalog = Catalog::from_json(&self.namespace, &body)?;
        log::info!(
            "Release index lists {} artifacts across {} components",
            catalog.entries().len(),
            catalog.list_components().len()
        );
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::PackageKind;

    const NS: &str = "org.mixedrealitytoolkit";

    fn releases_json() -> &'static str {
        r#"[
            {
                "tag_name": "v1.2.0-pre.1",
                "assets": [
                    {"name": "org.mixedrealitytoolkit.core-1.2.0-pre.1.tgz", "browser_download_url": "https://example.com/core-1.2.0-pre.1.tgz"},
                    {"name": "org.mixedrealitytoolkit.input-1.2.0-pre.1.tgz", "browser_download_url": "https://example.com/input-1.2.0-pre.1.tgz"},
                    {"name": "Source code.zip", "browser_download_url": "https://example.com/src.zip"}
                ]
            },
            {
                "tag_name": "v1.0.0",
                "assets": [
                    {"name": "org.mixedrealitytoolkit.core-1.0.0.tgz", "browser_download_url": "https://example.com/core-1.0.0.tgz"},
                    {"name": "org.mixedrealitytoolkit.core-1.0.0.tgz.sha256", "browser_download_url": "https://example.com/core.sha"}
                ]
            },
            {"tag_name": "empty"}
        ]"#
    }

    #[test]
    fn test_parse_recognises_artifacts_only() {
        let catalog = Catalog::from_json(NS, releases_json().as_bytes()).unwrap();
        assert_eq!(catalog.entries().len(), 3);
        assert_eq!(
            catalog.list_components().into_iter().collect::<Vec<_>>(),
            vec!["core", "input"]
        );
    }

    #[test]
    fn test_versions_newest_first() {
        let catalog = Catalog::from_json(NS, releases_json().as_bytes()).unwrap();
        assert_eq!(catalog.versions("core"), ["1.2.0-pre.1", "1.0.0"]);
        assert_eq!(catalog.latest_version("core").unwrap(), "1.2.0-pre.1");
        assert!(catalog.versions("missing").is_empty());
    }

    #[test]
    fn test_latest_version_not_found() {
        let catalog = Catalog::from_json(NS, releases_json().as_bytes()).unwrap();
        assert!(matches!(
            catalog.latest_version("ghost"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_find_artifact_url() {
        let catalog = Catalog::from_json(NS, releases_json().as_bytes()).unwrap();
        assert_eq!(
            catalog.find_artifact_url("core", "1.0.0").unwrap(),
            "https://example.com/core-1.0.0.tgz"
        );
        assert!(matches!(
            catalog.find_artifact_url("core", "9.9.9"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_body_is_parse_error() {
        assert!(matches!(
            Catalog::from_json(NS, b"{\"message\": \"API rate limit exceeded\"}"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(
            Catalog::from_json(NS, b"not json"),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_pattern_rejects_foreign_namespace() {
        let pattern = artifact_name_pattern(NS);
        assert!(pattern.is_match("org.mixedrealitytoolkit.uxcore-3.0.0.tgz"));
        assert!(pattern.is_match("org.mixedrealitytoolkit.uxcore-3.0.0-pre.12.tgz"));
        assert!(!pattern.is_match("com.microsoft.mrtk.graphicstools.unity-0.5.12.tgz"));
        assert!(!pattern.is_match("orgXmixedrealitytoolkit.core-1.0.0.tgz"));
    }

    #[test]
    fn test_selectable_packages_order() {
        let catalog = Catalog::from_json(NS, releases_json().as_bytes()).unwrap();
        let packages = catalog.selectable_packages();
        let kinds: Vec<_> = packages.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PackageKind::Component,
                PackageKind::Component,
                PackageKind::PlatformRuntime,
                PackageKind::PlatformRuntime
            ]
        );
        assert_eq!(packages[0].identifier, "core");
    }

    #[test]
    fn test_fetch_catalog_from_server() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(releases_json())
            .create();

        let client = ReleaseIndexClient::new(
            &format!("{}/releases", server.url()),
            NS,
            HttpClient::new(&Default::default()).unwrap(),
        );
        let catalog = client.fetch_catalog().unwrap();

        assert_eq!(catalog.latest_version("input").unwrap(), "1.2.0-pre.1");
        mock.assert();
    }

    #[test]
    fn test_fetch_catalog_network_error() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/releases").with_status(403).create();

        let client = ReleaseIndexClient::new(
            &format!("{}/releases", server.url()),
            NS,
            HttpClient::new(&Default::default()).unwrap(),
        );

        assert!(matches!(client.fetch_catalog(), Err(Error::Network(_))));
    }
}
