//! Test utilities and helpers for mrfeature integration tests.
//!
//! This module provides helpers for building throwaway Unity projects,
//! fake component artifacts, and a mock release index served over HTTP.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::path::{Path, PathBuf};
use tar::Builder;
use tempfile::TempDir;

/// Namespace of in-family artifacts
pub const NAMESPACE: &str = "org.mixedrealitytoolkit";

/// An isolated Unity project plus a private config and cache directory
pub struct TestProject {
    pub temp_dir: TempDir,
    pub project_path: PathBuf,
    pub config_dir: PathBuf,
}

impl TestProject {
    /// Create a project with `Assets/`, `Packages/` and a minimal manifest
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_path = temp_dir.path().join("Project");
        let config_dir = temp_dir.path().join(".mrfeature");

        fs::create_dir_all(project_path.join("Assets")).expect("Failed to create Assets");
        fs::create_dir_all(project_path.join("Packages")).expect("Failed to create Packages");
        fs::create_dir_all(&config_dir).expect("Failed to create config directory");

        let project = Self {
            temp_dir,
            project_path,
            config_dir,
        };
        project.write_manifest(
            r#"{
    "dependencies": {
        "com.unity.ugui": "1.0.0"
    },
    "scopedRegistries": []
}"#,
        );
        project.write_config(None);
        project
    }

    /// Create a project recording the given editor version
    pub fn with_editor(editor_version: &str) -> Self {
        let project = Self::new();
        project.set_editor_version(editor_version);
        project
    }

    pub fn set_editor_version(&self, editor_version: &str) {
        let settings = self.project_path.join("ProjectSettings");
        fs::create_dir_all(&settings).expect("Failed to create ProjectSettings");
        fs::write(
            settings.join("ProjectVersion.txt"),
            format!(
                "m_EditorVersion: {}\nm_EditorVersionWithRevision: {} (abcdef)\n",
                editor_version, editor_version
            ),
        )
        .expect("Failed to write ProjectVersion.txt");
    }

    pub fn write_manifest(&self, content: &str) {
        fs::write(self.manifest_path(), content).expect("Failed to write manifest");
    }

    /// Write a config pointing the cache into the temp dir
    pub fn write_config(&self, graphics_tools_url: Option<&str>) {
        let mut config = format!(
            r#"[network]
retries = 0
retry_backoff_ms = 1

[paths]
cache_dir = "{}"
"#,
            self.cache_dir().display().to_string().replace('\\', "/")
        );
        if let Some(url) = graphics_tools_url {
            config.push_str(&format!("\n[repackage]\ngraphics_tools_url = \"{}\"\n", url));
        }
        fs::write(self.config_dir.join("config.toml"), config).expect("Failed to write config");
    }

    pub fn path(&self) -> &Path {
        &self.project_path
    }

    pub fn config_path(&self) -> &Path {
        &self.config_dir
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.temp_dir.path().join("cache")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_path.join("Packages").join("manifest.json")
    }

    pub fn read_manifest(&self) -> serde_json::Value {
        let content = fs::read_to_string(self.manifest_path()).expect("Failed to read manifest");
        serde_json::from_str(&content).expect("Manifest is not valid JSON")
    }

    pub fn install_dir(&self) -> PathBuf {
        self.project_path.join("Packages").join("MixedReality")
    }

    /// Artifact file names in `Packages/MixedReality`, sorted
    pub fn installed_artifacts(&self) -> Vec<String> {
        let dir = self.install_dir();
        if !dir.exists() {
            return vec![];
        }
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("Failed to read install directory")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a gzip tarball in memory from (path, content) entries
pub fn tgz_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .expect("Failed to append tar entry");
    }
    builder
        .into_inner()
        .expect("Failed to finish tar")
        .finish()
        .expect("Failed to finish gzip")
}

/// Test fixture for a published component
pub struct MockComponent {
    pub name: String,
    pub version: String,
    pub dependencies: Vec<(String, String)>,
    /// Listed in the index but the download returns 404
    pub broken: bool,
}

impl MockComponent {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            dependencies: vec![],
            broken: false,
        }
    }

    pub fn with_dependency(mut self, name: &str, version: &str) -> Self {
        self.dependencies.push((name.to_string(), version.to_string()));
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}-{}.tgz", NAMESPACE, self.name, self.version)
    }

    pub fn package_json(&self) -> String {
        let deps: serde_json::Map<String, serde_json::Value> = self
            .dependencies
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::json!({
            "name": format!("{}.{}", NAMESPACE, self.name),
            "version": self.version,
            "dependencies": deps,
        })
        .to_string()
    }

    pub fn artifact_bytes(&self) -> Vec<u8> {
        tgz_bytes(&[
            ("package/package.json", &self.package_json()),
            ("package/README.md", "test component"),
        ])
    }
}

/// A release index and its artifacts served by a local mock server
pub struct MockReleaseIndex {
    pub server: mockito::ServerGuard,
    components: Vec<MockComponent>,
}

impl MockReleaseIndex {
    pub fn new() -> Self {
        Self {
            server: mockito::Server::new(),
            components: vec![],
        }
    }

    pub fn publish(mut self, component: MockComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn index_url(&self) -> String {
        format!("{}/repos/test/releases", self.server.url())
    }

    pub fn artifact_url(&self, file_name: &str) -> String {
        format!("{}/download/{}", self.server.url(), file_name)
    }

    /// Release list JSON, one release per version
    pub fn releases_json(&self) -> String {
        let mut versions: Vec<&str> = self.components.iter().map(|c| c.version.as_str()).collect();
        versions.sort();
        versions.dedup();

        let releases: Vec<serde_json::Value> = versions
            .iter()
            .map(|version| {
                let assets: Vec<serde_json::Value> = self
                    .components
                    .iter()
                    .filter(|c| c.version == *version)
                    .map(|c| {
                        serde_json::json!({
                            "name": c.file_name(),
                            "browser_download_url": self.artifact_url(&c.file_name()),
                        })
                    })
                    .collect();
                serde_json::json!({ "tag_name": format!("v{}", version), "assets": assets })
            })
            .collect();

        serde_json::Value::Array(releases).to_string()
    }

    /// Register the index and every artifact with the mock server
    pub fn serve(mut self) -> Self {
        let body = self.releases_json();
        self.server
            .mock("GET", "/repos/test/releases")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create();

        for component in &self.components {
            let path = format!("/download/{}", component.file_name());
            if component.broken {
                self.server.mock("GET", path.as_str()).with_status(404).create();
            } else {
                self.server
                    .mock("GET", path.as_str())
                    .with_status(200)
                    .with_body(component.artifact_bytes())
                    .create();
            }
        }
        self
    }
}

impl Default for MockReleaseIndex {
    fn default() -> Self {
        Self::new()
    }
}
