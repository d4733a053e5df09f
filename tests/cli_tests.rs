mod test_utils;

use assert_cmd::Command;
use predicates::prelude::*;
use test_utils::{MockComponent, MockReleaseIndex, TestProject, NAMESPACE};

/// Helper to get the binary command
fn mrfeature_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_mrfeature"))
}

/// Point the binary at the test project's config and the mock index
fn with_test_config(cmd: &mut Command, project: &TestProject, index_url: &str) {
    cmd.env("MRFEATURE_CONFIG_DIR", project.config_path())
        .env("MRFEATURE_INDEX_URL", index_url)
        .env_remove("RUST_LOG");
}

fn sample_index() -> MockReleaseIndex {
    MockReleaseIndex::new()
        .publish(
            MockComponent::new("core", "1.2.0-pre.1")
                .with_dependency(&format!("{}.foundation", NAMESPACE), "2.0.0"),
        )
        .publish(MockComponent::new("core", "1.0.0"))
        .publish(MockComponent::new("foundation", "2.0.0"))
        .serve()
}

#[test]
fn test_help() {
    mrfeature_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_invalid_project_exits_with_error() {
    let project = TestProject::new();
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.temp_dir.path().join("not-a-project"))
        .arg("--select")
        .arg("core")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not a valid Unity project"));
}

#[test]
fn test_missing_manifest_exits_with_error() {
    let project = TestProject::new();
    std::fs::remove_file(project.manifest_path()).unwrap();
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .arg("--select")
        .arg("core")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("manifest.json"));
}

#[test]
fn test_index_failure_exits_with_error() {
    let project = TestProject::new();
    let mut server = mockito::Server::new();
    server.mock("GET", "/releases").with_status(500).create();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &format!("{}/releases", server.url()));
    cmd.arg("install")
        .arg(project.path())
        .arg("--select")
        .arg("core")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("release index"));
}

#[test]
fn test_empty_menu_selection_exits_cleanly() {
    let project = TestProject::new();
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("core"))
        .stdout(predicate::str::contains("Nothing selected."));

    assert!(project.installed_artifacts().is_empty());
}

#[test]
fn test_menu_selection_installs() {
    let project = TestProject::with_editor("6000.0.23f1");
    let index = sample_index();

    // Menu order: core, foundation, then the two platform runtimes
    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .write_stdin("1 4\n")
        .assert()
        .success();

    let manifest = project.read_manifest();
    assert_eq!(
        manifest["dependencies"]["org.mixedrealitytoolkit.core"],
        "file:MixedReality/org.mixedrealitytoolkit.core-1.2.0-pre.1.tgz"
    );
    assert_eq!(manifest["dependencies"]["com.unity.xr.meta-openxr"], "2.2.0");
}

#[test]
fn test_install_with_select() {
    let project = TestProject::with_editor("2022.3.5f1");
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .args(["--select", "core", "--select", "com.microsoft.mixedreality.openxr"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foundation @ 2.0.0"))
        .stdout(predicate::str::contains("Installed 2 packages"));

    assert_eq!(
        project.installed_artifacts(),
        vec![
            "org.mixedrealitytoolkit.core-1.2.0-pre.1.tgz",
            "org.mixedrealitytoolkit.foundation-2.0.0.tgz"
        ]
    );
    let manifest = project.read_manifest();
    assert_eq!(
        manifest["dependencies"]["com.microsoft.mixedreality.openxr"],
        "1.11.2"
    );
    assert_eq!(manifest["dependencies"]["com.unity.ugui"], "1.0.0");
}

#[test]
fn test_install_pinned_version() {
    let project = TestProject::new();
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .args(["--pin", "core@1.0.0"])
        .assert()
        .success();

    assert_eq!(
        project.installed_artifacts(),
        vec!["org.mixedrealitytoolkit.core-1.0.0.tgz"]
    );
}

#[test]
fn test_dry_run_changes_nothing() {
    let project = TestProject::new();
    let index = sample_index();
    let before = std::fs::read_to_string(project.manifest_path()).unwrap();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("install")
        .arg(project.path())
        .args(["--select", "core", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("core @ 1.2.0-pre.1"));

    assert!(project.installed_artifacts().is_empty());
    assert_eq!(std::fs::read_to_string(project.manifest_path()).unwrap(), before);
}

#[test]
fn test_list_components() {
    let project = TestProject::new();
    let index = sample_index();

    let mut cmd = mrfeature_cmd();
    with_test_config(&mut cmd, &project, &index.index_url());
    cmd.arg("list")
        .arg("--all")
        .assert()
        .success()
        .stdout(predicate::str::contains("core (1.2.0-pre.1, 1.0.0)"))
        .stdout(predicate::str::contains("com.unity.xr.meta-openxr"));
}

#[test]
fn test_config_path() {
    let project = TestProject::new();

    let mut cmd = mrfeature_cmd();
    cmd.env("MRFEATURE_CONFIG_DIR", project.config_path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show() {
    let project = TestProject::new();

    let mut cmd = mrfeature_cmd();
    cmd.env("MRFEATURE_CONFIG_DIR", project.config_path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[network]"))
        .stdout(predicate::str::contains("retries = 0"));
}

#[test]
fn test_config_set_persists_value() {
    let project = TestProject::new();

    mrfeature_cmd()
        .env("MRFEATURE_CONFIG_DIR", project.config_path())
        .env("MRFEATURE_INDEX_URL", "http://override.invalid/releases")
        .args(["config", "set", "network.retries", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("network.retries"));

    let saved = std::fs::read_to_string(project.config_path().join("config.toml")).unwrap();
    assert!(saved.contains("retries = 4"));
    assert!(!saved.contains("override.invalid"));
}

#[test]
fn test_config_set_unknown_key_fails() {
    let project = TestProject::new();

    mrfeature_cmd()
        .env("MRFEATURE_CONFIG_DIR", project.config_path())
        .args(["config", "set", "auth.token", "secret"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Unknown configuration key"));
}

#[test]
fn test_completions() {
    mrfeature_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mrfeature"));
}
