use super::{spinner, spinner_callback};
use anyhow::{bail, Result};
use mrfeature::{
    ArtifactStore, Catalog, Config, Installer, PackageKind, ProjectManifest, ReleaseIndexClient,
    Resolution, Resolver, SelectablePackage, Selection, Stager, UnityProject,
};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

pub fn run(project: PathBuf, select: Vec<String>, pin: Vec<String>, dry_run: bool) -> Result<()> {
    let project = UnityProject::validate(&project)?;
    // Fail before any download if the manifest is missing or unreadable
    ProjectManifest::load(project.root())?;

    let config = Config::load()?;

    let fetch = spinner("Fetching release index...");
    let catalog = ReleaseIndexClient::from_config(&config)?.fetch_catalog();
    fetch.finish_and_clear();
    let catalog = catalog?;

    if catalog.is_empty() {
        println!("The release index lists no installable components.");
    }

    let selections = if select.is_empty() && pin.is_empty() {
        prompt_selections(&catalog)?
    } else {
        selections_from_args(&catalog, &select, &pin)?
    };

    if selections.is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    let store = ArtifactStore::from_config(&config)?;

    let resolving = spinner("Resolving dependencies...");
    let resolution = Resolver::new(&catalog, &store, &config.resolver)
        .with_progress(spinner_callback(&resolving))
        .resolve(&selections);
    resolving.finish_and_clear();
    let resolution = resolution?;

    let installer = Installer::new(project);
    print_plan(&resolution, &installer);

    if dry_run {
        println!();
        println!("[DRY RUN] No files were changed.");
        return Ok(());
    }

    let staging = installer.prepare_staging()?;

    let downloading = spinner("Downloading packages...");
    let report = Stager::new(&catalog, &store, &config.repackage, config.paths.cache_dir()?)
        .with_progress(spinner_callback(&downloading))
        .stage(&resolution, &staging);
    downloading.finish_and_clear();
    let report = report?;

    for skipped in &report.skipped {
        println!(
            "  ⚠ Skipped {} v{}: {}",
            skipped.identifier, skipped.version, skipped.reason
        );
    }

    let installed = installer.install(&staging, &resolution.platform_requests)?;

    println!();
    println!(
        "✓ Installed {} package{} into {}",
        installed.installed.len(),
        if installed.installed.len() == 1 { "" } else { "s" },
        installer.install_dir().display()
    );
    for package in &installed.installed {
        println!("  {} → {}", package.identifier, package.manifest_value);
    }
    for outcome in &installed.platform {
        match outcome.decision.version() {
            Some(version) => println!("  {} → {}", outcome.identifier, version),
            None => println!("  ⚠ {} not added ({:?})", outcome.identifier, outcome.decision),
        }
    }

    Ok(())
}

fn print_plan(resolution: &Resolution, installer: &Installer) {
    println!();
    println!("Selected:");
    for (name, version) in &resolution.user_selections {
        println!("  {} @ {}", name, version);
    }

    let dependencies = resolution.dependencies_only();
    if !dependencies.is_empty() {
        println!();
        println!("Dependencies:");
        for (name, version) in &dependencies {
            println!("  {} @ {}", name, version);
        }
    }

    let upgraded: Vec<_> = resolution
        .user_selections
        .iter()
        .filter(|(name, version)| resolution.resolved.get(*name) != Some(version))
        .collect();
    for (name, version) in upgraded {
        println!(
            "  note: {} raised from {} to {} by another package",
            name,
            version,
            resolution.resolved.get(name).map(String::as_str).unwrap_or("?")
        );
    }

    if !resolution.platform_requests.is_empty() {
        println!();
        match installer.editor_version() {
            Some(editor) => println!("Platform runtimes (editor {}):", editor),
            None => println!("Platform runtimes (editor version unknown):"),
        }
        for identifier in &resolution.platform_requests {
            let decision = mrfeature::selection::find_platform_runtime(identifier)
                .map(|runtime| runtime.rule.decide(installer.editor_version()));
            match decision.as_ref().and_then(|d| d.version()) {
                Some(version) => println!("  {} @ {}", identifier, version),
                None => println!("  {} (skipped)", identifier),
            }
        }
    }
}

fn find_package<'a>(packages: &'a [SelectablePackage], name: &str) -> Option<&'a SelectablePackage> {
    packages
        .iter()
        .find(|p| p.identifier == name || p.display_name.eq_ignore_ascii_case(name))
        .or_else(|| {
            // Accept fully qualified component names as well
            packages
                .iter()
                .filter(|p| p.kind == PackageKind::Component)
                .find(|p| name.strip_suffix(p.identifier.as_str()).is_some_and(|ns| ns.ends_with('.')))
        })
}

fn selections_from_args(catalog: &Catalog, select: &[String], pin: &[String]) -> Result<Vec<Selection>> {
    let packages = catalog.selectable_packages();
    let mut chosen: BTreeMap<String, Selection> = BTreeMap::new();

    for name in select {
        match find_package(&packages, name) {
            Some(package) => {
                chosen
                    .entry(package.identifier.clone())
                    .or_insert_with(|| Selection::latest(package.clone()));
            }
            None => println!("  ⚠ Unknown package '{}', skipping", name),
        }
    }

    for value in pin {
        let Some((name, version)) = value.split_once('@') else {
            bail!("Invalid --pin value '{}': expected NAME@VERSION", value);
        };
        match find_package(&packages, name) {
            Some(package) if package.kind == PackageKind::Component => {
                chosen.insert(
                    package.identifier.clone(),
                    Selection::at_version(package.clone(), version),
                );
            }
            Some(package) => println!(
                "  ⚠ {} is a platform runtime; its version is chosen automatically",
                package.display_name
            ),
            None => println!("  ⚠ Unknown package '{}', skipping", name),
        }
    }

    Ok(chosen.into_values().collect())
}

fn prompt_selections(catalog: &Catalog) -> Result<Vec<Selection>> {
    let packages = catalog.selectable_packages();

    println!("Available packages:");
    for (index, package) in packages.iter().enumerate() {
        match package.kind {
            PackageKind::Component => {
                let latest = catalog.versions(&package.identifier).first().cloned().unwrap_or_default();
                println!("  {:>3}) {} (latest {})", index + 1, package.display_name, latest);
            }
            PackageKind::PlatformRuntime => {
                println!("  {:>3}) {} [platform runtime]", index + 1, package.display_name);
            }
        }
    }
    println!();
    print!("Enter numbers to install, optionally as N@VERSION (empty to cancel): ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(parse_menu_input(&line, &packages))
}

/// Turn menu input like `1, 3@2.0.0 5` into selections
fn parse_menu_input(line: &str, packages: &[SelectablePackage]) -> Vec<Selection> {
    let mut chosen: BTreeMap<String, Selection> = BTreeMap::new();

    for token in line.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let (number, version) = match token.split_once('@') {
            Some((n, v)) => (n, Some(v)),
            None => (token, None),
        };

        let package = number
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| packages.get(i));
        let Some(package) = package else {
            println!("  ⚠ Ignoring invalid choice '{}'", token);
            continue;
        };

        let selection = match version {
            Some(v) if package.kind == PackageKind::Component => {
                Selection::at_version(package.clone(), v)
            }
            _ => Selection::latest(package.clone()),
        };
        chosen.insert(package.identifier.clone(), selection);
    }

    chosen.into_values().collect()
}
