use super::spinner;
use anyhow::Result;
use mrfeature::selection::{platform_runtimes, PlatformRule};
use mrfeature::{Config, ReleaseIndexClient};

pub fn run(all_versions: bool) -> Result<()> {
    let config = Config::load()?;

    let fetch = spinner("Fetching release index...");
    let catalog = ReleaseIndexClient::from_config(&config)?.fetch_catalog();
    fetch.finish_and_clear();
    let catalog = catalog?;

    let components = catalog.list_components();
    if components.is_empty() {
        println!("No components found in {}", config.index.url);
    } else {
        println!("Components:");
        for component in &components {
            let versions = catalog.versions(component);
            if all_versions {
                println!("  {} ({})", component, versions.join(", "));
            } else {
                let latest = versions.first().map(String::as_str).unwrap_or("?");
                println!("  {} @ {}", component, latest);
            }
        }
    }

    println!();
    println!("Platform runtimes:");
    for runtime in platform_runtimes() {
        match runtime.rule {
            PlatformRule::Pinned(version) => {
                println!("  {} ({}) @ {}", runtime.display_name, runtime.identifier, version)
            }
            PlatformRule::Tiered { newest, minimum } => println!(
                "  {} ({}) @ {} from editor {}, {} above editor {}",
                runtime.display_name,
                runtime.identifier,
                newest.version,
                newest.since,
                minimum.version,
                minimum.since
            ),
        }
    }

    println!();
    println!(
        "Total: {} component{}",
        components.len(),
        if components.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
