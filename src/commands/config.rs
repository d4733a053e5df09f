use anyhow::Result;
use mrfeature::Config;

pub fn run(action: &crate::ConfigAction) -> Result<()> {
    use crate::ConfigAction;

    match action {
        ConfigAction::Show => show_config(),
        ConfigAction::Path => {
            println!("{}", Config::default_path()?.display());
            Ok(())
        }
        ConfigAction::Set { key, value } => set_config(key, value),
    }
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_file()?;
    config.set(key, value)?;
    config.save()?;

    println!("✓ {} = \"{}\"", key, value);
    println!("Configuration saved to {}", Config::default_path()?.display());

    Ok(())
}

fn show_config() -> Result<()> {
    let config = Config::load()?;
    let config_path = Config::default_path()?;

    println!("# Config file: {}", config_path.display());
    if !config_path.exists() {
        println!("# (not created yet; showing defaults)");
    }
    println!();
    print!("{}", toml::to_string_pretty(&config)?);
    println!();
    println!("# Cache directory resolves to {}", config.paths.cache_dir()?.display());

    Ok(())
}
