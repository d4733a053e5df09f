use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

mod commands;

/// mrfeature - Install Mixed Reality Toolkit components into Unity projects
#[derive(Parser)]
#[command(name = "mrfeature")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Show progress details from the resolver and installer
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and install components into a Unity project
    Install {
        /// Unity project root (must contain Assets/ and Packages/)
        project: PathBuf,

        /// Package to install; repeatable. Prompts with a menu when omitted
        #[arg(short, long = "select", value_name = "NAME")]
        select: Vec<String>,

        /// Install a component at a specific version; repeatable
        #[arg(short, long = "pin", value_name = "NAME@VERSION")]
        pin: Vec<String>,

        /// Show what would be installed without changing the project
        #[arg(long)]
        dry_run: bool,
    },

    /// List components available in the release index
    List {
        /// Show every published version instead of only the latest
        #[arg(short, long)]
        all: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file location
    Path,

    /// Set a configuration value (e.g. `network.retries 5`)
    Set {
        /// Dotted key such as `index.url`
        key: String,
        /// New value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Install {
            project,
            select,
            pin,
            dry_run,
        } => commands::install::run(project, select, pin, dry_run),
        Commands::List { all } => commands::list::run(all),
        Commands::Config { action } => commands::config::run(&action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "mrfeature", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
