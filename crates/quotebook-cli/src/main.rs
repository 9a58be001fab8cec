//! Quotebook CLI
//!
//! Command-line interface for Quotebook - categorized quotes with remote sync.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use quotebook_core::{Config, InitSource, QuoteStore};

mod commands;
mod logging;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "quotebook")]
#[command(about = "Quotebook - Categorized quotes with remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new quote
    Add {
        /// Quote text
        text: String,
        /// Category
        #[arg(short, long)]
        category: String,
    },
    /// List quotes
    #[command(alias = "ls")]
    List {
        /// Only this category ("all" for every quote); defaults to the saved selection
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories
    Categories,
    /// Show a random quote
    Random {
        /// Only this category; defaults to the saved selection
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Select a category ("all" to clear) and list its quotes
    Filter {
        /// Category to select; omit to show the current selection
        category: Option<String>,
    },
    /// Export quotes to a JSON file
    Export {
        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import quotes from a JSON file
    Import {
        /// JSON file containing an array of {text, category} objects
        path: PathBuf,
    },
    /// Sync with the remote feed once
    Sync,
    /// Show status
    Status,
    /// Start an interactive shell with background sync (default)
    Shell,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sync_url, sync_enabled, sync_interval_secs,
        /// sync_timeout_secs, merge_policy, server_category, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    if let Err(e) = run(cli, &output).await {
        output::report_failure(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands don't need the store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    logging::init(&config);

    let mut store = QuoteStore::open(&config).context("Failed to open quote store")?;
    if store.init_source() == InitSource::Seeded {
        info!("No saved quotes found, starting from the seed list");
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Add { text, category } => {
            commands::quote::add(&mut store, &text, &category, output)
        }
        Commands::List { category } => commands::quote::list(&store, category, output),
        Commands::Categories => commands::quote::categories(&store, output),
        Commands::Random { category } => {
            let mut rng = StdRng::from_entropy();
            commands::quote::random(&mut store, category, &mut rng, output)
        }
        Commands::Filter { category } => commands::quote::filter(&mut store, category, output),
        Commands::Export { output: path } => commands::transfer::export(&store, path, output),
        Commands::Import { path } => commands::transfer::import(&mut store, &path, output),
        Commands::Sync => commands::sync::sync(&mut store, &config, output).await,
        Commands::Status => commands::status::show(&store, &config, None, output),
        Commands::Shell => commands::shell::run(store, &config, output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}
