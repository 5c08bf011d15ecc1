//! Penssum Admin CLI
//!
//! Command-line moderation console for Penssum product listings.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use penssum_core::Config;

mod commands;
mod output;

use commands::App;
use output::{Output, OutputFormat};

/// Log filter level variable
const LOG_ENV: &str = "PENSSUM_LOG";

#[derive(Parser)]
#[command(name = "penssum-admin")]
#[command(about = "Penssum Admin - review pending product listings")]
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
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List products awaiting review
    #[command(alias = "ls")]
    Pending,
    /// Approve a product
    Approve {
        /// Product ID
        id: String,
    },
    /// Reject a product (archives its files and notifies the owner)
    Reject {
        /// Product ID
        id: String,
    },
    /// Show one pending product in full
    Show {
        /// Product ID
        id: String,
    },
    /// Open a product's page in the browser
    Open {
        /// Product ID
        id: String,
        /// Print the link without launching a browser
        #[arg(long)]
        print: bool,
    },
    /// Register this device for push notifications
    Register,
    /// Keep the queue in sync and moderate interactively (default)
    Watch,
    /// Show connectivity and registration status
    Status,
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
        /// Configuration key (api_url, web_url, poll_interval_ms, push.token, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work on the file itself
    if let Some(Commands::Config { command }) = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config = Arc::new(
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?,
    );
    init_logging(&config);

    if let Some(Commands::Open { id, print }) = &cli.command {
        return commands::open::open(&config, id.clone(), *print, &output);
    }

    let app = App::new(config)?;

    match cli.command.unwrap_or(Commands::Watch) {
        Commands::Pending => commands::pending::list(&app, &output).await,
        Commands::Approve { id } => commands::moderate::approve(&app, id, &output).await,
        Commands::Reject { id } => commands::moderate::reject(&app, id, &output).await,
        Commands::Show { id } => commands::show::show(&app, id, &output).await,
        Commands::Register => commands::register::register(&app, &output).await,
        Commands::Watch => commands::watch::run(&app, &output).await,
        Commands::Status => commands::status::show(&app, &output).await,
        Commands::Open { .. } | Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging
///
/// Level comes from PENSSUM_LOG (default `warn`). Logs go to stderr, or
/// to `log_file` when one is configured.
fn init_logging(config: &Config) {
    let log_level = std::env::var(LOG_ENV).unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "penssum_core={},penssum_admin={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    match &config.log_file {
        Some(path) => {
            let log_file = match File::create(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
