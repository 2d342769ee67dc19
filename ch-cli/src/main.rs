//! coursehelp CLI - run the HTTP adapter and manage course plugin data.
//!
//! Besides `serve`, every plugin operation is reachable from the terminal so
//! staff can post a broadcast or check a remote-queue link without a browser.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};

use ch_core::config::{AppConfig, ConfigHandle};
use ch_core::error::ChResult;
use ch_core::logging;

/// coursehelp - broadcast, remote-queue and help-queue plugins for course sites.
#[derive(Parser)]
#[command(
    name = "coursehelp",
    version,
    about = "Course site helper plugins",
    long_about = "Serve and manage the broadcast, remote-queue and help-queue plugins\n\
                  of a course site from the command line."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP adapter.
    Serve {
        /// Bind address (overrides config).
        #[arg(short, long)]
        bind: Option<String>,
        /// Port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Post and inspect broadcast messages.
    Broadcast {
        #[command(subcommand)]
        action: commands::broadcast::BroadcastAction,
    },
    /// Publish and inspect remote-queue links.
    Remote {
        #[command(subcommand)]
        action: commands::remote::RemoteAction,
    },
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
    /// Show or create the configuration file.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate a bearer token for the HTTP adapter.
    Token {
        /// Store the token in the configuration file.
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> ChResult<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => AppConfig::default_config_path()?,
    };
    let config = if config_path.exists() {
        AppConfig::load_from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    // Long-running serve logs to file; one-shot commands log to stderr.
    let _guard = match cli.command {
        Commands::Serve { .. } => {
            let log_dir = config.effective_log_dir()?;
            Some(logging::init_from_config(&config.logging, &log_dir, cli.verbose)?)
        }
        _ => {
            logging::init_console_logging(if cli.verbose { "debug" } else { "warn" });
            None
        }
    };

    info!("coursehelp v{}", ch_core::constants::APP_VERSION);
    debug!("config file: {}", config_path.display());

    let config_handle = ConfigHandle::new(config);

    match cli.command {
        Commands::Serve { bind, port } => commands::serve::run(config_handle, bind, port).await,
        Commands::Broadcast { action } => commands::broadcast::run(config_handle, action, cli.format).await,
        Commands::Remote { action } => commands::remote::run(config_handle, action, cli.format).await,
        Commands::Db { action } => commands::db::run(config_handle, action, cli.format).await,
        Commands::Config { action } => {
            commands::config::run(config_handle, &config_path, action, cli.format).await
        }
        Commands::Token { save } => commands::token::run(config_handle, &config_path, save, cli.format).await,
    }
}
