//! Configuration file commands.

use std::path::Path;

use clap::Subcommand;
use console::style;
use serde_json::json;

use ch_core::config::{AppConfig, ConfigHandle};
use ch_core::error::{ChError, ChResult};

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a configuration file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(
    config: ConfigHandle,
    config_path: &Path,
    action: ConfigAction,
    format: OutputFormat,
) -> ChResult<()> {
    match action {
        ConfigAction::Show => {
            let cfg = config.snapshot().await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&cfg)?),
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&cfg)
                        .map_err(|e| ChError::Config(format!("failed to serialize config: {e}")))?;
                    println!("{text}");
                }
            }
        }
        ConfigAction::Path => match format {
            OutputFormat::Json => println!(
                "{}",
                json!({ "path": config_path.display().to_string(), "exists": config_path.exists() })
            ),
            OutputFormat::Text => println!("{}", config_path.display()),
        },
        ConfigAction::Init { force } => {
            if config_path.exists() && !force {
                println!(
                    "  {} {} already exists; use --force to overwrite",
                    style("WARN").yellow().bold(),
                    config_path.display()
                );
                return Ok(());
            }
            AppConfig::default().save_to_file(config_path)?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "written": config_path.display().to_string() })),
                OutputFormat::Text => {
                    println!("  {} wrote {}", style("OK").green().bold(), config_path.display())
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let handle = ConfigHandle::new(AppConfig::default());

        run(handle, &path, ConfigAction::Init { force: false }, OutputFormat::Json)
            .await
            .unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.server.port, AppConfig::default().server.port);
    }

    #[tokio::test]
    async fn test_init_keeps_existing_file_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[course]\nname = \"6.101\"\n").unwrap();
        let handle = ConfigHandle::new(AppConfig::default());

        run(handle, &path, ConfigAction::Init { force: false }, OutputFormat::Text)
            .await
            .unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.course.name, "6.101");
    }
}
