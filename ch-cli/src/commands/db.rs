//! Database management commands.

use clap::Subcommand;
use console::style;
use serde_json::json;

use ch_core::config::ConfigHandle;
use ch_core::error::ChResult;

use super::{format_bytes, init_database, new_table};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show record counts per log.
    Stats,
    /// Run integrity check.
    Check,
    /// Delete every record (requires --yes).
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Show database file path.
    Path,
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> ChResult<()> {
    match action {
        DbAction::Stats => {
            let db = init_database(&config).await?;
            let stats = db.stats()?;
            let db_path = config.read().await.effective_db_path()?;
            let size = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "path": db_path.display().to_string(),
                            "size_bytes": size,
                            "stats": stats,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("Database: {} ({})", db_path.display(), format_bytes(size));
                    let mut table = new_table();
                    table.set_header(vec!["Scope", "Log", "Records", "Keys", "Last append"]);
                    for log in &stats.logs {
                        table.add_row(vec![
                            log.scope.clone(),
                            log.log_path.clone(),
                            log.records.to_string(),
                            log.keys.to_string(),
                            log.last_append.clone().unwrap_or_else(|| "-".into()),
                        ]);
                    }
                    println!("{table}");
                    println!("Total records: {}", stats.total_records);
                }
            }
        }
        DbAction::Check => {
            let db = init_database(&config).await?;
            match db.run_integrity_check() {
                Ok(()) => match format {
                    OutputFormat::Json => println!("{}", json!({ "integrity": "ok" })),
                    OutputFormat::Text => println!("  {} integrity check passed", style("OK").green().bold()),
                },
                Err(e) => {
                    match format {
                        OutputFormat::Json => println!("{}", json!({ "integrity": "failed", "error": e.to_string() })),
                        OutputFormat::Text => println!("  {} {e}", style("FAIL").red().bold()),
                    }
                    return Err(e);
                }
            }
        }
        DbAction::Reset { yes } => {
            if !yes {
                println!(
                    "  {} this deletes every broadcast and remote-queue record; rerun with --yes",
                    style("WARN").yellow().bold()
                );
                return Ok(());
            }
            let db = init_database(&config).await?;
            db.reset()?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "reset": true })),
                OutputFormat::Text => println!("  {} database reset", style("OK").green().bold()),
            }
        }
        DbAction::Path => {
            let db_path = config.read().await.effective_db_path()?;
            match format {
                OutputFormat::Json => println!("{}", json!({ "path": db_path.display().to_string() })),
                OutputFormat::Text => println!("{}", db_path.display()),
            }
        }
    }

    Ok(())
}
