//! Broadcast commands: post a message, show the current one, list history.

use clap::Subcommand;
use console::style;
use serde_json::json;

use ch_core::config::ConfigHandle;
use ch_core::context::Viewer;
use ch_core::error::ChResult;
use ch_core::role::Role;
use ch_plugins::{BroadcastMirror, BroadcastService};
use ch_store::{Audience, BroadcastRecord};

use super::{init_database, new_table, shared_store, truncate};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum BroadcastAction {
    /// Post a broadcast message.
    Send {
        /// Message text (HTML allowed).
        message: String,
        /// Show to students as well as staff.
        #[arg(long)]
        everyone: bool,
        /// Username recorded as the creator.
        #[arg(long = "as", default_value = "admin")]
        user: String,
        /// Role the message is posted with.
        #[arg(long, default_value = "Admin")]
        role: String,
    },
    /// Show the broadcast a viewer with the given role would see.
    Current {
        #[arg(long, default_value = "TA")]
        role: String,
    },
    /// List every broadcast, newest first.
    History {
        /// Maximum number of messages to show.
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

pub async fn run(config: ConfigHandle, action: BroadcastAction, format: OutputFormat) -> ChResult<()> {
    let db = init_database(&config).await?;
    let cfg = config.read().await;
    let service = BroadcastService::new(
        shared_store(&db),
        cfg.course.name.as_str(),
        BroadcastMirror::from_config(&cfg)?,
    );
    drop(cfg);

    match action {
        BroadcastAction::Send {
            message,
            everyone,
            user,
            role,
        } => {
            let audience = if everyone { Audience::All } else { Audience::Staff };
            let actor = Viewer::new(user, Role::from(role.as_str()));
            let record = service.submit(&message, audience, &actor)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Text => {
                    println!(
                        "  {} broadcast sent to {}",
                        style("OK").green().bold(),
                        record.audience
                    );
                }
            }
        }
        BroadcastAction::Current { role } => {
            let role = Role::from(role.as_str());
            let current = service.get_current(Some(&role))?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&current)?),
                OutputFormat::Text => match current {
                    Some(record) => print_records(std::slice::from_ref(&record)),
                    None => println!("No broadcast visible to {role}."),
                },
            }
        }
        BroadcastAction::History { limit } => {
            let mut records = service.get_all()?;
            let total = records.len();
            records.truncate(limit);
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "total": total,
                            "messages": records,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    if records.is_empty() {
                        println!("No broadcasts yet.");
                    } else {
                        print_records(&records);
                        if total > records.len() {
                            println!("  ... {} older message(s) not shown", total - records.len());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn print_records(records: &[BroadcastRecord]) {
    let mut table = new_table();
    table.set_header(vec!["Time", "Creator", "Audience", "Message"]);
    for record in records {
        table.add_row(vec![
            record.datetime.clone(),
            record.creator.clone(),
            record.audience.to_string(),
            truncate(&record.msg, 60),
        ]);
    }
    println!("{table}");
}

