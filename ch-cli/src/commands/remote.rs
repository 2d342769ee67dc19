//! Remote-queue commands.

use clap::Subcommand;
use console::style;
use serde_json::json;

use ch_core::config::ConfigHandle;
use ch_core::context::Viewer;
use ch_core::error::ChResult;
use ch_core::role::Role;
use ch_plugins::RemoteQueueService;

use super::{init_database, new_table, shared_store};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum RemoteAction {
    /// Publish a meeting URL for a staff member.
    Set {
        /// Staff username.
        user: String,
        /// Meeting URL.
        url: String,
        /// Mark the link inactive (stored but not served).
        #[arg(long)]
        inactive: bool,
        /// Role of the staff member.
        #[arg(long, default_value = "TA")]
        role: String,
    },
    /// Show the stored settings for a staff member.
    Show { user: String },
    /// Render the HTML a student would get for a staff member.
    Link {
        user: String,
        /// Render the redirect page instead of the link.
        #[arg(long)]
        redirect: bool,
    },
}

pub async fn run(config: ConfigHandle, action: RemoteAction, format: OutputFormat) -> ChResult<()> {
    let db = init_database(&config).await?;
    let course = config.read().await.course.name.clone();
    let service = RemoteQueueService::new(shared_store(&db), course);

    match action {
        RemoteAction::Set {
            user,
            url,
            inactive,
            role,
        } => {
            let actor = Viewer::new(user.as_str(), Role::from(role.as_str()));
            let record = service.save(&actor, &url, !inactive)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "user": user, "settings": record }))?);
                }
                OutputFormat::Text => {
                    let state = if record.active { "active" } else { "inactive" };
                    println!("  {} {user}: {} ({state})", style("OK").green().bold(), record.url);
                }
            }
        }
        RemoteAction::Show { user } => {
            let record = service.get(&user)?;
            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "user": user, "settings": record }))?);
                }
                OutputFormat::Text => match record {
                    Some(record) => {
                        let mut table = new_table();
                        table.set_header(vec!["User", "URL", "Active"]);
                        table.add_row(vec![user, record.url.clone(), record.active.to_string()]);
                        println!("{table}");
                    }
                    None => println!("No remote-queue settings for {user}."),
                },
            }
        }
        RemoteAction::Link { user, redirect } => {
            let html = if redirect {
                service.render_redirect(&user)?
            } else {
                service.render_link(&user)?
            };
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "html": html }))?),
                OutputFormat::Text if html.is_empty() => {
                    println!("{} {user} has no active link", style("WARN").yellow().bold());
                }
                OutputFormat::Text => println!("{html}"),
            }
        }
    }

    Ok(())
}
