//! `coursehelp token`: generate the shared bearer token.

use std::path::Path;

use console::style;
use serde_json::json;
use tracing::info;

use ch_core::config::ConfigHandle;
use ch_core::error::ChResult;
use ch_server::auth::generate_token;

use crate::OutputFormat;

pub async fn run(config: ConfigHandle, config_path: &Path, save: bool, format: OutputFormat) -> ChResult<()> {
    let token = generate_token();

    if save {
        let snapshot = {
            let mut cfg = config.write().await;
            cfg.server.auth_token = token.clone();
            cfg.clone()
        };
        snapshot.save_to_file(config_path)?;
        info!("saved new auth token to {}", config_path.display());
    }

    match format {
        OutputFormat::Json => println!("{}", json!({ "token": token, "saved": save })),
        OutputFormat::Text => {
            println!("{token}");
            if save {
                eprintln!("  {} saved to {}", style("OK").green().bold(), config_path.display());
            }
        }
    }

    Ok(())
}
