//! `coursehelp serve`: run the HTTP adapter until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use console::style;
use tokio::sync::watch;
use tracing::{info, warn};

use ch_core::config::ConfigHandle;
use ch_core::error::{ChError, ChResult};
use ch_server::server::ServerContext;
use ch_server::{AppState, ServerAuth};

use super::{init_database, shared_store};

pub async fn run(config: ConfigHandle, bind: Option<String>, port: Option<u16>) -> ChResult<()> {
    let cfg = config.snapshot().await;

    let db = init_database(&config).await?;
    let state = AppState::new(&cfg, shared_store(&db))?;

    let auth = ServerAuth::from_config_token(&cfg.server.auth_token);
    if cfg.server.auth_token.trim().is_empty() {
        let token = auth.current_token().await;
        warn!("no auth token configured, generated one for this run");
        eprintln!("{} bearer token for this run: {}", style("NOTE").yellow().bold(), token);
    }

    let host = bind.unwrap_or_else(|| cfg.server.bind_address.clone());
    let port = port.unwrap_or(cfg.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ChError::Config(format!("invalid bind address {host}:{port}: {e}")))?;

    let listener = ch_server::bind(addr).await?;
    let ctx = Arc::new(ServerContext {
        auth: Arc::new(auth),
        state: Arc::new(state),
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl-C");
            let _ = shutdown_tx.send(true);
        }
    });

    info!("serving course {} on {addr}", cfg.course.name);
    ch_server::serve(listener, ctx, shutdown_rx).await
}
