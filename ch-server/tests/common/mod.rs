//! Shared test utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use ch_core::config::{AppConfig, DatabaseConfig};
use ch_server::server::ServerContext;
use ch_server::{AppState, ServerAuth};
use ch_store::Database;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;

pub const TOKEN: &str = "integration-token";

/// A running server on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: watch::Sender<bool>,
    pub handle: tokio::task::JoinHandle<ch_core::ChResult<()>>,
    pub db: Database,
    pub _dir: TempDir,
}

/// Start a server backed by a temporary database.
pub async fn start_server() -> TestServer {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::init(&dir.path().join("test.db"), &DatabaseConfig::default())
        .expect("failed to init test database");

    let mut config = AppConfig::default();
    config.course.name = "6.101".into();
    config.course.url_root = "https://example.edu/cs".into();
    config.broadcast.mirror_path = dir.path().join("cs_broadcast.json").display().to_string();

    let state = AppState::new(&config, Arc::new(db.clone())).expect("failed to build state");
    let ctx = Arc::new(ServerContext {
        auth: Arc::new(ServerAuth::with_token(TOKEN.into())),
        state: Arc::new(state),
    });

    let listener = ch_server::bind("127.0.0.1:0".parse().unwrap()).await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let (shutdown, rx) = watch::channel(false);
    let handle = tokio::spawn(ch_server::serve(listener, ctx, rx));

    TestServer {
        addr,
        shutdown,
        handle,
        db,
        _dir: dir,
    }
}

/// Send one HTTP/1.1 request and return (status line, raw response).
pub async fn http(addr: SocketAddr, head: &str, body: &str) -> (String, String) {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let request = format!(
        "{head}\r\nHost: localhost\r\nConnection: close\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.expect("write");
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.expect("read");
    let status = raw.lines().next().unwrap_or_default().to_string();
    (status, raw)
}
