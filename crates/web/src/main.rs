use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use stepwright_web::server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let addr: SocketAddr = std::env::var("STEPWRIGHT_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let db_path = std::env::var("STEPWRIGHT_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| stepwright_common::default_db_path());

    // How long a request may wait on the store lock before 503ing.
    let lock_timeout_ms: u64 = std::env::var("STEPWRIGHT_LOCK_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5000);

    let cfg = ServerConfig {
        db_path,
        lock_timeout: Duration::from_millis(lock_timeout_ms),
    };

    info!(
        "Starting Stepwright API on http://{} (store: {})",
        addr,
        cfg.db_path.display()
    );

    stepwright_web::server::serve(addr, cfg).await
}
