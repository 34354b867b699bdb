//! Web server implementation

use crate::error::ApiError;
use axum::{response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stepwright_common::{ActionCatalog, Database, Result, StepSequencer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Server configuration, normally read from the environment by `main`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path of the SQLite store.
    pub db_path: PathBuf,
    /// How long a request may wait on the store lock before giving up.
    pub lock_timeout: Duration,
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub catalog: Arc<ActionCatalog>,
    pub sequencer: StepSequencer,
}

/// HTTP API server over the step store.
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Open (or create) the store at the configured path and prepare the
    /// server around it.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        if let Some(parent) = cfg.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::open(&cfg.db_path)?;
        Self::with_database(db, cfg.lock_timeout)
    }

    /// Build a server over an already-open store. Integration tests use
    /// this with an in-memory database.
    pub fn with_database(db: Database, lock_timeout: Duration) -> Result<Self> {
        let catalog = ActionCatalog::builtin();
        db.seed_action_types(&catalog)?;
        let sequencer = StepSequencer::with_lock_timeout(db.clone(), lock_timeout);
        Ok(Self {
            state: AppState {
                db,
                catalog: Arc::new(catalog),
                sequencer,
            },
        })
    }

    /// Create router with all routes
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .merge(crate::pages::pages_routes())
            .merge(crate::actions::actions_routes())
            .merge(crate::suites::suites_routes())
            .merge(crate::steps::steps_routes())
            .merge(crate::generate::generate_routes())
            .fallback(not_found_handler)
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        info!("Stepwright API listening on http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}

/// Convenience entry point used by `main`.
pub async fn serve(addr: SocketAddr, cfg: ServerConfig) -> anyhow::Result<()> {
    let server = ApiServer::new(cfg)?;
    server.serve(addr).await
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "stepwright-web",
        "version": stepwright_common::VERSION,
    }))
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_database_seeds_the_catalog() {
        let db = Database::open_memory().unwrap();
        let server = ApiServer::with_database(db.clone(), Duration::from_millis(100)).unwrap();
        let kinds = db.list_action_types().unwrap();
        assert!(!kinds.is_empty());
        assert!(kinds.iter().any(|a| a.name == "navigate"));
        // Router construction must not panic on route conflicts.
        let _ = server.router();
    }
}
