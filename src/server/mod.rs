//! HTTP server
//!
//! Thin REST layer over the service facade: `/train`, `/status`,
//! `/predict`, all guarded by an `Auth-Token` header.

mod api;
mod error;

pub use api::{create_router, AppState};
pub use error::ServerError;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::job::FsStatusStore;
use crate::service::RepresentativenessService;
use crate::store::FsEnsembleStore;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub auth_token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".to_string())
                .into(),
            auth_token: std::env::var("API_AUTH_TOKEN").unwrap_or_default(),
        }
    }
}

/// Start the server with the given configuration
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.data_dir)?;
    info!(data_dir = %config.data_dir.display(), "Initializing stores");

    let status_store = Arc::new(FsStatusStore::new(config.data_dir.join("status.json")));
    let ensemble_store = Arc::new(FsEnsembleStore::new(config.data_dir.join("models"))?);
    let service = Arc::new(RepresentativenessService::new(status_store, ensemble_store)?);

    let state = Arc::new(AppState {
        service,
        auth_token: config.auth_token.clone(),
    });
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Representativeness model service listening");

    let shutdown_signal = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
        info!("Shutdown signal received, stopping server gracefully");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down cleanly");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
    }
}
