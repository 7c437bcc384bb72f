use std::sync::Arc;

use tokio::net::TcpListener;

use tonewiki_backend::Backend;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The wiki web server.
pub struct WikiServer {
    config: ServerConfig,
    state: AppState,
}

impl WikiServer {
    /// Open the configured storage and build a backend over it.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = config.storage.open()?;
        let backend = Backend::new(store, config.wiki.clone())?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Serve an existing backend; `config.storage` and `config.wiki` are ignored.
    pub fn with_backend(config: ServerConfig, backend: Arc<Backend>) -> Self {
        Self {
            config,
            state: AppState::new(backend),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<Backend> {
        &self.state.backend
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("tonewiki listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
