//! HTTP server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use disttag_registry::TagRegistry;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::auth::TokenTable;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::routes::{router, AppState};

/// Handle to a running server.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Returns the address the server is bound to.
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Triggers graceful shutdown and waits for in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server task failed.
    pub async fn shutdown(self) -> Result<(), ServerError> {
        let _ = self.shutdown_tx.send(());
        self.task
            .await
            .map_err(|e| ServerError::Io(std::io::Error::other(e)))??;
        Ok(())
    }
}

/// The disttag HTTP server.
#[derive(Debug)]
pub struct HttpServer {
    config: ServerConfig,
    state: AppState,
}

impl HttpServer {
    /// Builds a server from configuration: opens the store, the audit log
    /// and the token table.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or the audit file cannot be opened.
    pub fn from_config(config: ServerConfig) -> Result<Self, ServerError> {
        let store = config.open_store()?;
        let audit = config.audit.build_logger()?;
        let registry = TagRegistry::builder(store)
            .with_audit(Arc::new(audit))
            .build();
        let tokens: TokenTable = config.tokens.iter().collect();

        if tokens.is_empty() {
            warn!("No tokens configured, every mutation will be refused");
        }

        Ok(Self::new(config, AppState::new(registry, tokens)))
    }

    /// Creates a server around existing handler state.
    #[must_use]
    pub const fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Returns the server configuration.
    #[must_use]
    pub const fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the handler state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Binds the listener and serves in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if the listen address cannot be bound.
    pub async fn run(self) -> Result<ServerHandle, ServerError> {
        let addr = self.config.listen;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener.local_addr()?;

        info!(
            %local_addr,
            storage = ?self.config.storage,
            tokens = self.state.tokens.len(),
            "Starting disttag server"
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(self.state);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                    info!("Shutdown signal received");
                })
                .await
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }

    /// Serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot start or fails while running.
    pub async fn run_until_shutdown(self) -> Result<(), ServerError> {
        let handle = self.run().await?;

        tokio::signal::ctrl_c().await?;

        info!("Shutting down disttag server...");
        handle.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StorageKind, TokenEntry};

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::default()
            .with_listen("127.0.0.1:0".parse().unwrap())
            .with_storage(StorageKind::Memory)
            .with_token(TokenEntry::new("t", "publisher"));

        let server = HttpServer::from_config(config).unwrap();
        assert_eq!(server.state().tokens.len(), 1);

        let handle = server.run().await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_storage_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::default()
            .with_listen("127.0.0.1:0".parse().unwrap())
            .with_data_dir(dir.path());

        HttpServer::from_config(config).unwrap();
        assert!(dir.path().join("packages").is_dir());
    }
}
