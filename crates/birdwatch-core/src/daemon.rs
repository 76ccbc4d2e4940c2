//! Daemon process: startup, shutdown and the serving loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use birdwatch_config::AppConfig;

use crate::api::{self, ApiState};
use crate::client::BirdClient;

/// Shutdown signal sent via broadcast channel.
#[derive(Debug, Clone)]
pub struct ShutdownSignal;

/// The birdwatch daemon: one [`BirdClient`] served over HTTP.
pub struct Daemon {
    config: AppConfig,
    client: Arc<BirdClient>,
    shutdown_tx: broadcast::Sender<ShutdownSignal>,
    _shutdown_rx: broadcast::Receiver<ShutdownSignal>,
}

impl Daemon {
    /// Create a daemon that queries the configured `birdc` binary.
    pub fn new(config: AppConfig) -> Self {
        let client = Arc::new(BirdClient::from_config(&config));
        Self::with_client(config, client)
    }

    /// Create a daemon around an existing client.
    pub fn with_client(config: AppConfig, client: Arc<BirdClient>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            config,
            client,
            shutdown_tx,
            _shutdown_rx,
        }
    }

    /// Bind the configured address and run until shutdown.
    pub async fn run(&self) -> Result<(), DaemonError> {
        let addr: SocketAddr = format!(
            "{}:{}",
            self.config.server.listen_addr, self.config.server.listen_port
        )
        .parse()
        .map_err(|e| DaemonError::Startup(format!("invalid listen address: {e}")))?;

        let listener = TcpListener::bind(addr).await?;
        self.run_on(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal or Ctrl-C.
    pub async fn run_on(&self, listener: TcpListener) -> Result<(), DaemonError> {
        info!(
            addr = %listener.local_addr()?,
            per_peer_tables = self.client.per_peer_tables(),
            rate_limit = self.client.limiter().enabled(),
            "birdwatch daemon starting"
        );

        let reset = self.client.limiter().spawn_reset(self.shutdown_tx.subscribe());
        let state = Arc::new(ApiState::new(Arc::clone(&self.client)));
        let server = api::serve(listener, state, self.shutdown_tx.subscribe());
        tokio::pin!(server);

        tokio::select! {
            res = &mut server => res?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Ctrl-C received, initiating graceful shutdown");
                let _ = self.shutdown_tx.send(ShutdownSignal);
                server.await?;
            }
        }

        if let Err(e) = reset.await {
            warn!(error = %e, "Rate limit reset task ended abnormally");
        }

        info!("Daemon stopped");
        Ok(())
    }

    /// Request a graceful shutdown of the daemon.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(ShutdownSignal);
    }

    pub fn client(&self) -> &Arc<BirdClient> {
        &self.client
    }

    /// Get a reference to the daemon's configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Errors from the daemon runtime.
#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("daemon startup failed: {0}")]
    Startup(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_daemon_creation() {
        let daemon = Daemon::new(AppConfig::default());
        assert_eq!(daemon.config().server.listen_port, 29184);
        assert!(!daemon.client().per_peer_tables());
    }

    #[tokio::test]
    async fn test_daemon_shutdown_without_run() {
        let daemon = Daemon::new(AppConfig::default());
        daemon.shutdown();
    }

    #[tokio::test]
    async fn test_invalid_listen_addr_is_a_startup_error() {
        let mut config = AppConfig::default();
        config.server.listen_addr = "not an address".to_string();
        let daemon = Daemon::new(config);

        let err = daemon.run().await.unwrap_err();
        assert!(matches!(err, DaemonError::Startup(_)));
    }
}
