use actix_web::dev::ServerHandle;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::db::JobStore;

/// Handles graceful shutdown of the application
///
/// 1. Listens for shutdown signals (SIGTERM, SIGINT/CTRL+C)
/// 2. Stops the HTTP server, letting in-flight requests finish
/// 3. Waits for the server task
/// 4. Closes the job store
pub struct ShutdownCoordinator {
    server_handle: ServerHandle,
    server_task: JoinHandle<Result<(), std::io::Error>>,
    store: Arc<dyn JobStore>,
}

impl ShutdownCoordinator {
    pub fn new(
        server_handle: ServerHandle,
        server_task: JoinHandle<Result<(), std::io::Error>>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        Self {
            server_handle,
            server_task,
            store,
        }
    }

    /// Wait for CTRL+C or SIGTERM (Unix only), then shut down.
    pub async fn wait_for_shutdown(self) -> Result<(), std::io::Error> {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        #[cfg(unix)]
        let terminate = terminate.recv();

        #[cfg(not(unix))]
        let terminate = std::future::pending::<Option<()>>();

        tokio::select! {
            result = ctrl_c => {
                result?;
                info!("Received CTRL+C signal, initiating graceful shutdown...");
            }
            _ = terminate => {
                info!("Received SIGTERM signal, initiating graceful shutdown...");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(self) -> Result<(), std::io::Error> {
        info!("Stopping HTTP server (no longer accepting new requests)...");
        self.server_handle.stop(true).await;

        info!("Waiting for HTTP server to fully shut down...");
        match self.server_task.await {
            Ok(Ok(_)) => info!("HTTP server shut down successfully"),
            Ok(Err(e)) => error!("HTTP server encountered error during shutdown: {:?}", e),
            Err(e) => error!("HTTP server task panicked: {:?}", e),
        }

        info!("Closing job store...");
        self.store.close().await;

        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
