//! Signal handling for graceful shutdown

use tracing::{debug, warn};

/// Handles shutdown signals (SIGTERM, SIGINT; Ctrl-C elsewhere)
pub struct ShutdownSignal;

impl ShutdownSignal {
    /// Create a new shutdown signal handler
    pub fn new() -> Self {
        Self
    }

    /// Wait for a shutdown signal
    #[cfg(unix)]
    pub async fn wait(&self) {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        debug!("received SIGTERM");
                    }
                    _ = sigint.recv() => {
                        debug!("received SIGINT");
                    }
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(?e, "failed to register signal handlers, falling back to Ctrl-C");
                Self::wait_ctrl_c().await;
            }
        }
    }

    /// Wait for a shutdown signal
    #[cfg(not(unix))]
    pub async fn wait(&self) {
        Self::wait_ctrl_c().await;
    }

    async fn wait_ctrl_c() {
        match tokio::signal::ctrl_c().await {
            Ok(()) => debug!("received Ctrl-C"),
            Err(e) => {
                warn!(?e, "failed to listen for Ctrl-C; stop the process externally");
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
