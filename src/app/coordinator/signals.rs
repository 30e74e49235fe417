//! Signal handling for graceful shutdown
//!
//! CTRL-C and SIGTERM cancel the shared token, which stops every outstanding
//! retry loop and in-flight request.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn a task that cancels `token` when a termination signal arrives
///
/// The task exits without cancelling once `token` is cancelled by someone else.
pub fn spawn_signal_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("SIGTERM signal received");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = token.cancelled() => return,
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("Cancelling outstanding downloads");
        token.cancel();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    /// The listener stops on its own once the token is cancelled elsewhere
    #[tokio::test]
    async fn test_listener_exits_on_external_cancel() {
        let token = CancellationToken::new();
        let handle = spawn_signal_listener(token.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();

        let result = timeout(Duration::from_millis(200), handle).await;
        assert!(result.is_ok());
    }
}
