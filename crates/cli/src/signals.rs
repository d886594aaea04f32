use tokio_util::sync::CancellationToken;
use tracing::info;

/// Returns a token cancelled by the first SIGINT or SIGTERM. The
/// orchestrator polls it between source runs, so an in-flight source
/// finishes its phases before the process winds down.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received; no further sources will start");
        trigger.cancel();
    });

    token
}

async fn sigint() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No SIGINT listener could be installed; never resolves.
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = sigint() => info!("Received SIGINT"),
                _ = term.recv() => info!("Received SIGTERM"),
            }
        }
        Err(_) => sigint().await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    sigint().await;
}
