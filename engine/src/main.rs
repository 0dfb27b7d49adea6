use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

use lineup_server::config::ServerConfig;
use lineup_server::http;
use lineup_server::queue::QueueManager;
use lineup_server::telemetry::{self, LogFormat};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Create a shutdown signal handler
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "Failed to install Ctrl+C handler, continuing without it");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler, continuing without it");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging first so configuration warnings are visible
    telemetry::init_with(LogFormat::from_env());

    let config = ServerConfig::from_env();

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let shutdown_tx_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        shutdown_signal(shutdown_tx_signal).await;
    });

    let queue_manager = QueueManager::with_defaults(config.queue_defaults.clone());
    info!(
        max_priority = config.queue_defaults.max_priority,
        delay_seconds = config.queue_defaults.delay_seconds,
        max_message_size = config.queue_defaults.max_message_size,
        "Running in-memory mode (no persistence)"
    );

    run_http_server(&config, &queue_manager, &shutdown_tx).await?;

    graceful_shutdown(&queue_manager);
    Ok(())
}

/// Serve the HTTP API until the shutdown signal fires.
async fn run_http_server(
    config: &ServerConfig,
    queue_manager: &Arc<QueueManager>,
    shutdown_tx: &broadcast::Sender<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.http_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.http_port,
        endpoint = %format!("http://{}", addr),
        "LineUp HTTP API ready"
    );

    let router = http::create_router(Arc::clone(queue_manager));
    let qm = Arc::clone(queue_manager);
    let mut shutdown_rx = shutdown_tx.subscribe();

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            // Release long-polling requests so in-flight responses can drain
            qm.shutdown();
        })
        .await?;
    Ok(())
}

/// Everything lives in memory: report what is discarded.
fn graceful_shutdown(queue_manager: &Arc<QueueManager>) {
    if !queue_manager.is_shutdown() {
        queue_manager.shutdown();
    }

    let discarded = queue_manager.total_messages();
    if discarded > 0 {
        warn!(
            queues = queue_manager.queue_count(),
            messages = discarded,
            "Discarding undelivered messages"
        );
    }
    info!("Shutdown complete");
}
