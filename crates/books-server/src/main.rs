//! Entry point for the books-server binary.

use std::sync::Arc;

use books_server::{AppState, ServerConfig, build_app};
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Variables from a .env file fill in whatever the environment leaves unset
    let dotenv = dotenvy::dotenv();

    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable environment file"),
    }

    tracing::info!("Starting books-server");
    tracing::info!(
        "Configuration: port={}, log_level={}",
        config.port,
        config.log_level
    );

    // Open the store without waiting for the database; requests made before
    // it is reachable fail on their own.
    let store = books_store::open(&config.store)?;
    let init_store = Arc::clone(&store);
    tokio::spawn(async move {
        match init_store.initialize().await {
            Ok(()) => tracing::info!("Book store ready"),
            Err(e) => tracing::error!(error = %e, "Book store initialization failed"),
        }
    });

    // Build application
    let state = AppState::new(Arc::clone(&store), config.clone());
    let app = build_app(state);

    // Create listener
    let listener = TcpListener::bind(config.socket_addr()).await?;
    tracing::info!("Server is running on port {}", listener.local_addr()?.port());

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
