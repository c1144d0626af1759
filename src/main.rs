use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use clincell::config::{Config, Mode};
use clincell::inquiry::FileStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Failed to start server: {e}");
        return Err(e);
    }
    Ok(())
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mode = config.mode;
    let addr = SocketAddr::new(config.host, config.port);

    match mode {
        Mode::Development => {
            tracing::info!(
                "Starting in DEVELOPMENT mode, proxying to {}",
                config.dev_server_url
            );
        }
        Mode::Production => {
            tracing::info!(
                "Starting in PRODUCTION mode with static files from {}",
                config.static_dir.display()
            );
        }
    }

    let store = Arc::new(FileStore::new(&config.data_dir));
    tracing::info!("Persisting submissions to {}", store.path().display());

    let (app, state) = clincell::build_app(config, store)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = clincell::sessions::spawn_sweeper(state, shutdown_rx);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running on port {} in {} mode", addr.port(), mode.as_str());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = sweeper.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
