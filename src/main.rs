mod config;
mod error;
mod rate_limiter;
mod routes;
mod state;
mod translate;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("deeplx_proxy=info,tower_http=info")),
        )
        .init();

    let config = load_config()?;

    let shutdown = CancellationToken::new();
    let app_state = AppState::new(&config, shutdown.clone())?;
    let app = routes::build_app(app_state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DeepL X has been successfully launched! Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// First existing file among `CONFIG_PATH`, `conf.yaml`, `conf.json`; defaults otherwise
fn load_config() -> Result<Config> {
    let config_paths: Vec<String> = vec![
        std::env::var("CONFIG_PATH").ok(),
        Some("conf.yaml".to_string()),
        Some("conf.json".to_string()),
    ]
    .into_iter()
    .flatten()
    .collect();

    for path in &config_paths {
        if !std::path::Path::new(path).exists() {
            debug!("No config file at {}", path);
            continue;
        }
        let config = Config::load(path)?;
        info!("Loaded configuration from: {}", path);
        return Ok(config);
    }

    info!("No config file found, using defaults. Tried: {:?}", config_paths);
    Ok(Config::default())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received, cancelling pending upstream calls");
    shutdown.cancel();
}
