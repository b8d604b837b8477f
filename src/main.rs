use tokio::net::TcpListener;
use tracing::info;
use tumorsense::{
    config::{AppConfig, CONFIG_PATH},
    model, observability, server,
    server::types::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load Config (optional file, defaults otherwise)
    let (config, from_file) = AppConfig::load(CONFIG_PATH)?;
    observability::init_tracing(&config.log_level.0);
    if from_file {
        info!("loaded configuration from {}", CONFIG_PATH);
    } else {
        info!("{} not found, using built-in defaults", CONFIG_PATH);
    }
    let metrics_handle = observability::install_metrics()?;

    // 2. Load labels and model before anything can be served
    model::loader::init_ort()?;
    let state = AppState::from_config(&config)?;

    // 3. Create Router
    let app = server::routes::create_router(state, metrics_handle);

    // 4. Bind & Serve
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Server listening on http://{}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}
