use crate::api;
use crate::cli::commands::ServeArgs;
use crate::cli::{load_config, Cli};
use crate::errors::AgentrailError;
use tracing::info;

pub async fn handle_serve(cli: &Cli, args: ServeArgs) -> Result<(), AgentrailError> {
    let mut config = load_config(cli).await?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(host = %config.server.host, port = config.server.port, db = %config.database.path, "Starting API server");

    let state = api::create_app_state(&config).await?;
    let shutdown = state.shutdown.clone();
    let app = api::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down; running chains stop before their next step");
            shutdown.cancel();
        })
        .await
        .map_err(|e| AgentrailError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
