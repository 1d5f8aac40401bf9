use anyhow::{Context, Result};
use medflow::observability::init_tracing;
use medflow_server::{MedflowServer, ServerConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load().context("failed to load configuration")?;
    init_tracing(&config.log_level, config.log_format);

    let server = MedflowServer::new(config).context("failed to build server")?;
    let listener = server
        .bind()
        .await
        .with_context(|| format!("failed to bind {}", server.config().bind_address()))?;

    server
        .serve(listener, shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
