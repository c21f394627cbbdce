use std::time::Duration;

use anyhow::Context;
use deployment::{Deployment, DeploymentError};
use server::{DeploymentImpl, routes};
use services::services::config::AppConfig;
use tracing::{info, warn};
use utils::logging::init_tracing;

const MIRROR_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    let deployment = DeploymentImpl::new(config).await?;
    deployment.validate_database().await?;

    match deployment.ensure_bootstrap_admin().await {
        Ok(Some(admin)) => info!(username = %admin.username, "Created initial SuperAdmin"),
        Ok(None) => {}
        Err(DeploymentError::User(e)) => warn!(error = %e, "Skipping bootstrap admin"),
        Err(e) => return Err(e.into()),
    }

    let sweeper = deployment.spawn_session_sweeper().await;

    let app_router = routes::router(deployment.clone());
    let bind_addr = deployment.config().bind_addr;
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app_router)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    info!("Shutting down");
    sweeper.abort();
    deployment.shutdown(MIRROR_DRAIN_TIMEOUT).await;
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
