use std::sync::Arc;

use anyhow::Context;
use jobgate_api::app::{build_app, services::AppServices};
use jobgate_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jobgate_observability::init();

    let config = AppConfig::from_env().context("failed to load configuration")?;
    let services = AppServices::from_config(&config)
        .await
        .context("failed to initialize storage")?;

    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        environment = ?config.environment,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
