use std::sync::Arc;

use anyhow::Context;

use clinic_api::app::{build_app, AppServices};
use clinic_api::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;
    clinic_observability::init_with(&config.log);

    let services = AppServices::in_memory(&config).context("failed to build services")?;
    let app = build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        seeded = config.seed_sample_data,
        "listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
