use std::sync::Arc;

use anyhow::Context;

use shopledger_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopledger_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let services = shopledger_api::app::services::build_services(&config).await?;
    let app = shopledger_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
