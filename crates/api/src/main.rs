use anyhow::Context;

use juris_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    juris_observability::init();

    let config = AppConfig::from_env()?;
    tracing::info!(environment = ?config.environment, "starting juris-api");

    let state = juris_api::app::services::build_state(&config).await?;
    let app = juris_api::app::build_app(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
