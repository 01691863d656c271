use anyhow::Context;

use labtrack_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    labtrack_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr;

    let app = labtrack_api::app::build_app(config).await?;

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
