use forecast_charts::{AppState, Config, load_catalog, load_manifest, router};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let manifest = load_manifest(&config.manifest_path).await?;
    let catalog = load_catalog(&config.charts_path).await?;
    for id in catalog.charts.keys() {
        if manifest.get(id).is_none() {
            tracing::warn!("chart '{id}' has no manifest entry and no page");
        }
    }

    let state = AppState::new(config.static_dir.clone(), manifest, catalog);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("running at http://localhost:{}", config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
