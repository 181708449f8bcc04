use care_dashboard::{
    resources::spawn_live_refresh, router, ApiClient, AppState, Config, Resources, TokenStore,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let tokens = Arc::new(TokenStore::open(config.session_path.clone()).await);
    let api = ApiClient::new(config.api_url.clone(), config.request_timeout, tokens)?;
    let resources = Arc::new(Resources::new(api));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresher = spawn_live_refresh(resources.clone(), shutdown_rx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        api_url = %config.api_url,
        environment = %config.environment,
        "starting care dashboard"
    );
    let app = router(AppState::new(config, resources));

    info!("listening on http://{addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    refresher.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
