use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use gardenbot_backend::{
    config::Config, routes, services::gemini::GeminiClient, state::AppState,
};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gardenbot_backend=info,tower_http=info")),
        )
        .init();

    // Without a key there is nothing useful to serve.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "refusing to start");
            std::process::exit(1);
        }
    };

    let client = GeminiClient::new(&config).context("failed to build gemini client")?;
    let state = Arc::new(AppState::new(Arc::new(client)));

    let app = routes::create_router()
        .with_state(state)
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, model = %config.model, "gardenbot backend listening");
    axum::serve(listener, app).await?;
    Ok(())
}
