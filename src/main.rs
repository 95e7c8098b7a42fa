use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frame_captioner::storage::ensure_dir;
use frame_captioner::{create_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()?;

    for dir in [&config.captions_dir, &config.images_dir] {
        ensure_dir(dir).with_context(|| format!("Error creating directory {}", dir.display()))?;
    }

    let listen_addr = config.listen_addr;
    let state = Arc::new(AppState::new(config).context("Failed to build HTTP client")?);
    info!(
        "Forwarding frames to {} (model {})",
        state.config.ollama_api_url, state.config.model
    );

    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!("🚀 Server running on http://{listen_addr}");
    info!("📸 Open in your browser and start the webcam to caption frames");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frame_captioner=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
