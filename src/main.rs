use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tweetpress::browser::ChromeEngine;
use tweetpress::config::ServiceConfig;
use tweetpress::document::DocumentBuilder;
use tweetpress::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tweetpress=info,tower_http=debug".into()),
        )
        .init();

    let config = ServiceConfig::parse();

    let documents = DocumentBuilder::new(config.page_size).spool_to(config.work_dir());
    info!("PDF page size: {:?}", documents.sizing());
    let state = AppState::new(ChromeEngine::new(config.engine()), documents)
        .with_api_key(config.api_key().map(str::to_string));
    if config.api_key().is_some() {
        info!("API key check enabled ({} header)", server::API_KEY_HEADER);
    }

    let public_dir = config.public_dir.is_dir().then(|| config.public_dir.clone());
    let app = server::router(Arc::new(state), public_dir);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
