//! HTTP surface
//!
//! Routes:
//! - `GET /` liveness string
//! - `POST /captureTweetEmbeds` platform embeds → images + PDF
//! - `POST /createTweetImages` custom cards → images + PDF
//!
//! Both POST routes sit behind the optional `x-api-key` check. Anything else
//! falls through to the static file directory when one is configured.

mod auth;
mod error;
mod handlers;
pub mod models;

pub use auth::API_KEY_HEADER;
pub use error::ApiError;

use crate::document::DocumentBuilder;
use crate::engine::RenderEngine;
use crate::model::{ContentItem, Document, RenderedImage};
use crate::producer::BatchImageProducer;
use crate::template::LayoutVariant;
use crate::{Error, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared, read-only request context
pub struct AppState<E> {
    producer: BatchImageProducer<E>,
    documents: DocumentBuilder,
    api_key: Option<String>,
}

impl<E: RenderEngine> AppState<E> {
    pub fn new(engine: E, documents: DocumentBuilder) -> Self {
        Self {
            producer: BatchImageProducer::new(engine),
            documents,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    pub fn producer(&self) -> &BatchImageProducer<E> {
        &self.producer
    }

    /// Render the batch, then assemble its PDF off the async runtime.
    pub async fn render_batch(
        &self,
        items: &[ContentItem],
        variant: LayoutVariant,
    ) -> Result<(Vec<RenderedImage>, Document)> {
        let images = self.producer.produce(items, variant).await?;
        let builder = self.documents.clone();
        tokio::task::spawn_blocking(move || -> Result<(Vec<RenderedImage>, Document)> {
            let document = builder.build(&images)?;
            Ok((images, document))
        })
        .await
        .map_err(|e| Error::DocumentBuild(format!("Document task failed: {}", e)))?
    }
}

/// Build the application router.
pub fn router<E>(state: Arc<AppState<E>>, public_dir: Option<PathBuf>) -> Router
where
    E: RenderEngine + 'static,
{
    let api = Router::new()
        .route("/captureTweetEmbeds", post(handlers::capture_tweet_embeds::<E>))
        .route("/createTweetImages", post(handlers::create_tweet_images::<E>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_api_key::<E>,
        ));

    let mut app = Router::new()
        .route("/", get(handlers::index))
        .merge(api)
        .with_state(state);

    if let Some(dir) = public_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
