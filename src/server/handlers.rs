use super::models::*;
use super::{ApiError, AppState};
use crate::engine::RenderEngine;
use crate::template::LayoutVariant;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use log::info;
use std::sync::Arc;

/// Liveness
pub async fn index() -> &'static str {
    "Tweet to Pics and PDF API running"
}

/// Capture platform embeds for each URL and bundle them into a PDF
pub async fn capture_tweet_embeds<E: RenderEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    payload: Result<Json<CaptureEmbedsRequest>, JsonRejection>,
) -> Result<Json<CaptureEmbedsResponse>, ApiError> {
    let Json(req) = payload.map_err(|_| ApiError::Validation(EMBED_INPUT_ERROR.into()))?;
    let items = req.into_items()?;
    info!("Capturing {} tweet embed(s)", items.len());

    let (images, document) = state
        .render_batch(&items, LayoutVariant::Embed)
        .await
        .map_err(ApiError::Embeds)?;

    Ok(Json(CaptureEmbedsResponse {
        images: images
            .iter()
            .map(|image| EmbedImage {
                base64: BASE64.encode(image.png()),
            })
            .collect(),
        pdf: BASE64.encode(&document.bytes),
    }))
}

/// Render custom cards for the posts of one author and bundle them into a PDF.
/// With `?format=dataUri` only the images come back, as data URIs.
pub async fn create_tweet_images<E: RenderEngine + 'static>(
    State(state): State<Arc<AppState<E>>>,
    query: Result<Query<ImagesQuery>, QueryRejection>,
    payload: Result<Json<CreateImagesRequest>, JsonRejection>,
) -> Result<Json<CreateImagesBody>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::Validation(format!("Invalid input: {}", e.body_text())))?;
    let Json(req) = payload.map_err(|_| ApiError::Validation(IMAGES_INPUT_ERROR.into()))?;
    let (items, variant) = req.into_items(Utc::now())?;
    info!("Creating {} {} tweet image(s)", items.len(), variant.as_str());

    let body = match query.format {
        ResponseFormat::Bundle => {
            let (images, document) = state
                .render_batch(&items, variant)
                .await
                .map_err(ApiError::Images)?;
            CreateImagesBody::Bundle(CreateImagesResponse {
                base64_images: images
                    .into_iter()
                    .map(|image| BASE64.encode(image.into_png()))
                    .collect(),
                base64_pdf: BASE64.encode(&document.bytes),
            })
        }
        ResponseFormat::DataUri => {
            let images = state
                .producer()
                .produce(&items, variant)
                .await
                .map_err(ApiError::Images)?;
            CreateImagesBody::DataUri(DataUriResponse {
                images: images
                    .into_iter()
                    .map(|image| format!("data:image/png;base64,{}", BASE64.encode(image.into_png())))
                    .collect(),
            })
        }
    };
    Ok(Json(body))
}
