use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::error;
use serde_json::json;
use thiserror::Error;

const PROCESSING_FAILED: &str = "Failed to process tweets";

/// Request-level failures and the JSON body each one renders as
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// Failure on the embed route; body carries `details`
    #[error("Embed capture failed: {0}")]
    Embeds(#[source] crate::Error),

    /// Failure on the card route; body carries an empty `images` list
    #[error("Card rendering failed: {0}")]
    Images(#[source] crate::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            ApiError::Embeds(e) => {
                error!("Error processing tweet embeds: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": PROCESSING_FAILED, "details": e.to_string() }),
                )
            }
            ApiError::Images(e) => {
                error!("Error creating tweet images: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": PROCESSING_FAILED, "details": e.to_string(), "images": [] }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Validation("bad".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.into_response().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::Embeds(crate::Error::RenderTimeout(10)).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Images(crate::Error::EngineUnavailable("no chrome".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
