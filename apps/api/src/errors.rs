use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::layout::LayoutError;
use crate::render::RenderError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Multipart(e) => (e.status(), "MALFORMED_UPLOAD", e.body_text()),
            AppError::Layout(e) => {
                tracing::error!("Layout configuration error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LAYOUT_CONFIGURATION_ERROR",
                    "The server's page layout is misconfigured".to_string(),
                )
            }
            AppError::Render(e) => match e {
                RenderError::NoInput => (StatusCode::BAD_REQUEST, "NO_INPUT", e.to_string()),
                RenderError::InvalidPdf { .. } | RenderError::InvalidImage { .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "UNSUPPORTED_DOCUMENT",
                    e.to_string(),
                ),
                RenderError::Image(_) | RenderError::Serialize(_) => {
                    tracing::error!("Render error: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "RENDER_ERROR",
                        "The PDF could not be produced".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
