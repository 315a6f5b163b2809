use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Portal error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Portal unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to decode portal response: {0}")]
    Decode(String),

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A rotation stopped half way. `stranded` lists CVs left without a
    /// current station.
    #[error("Rotation incomplete: {message}")]
    RotationIncomplete { message: String, stranded: Vec<String> },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl AppError {
    /// Message shown to the operator in the dismissible banner.
    pub fn banner_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Api { message, .. } => message.clone(),
            AppError::RotationIncomplete { message, stranded } => {
                if stranded.is_empty() {
                    message.clone()
                } else {
                    format!(
                        "{} ({} CV(s) left without a current station: {})",
                        message,
                        stranded.len(),
                        stranded.join(", ")
                    )
                }
            }
            AppError::NotFound => "Not Found".to_string(),
            AppError::Cancelled => "Request cancelled".to_string(),
            AppError::Transport(_) | AppError::Decode(_) | AppError::Config(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Api { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Transport(e) => {
                error!("portal transport error: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::Decode(e) => {
                error!("portal decode error: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::RotationIncomplete { .. } => StatusCode::BAD_GATEWAY,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(e) => {
                error!("configuration error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: self.banner_message(),
        });

        (status, body).into_response()
    }
}
