//! A centralized and idiomatic error handling module for the Axum web
//! application.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use super::config::ConfigError;
use super::oauth::OAuthError;

const INTERNAL_ERROR_MSG: &str = "An internal server error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("OAuth callback failed: {0}")]
    OAuth(#[from] OAuthError),

    #[error("Template rendering failed")]
    Render(#[from] askama::Error),

    #[error("Config operation failed")]
    Config(#[from] ConfigError),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg),

            // Every failure on the callback path surfaces as a 400 with the
            // underlying cause in the message, except transport errors raised
            // before the provider answered at all.
            AppError::OAuth(err) => {
                let status = match err {
                    OAuthError::HttpClient(_) => StatusCode::BAD_GATEWAY,
                    _ => StatusCode::BAD_REQUEST,
                };
                tracing::warn!("OAuth callback error: {:?}", err);
                (status, format!("Callback error: {err}"))
            },

            AppError::Render(err) => {
                tracing::error!("Template rendering error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string())
            },

            AppError::Config(err) => {
                tracing::error!("Config getter error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string())
            },

            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string()),
        };

        (status, Json(ErrorResponse { message })).into_response()
    }
}
