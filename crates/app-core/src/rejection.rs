//! A utility module for handling Axum's extractor rejections.

use axum::extract::rejection::QueryRejection;

use super::error::AppError;

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}
