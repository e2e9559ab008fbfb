//! Maps Axum's extractor rejections onto [`AppError`].

use axum::extract::rejection::QueryRejection;

use super::error::AppError;

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::RequestFormat(rejection.to_string())
    }
}
