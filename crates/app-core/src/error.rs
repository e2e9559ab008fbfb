//! Application error taxonomy and its mapping onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use super::jwt::JwtError;
use super::oauth::OAuthError;

const INTERNAL_ERROR_MSG: &str = "An internal server error occurred";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid request format: {0}")]
    RequestFormat(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The provider redirected back with an `error` parameter instead of a code.
    #[error("OAuth authorization denied: {0}")]
    OAuthDenied(String),

    // Internal Libraries
    #[error("JWT operation failed")]
    Jwt(#[from] JwtError),

    #[error("OAuth operation failed")]
    OAuth(#[from] OAuthError),

    #[error("An internal server error occurred")]
    Internal,
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

fn internal() -> (StatusCode, String, Option<serde_json::Value>) {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG.to_string(), None)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Validation(err) => {
                let details = json!(err.field_errors());
                (StatusCode::UNPROCESSABLE_ENTITY, "Validation failed".to_string(), Some(details))
            },
            AppError::RequestFormat(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, None),
            AppError::OAuthDenied(reason) => {
                tracing::warn!("Provider denied authorization: {}", reason);
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response();
            },

            // Internal Libraries
            AppError::Jwt(err) => {
                tracing::error!("JWT error: {:?}", err);
                match err {
                    JwtError::TokenExpired | JwtError::InvalidToken => {
                        (StatusCode::UNAUTHORIZED, err.to_string(), None)
                    },
                    JwtError::TokenCreation | JwtError::WeakSecret => internal(),
                }
            },
            AppError::OAuth(err) => match err {
                // The provider's own error object is passed through unchanged.
                OAuthError::TokenExchange(body) | OAuthError::ProfileFetch(body) => {
                    return (StatusCode::BAD_REQUEST, Json(body)).into_response();
                },
                OAuthError::HttpClient(err) => {
                    tracing::error!("OAuth provider request failed: {:?}", err);
                    (StatusCode::BAD_GATEWAY, "OAuth provider unavailable".to_string(), None)
                },
                OAuthError::InvalidUrl(err) => {
                    tracing::error!("OAuth provider misconfigured: {:?}", err);
                    internal()
                },
            },
            AppError::Internal => internal(),
        };

        (status, Json(ErrorResponse { message, details })).into_response()
    }
}
