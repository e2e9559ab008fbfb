use std::time::Duration;

use app_core::config::ConfigError;
use axum::http::{HeaderValue, StatusCode};
use axum::{Json, Router, routing};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;

const HEALTH_MESSAGE: &str = "AI Wars Hackathon Backend API is running";

pub fn create_router_app(auth_router: Router) -> Router {
    Router::new()
        .nest("/auth", auth_router)
        .route("/", routing::get(|| async { Json(json!({"message": HEALTH_MESSAGE})) }))
        .fallback(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "Endpoint not found"}))) })
        .method_not_allowed_fallback(|| async {
            (StatusCode::METHOD_NOT_ALLOWED, Json(json!({"message": "Method not allowed"})))
        })
}

/// Requests still running after `timeout` are answered with 408.
pub fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// `*` allows any origin without credentials; browsers reject a wildcard
/// origin on credentialed requests. Any other value is taken as the single
/// trusted origin, with credentials allowed.
pub fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, ConfigError> {
    let allowed_origin = allowed_origin.trim();

    if allowed_origin == "*" {
        tracing::warn!("CORS allows any origin; set cors.allowed_origin to restrict it");
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let origin = HeaderValue::from_str(allowed_origin.trim_end_matches('/')).map_err(|e| ConfigError::Invalid {
        key: "cors.allowed_origin".to_string(),
        reason: e.to_string(),
    })?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}
