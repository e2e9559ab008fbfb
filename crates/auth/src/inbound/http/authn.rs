use app_core::error::AppError;
use app_core::extractors::AppQuery;
use app_core::jwt::SessionClaims;
use axum::Json;
use axum::debug_handler;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use oauth2::url::form_urlencoded;

use crate::domain::inout::prelude::*;
use crate::inbound::model::prelude::*;
use crate::inbound::state::AuthState;

const SUCCESS_PATH: &str = "/oauth-success";

/// A `302 Found` to `location`. axum's `Redirect` only offers 303, 307 and 308.
fn found(location: String) -> Result<Response, AppError> {
    let location = HeaderValue::try_from(location).map_err(|e| {
        tracing::error!("Redirect target is not a valid header value: {:?}", e);
        AppError::Internal
    })?;

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

/// `{frontend_url}/oauth-success?token=..&name=..&email=..&picture=..`, with
/// every value form-urlencoded and absent profile fields sent empty.
pub(crate) fn success_redirect_url(frontend_url: &str, output: &OAuthCallbackOutput) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("token", &output.token)
        .append_pair("name", output.name.as_deref().unwrap_or_default())
        .append_pair("email", &output.email)
        .append_pair("picture", output.picture.as_deref().unwrap_or_default())
        .finish();

    format!("{frontend_url}{SUCCESS_PATH}?{query}")
}

#[debug_handler]
pub async fn oauth_login(State(state): State<AuthState>) -> Result<Response, AppError> {
    let output = state.authn.oauth_login().await?;

    found(output.auth_url)
}

#[debug_handler]
pub async fn oauth_callback(
    State(state): State<AuthState>,
    AppQuery(query): AppQuery<OAuthCallbackRequest>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        return Err(AppError::OAuthDenied(error));
    }

    if query.state.is_none() {
        tracing::debug!("Callback arrived without a state parameter");
    }

    let code = query.code.ok_or_else(|| AppError::RequestFormat("Missing authorization code".to_string()))?;

    let output = state.authn.oauth_callback(OAuthCallbackInput { code }).await?;

    found(success_redirect_url(&state.frontend_url, &output))
}

#[debug_handler]
pub async fn current_session(claims: SessionClaims) -> impl IntoResponse {
    Json(SessionResponse::from(SessionOutput::from(claims)))
}
