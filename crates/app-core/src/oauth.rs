//! Google sign-in via the OAuth 2.0 authorization code flow.
//!
//! The provider builds the authorization URL the browser is sent to, then
//! drives the two back-channel calls of the callback: code for access token,
//! access token for profile. Provider error bodies are kept verbatim so the
//! caller can surface them.

use std::time::Duration;

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use reqwest::{Client, ClientBuilder, redirect};
use serde_json::Value;
use thiserror::Error;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

const SCOPES: [&str; 3] = ["openid", "email", "profile"];

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(#[from] oauth2::url::ParseError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("OAuth token exchange failed: {0}")]
    TokenExchange(Value),

    #[error("OAuth profile response has no email: {0}")]
    ProfileFetch(Value),
}

#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

#[derive(Debug, Clone)]
pub struct ProviderEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl ProviderEndpoints {
    pub fn google() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// Where to send the browser, plus the single-use values embedded in it.
#[derive(Debug)]
pub struct AuthorizationDetails {
    pub url: String,
    pub state: CsrfToken,
    pub nonce: CsrfToken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthUserProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait::async_trait]
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait OAuthProvider: Send + Sync {
    /// Builds the authorization URL with fresh `state` and `nonce` values.
    fn get_authorization_details(&self) -> AuthorizationDetails;

    /// Exchanges an authorization code for an access token.
    async fn exchange_code(&self, code: String) -> Result<String, OAuthError>;

    /// Fetches the user's profile using an access token.
    async fn get_user_profile(&self, access_token: &str) -> Result<OAuthUserProfile, OAuthError>;
}

#[derive(Debug)]
pub struct GoogleOAuthProvider {
    client_id: ClientId,
    client_secret: String,
    auth_url: AuthUrl,
    redirect_url: RedirectUrl,
    token_url: String,
    userinfo_url: String,
    http: Client,
}

impl GoogleOAuthProvider {
    pub fn new(
        credentials: OAuthCredentials,
        endpoints: ProviderEndpoints,
        timeout: Option<Duration>,
    ) -> Result<Self, OAuthError> {
        let mut builder = ClientBuilder::new().redirect(redirect::Policy::none());
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| {
            tracing::error!("Failed to build HTTP client: {:?}", e);
            OAuthError::HttpClient(e)
        })?;

        // Validate the back-channel URLs up front so a typo fails at startup.
        oauth2::url::Url::parse(&endpoints.token_url)?;
        oauth2::url::Url::parse(&endpoints.userinfo_url)?;

        Ok(Self {
            client_id: ClientId::new(credentials.client_id),
            client_secret: credentials.client_secret,
            auth_url: AuthUrl::new(endpoints.auth_url)?,
            redirect_url: RedirectUrl::new(credentials.redirect_uri)?,
            token_url: endpoints.token_url,
            userinfo_url: endpoints.userinfo_url,
            http,
        })
    }
}

/// Reads a JSON body whatever the status code; the OAuth error object lives
/// in the body of non-2xx responses.
async fn read_json(response: reqwest::Response) -> Result<Value, OAuthError> {
    let status = response.status();
    response.json::<Value>().await.map_err(|e| {
        tracing::error!(status = %status, "Provider returned a non-JSON body: {:?}", e);
        OAuthError::HttpClient(e)
    })
}

fn non_empty_str(body: &Value, field: &str) -> Option<String> {
    body.get(field).and_then(Value::as_str).filter(|value| !value.is_empty()).map(str::to_string)
}

#[async_trait::async_trait]
impl OAuthProvider for GoogleOAuthProvider {
    fn get_authorization_details(&self) -> AuthorizationDetails {
        let nonce = CsrfToken::new_random();

        let client = BasicClient::new(self.client_id.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_redirect_uri(self.redirect_url.clone());

        let mut request = client.authorize_url(CsrfToken::new_random);
        for scope in SCOPES {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, state) = request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .add_extra_param("include_granted_scopes", "true")
            .add_extra_param("nonce", nonce.secret().clone())
            .url();

        tracing::debug!("Generated authorization URL for {}", self.auth_url.as_str());

        AuthorizationDetails { url: auth_url.to_string(), state, nonce }
    }

    async fn exchange_code(&self, code: String) -> Result<String, OAuthError> {
        let params = [
            ("code", code.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await.map_err(|e| {
            tracing::error!("Token request failed: {:?}", e);
            OAuthError::HttpClient(e)
        })?;
        let body = read_json(response).await?;

        match non_empty_str(&body, "access_token") {
            Some(access_token) => Ok(access_token),
            None => {
                tracing::warn!("Token endpoint response has no access_token");
                Err(OAuthError::TokenExchange(body))
            },
        }
    }

    async fn get_user_profile(&self, access_token: &str) -> Result<OAuthUserProfile, OAuthError> {
        let response = self.http.get(&self.userinfo_url).bearer_auth(access_token).send().await.map_err(|e| {
            tracing::error!("Userinfo request failed: {:?}", e);
            OAuthError::HttpClient(e)
        })?;
        let body = read_json(response).await?;

        let Some(email) = non_empty_str(&body, "email") else {
            tracing::warn!("Userinfo response has no email");
            return Err(OAuthError::ProfileFetch(body));
        };

        Ok(OAuthUserProfile { email, name: non_empty_str(&body, "name"), picture: non_empty_str(&body, "picture") })
    }
}
