use app_core::jwt::SessionClaims;
use chrono::{DateTime, Utc};
use oauth2::CsrfToken;
use validator::Validate;

// ╔════════════════════════════╗
// ║        Login OAuth         ║
// ╚════════════════════════════╝

#[derive(Debug)]
pub struct OAuthLoginOutput {
    pub auth_url: String,
    pub state: CsrfToken,
    pub nonce: CsrfToken,
}

// ╔════════════════════════════╗
// ║   Login OAuth Callback     ║
// ╚════════════════════════════╝

#[derive(Debug, Validate)]
pub struct OAuthCallbackInput {
    #[validate(length(min = 1, message = "authorization code cannot be empty"))]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallbackOutput {
    pub token: String,
    pub name: Option<String>,
    pub email: String,
    pub picture: Option<String>,
}

// ╔════════════════════════════╗
// ║      Current Session       ║
// ╚════════════════════════════╝

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutput {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionClaims> for SessionOutput {
    fn from(claims: SessionClaims) -> Self {
        Self {
            email: claims.sub,
            name: claims.name,
            picture: claims.picture,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_default(),
        }
    }
}
