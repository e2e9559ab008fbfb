use std::sync::Arc;

use app_core::error::AppError;
use app_core::jwt::{SessionSubject, TokenManager};
use app_core::oauth::OAuthProvider;
use async_trait::async_trait;
use validator::Validate;

use crate::domain::inout::prelude::*;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait AuthnUseCase: Send + Sync {
    async fn oauth_login(&self) -> Result<OAuthLoginOutput, AppError>;
    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<OAuthCallbackOutput, AppError>;
}

#[derive(Clone)]
pub struct AuthnService {
    token: Arc<dyn TokenManager>,
    oauth: Arc<dyn OAuthProvider>,
}

impl AuthnService {
    pub fn new(token: Arc<dyn TokenManager>, oauth: Arc<dyn OAuthProvider>) -> Self {
        Self { token, oauth }
    }
}

#[async_trait]
impl AuthnUseCase for AuthnService {
    async fn oauth_login(&self) -> Result<OAuthLoginOutput, AppError> {
        let auth_detail = self.oauth.get_authorization_details();

        Ok(OAuthLoginOutput { auth_url: auth_detail.url, state: auth_detail.state, nonce: auth_detail.nonce })
    }

    /// Exchange, fetch, then sign. Each step runs only when the previous one
    /// succeeded; nothing is retried.
    async fn oauth_callback(&self, input: OAuthCallbackInput) -> Result<OAuthCallbackOutput, AppError> {
        input.validate()?;

        let provider_access_token = self.oauth.exchange_code(input.code).await?;

        let profile = self.oauth.get_user_profile(&provider_access_token).await?;

        let token = self.token.create_session_token(&SessionSubject {
            email: profile.email.clone(),
            name: profile.name.clone(),
            picture: profile.picture.clone(),
        })?;

        tracing::info!("Session token issued after provider sign-in");

        Ok(OAuthCallbackOutput { token, name: profile.name, email: profile.email, picture: profile.picture })
    }
}
