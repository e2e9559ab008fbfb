//! Third-party sign-in: the OAuth2 authorization-code flow against the
//! configured identity provider, ending in a signed session token handed to
//! the front end.

mod domain;
mod inbound;
mod usecase;

use std::sync::Arc;

use app_core::jwt::TokenManager;
use app_core::oauth::OAuthProvider;
pub use inbound::router::create_router;
pub use inbound::state::AuthState;

use crate::usecase::authn::AuthnService;

pub struct Dependency {
    pub token: Arc<dyn TokenManager>,
    pub oauth: Arc<dyn OAuthProvider>,
    pub frontend_url: String,
}

pub fn new(dep: Dependency) -> AuthState {
    let authn_svc = Arc::new(AuthnService::new(dep.token, dep.oauth));

    AuthState::new(authn_svc, &dep.frontend_url)
}
