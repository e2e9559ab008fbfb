use std::sync::Arc;

use crate::usecase::authn::AuthnUseCase;

#[derive(Clone)]
pub struct AuthState {
    pub authn: Arc<dyn AuthnUseCase>,
    /// Front-end base URL without a trailing slash.
    pub frontend_url: Arc<str>,
}

impl AuthState {
    pub fn new(authn: Arc<dyn AuthnUseCase>, frontend_url: &str) -> Self {
        Self { authn, frontend_url: Arc::from(frontend_url.trim_end_matches('/')) }
    }
}
