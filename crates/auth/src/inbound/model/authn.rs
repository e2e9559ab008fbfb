use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::inout::prelude::SessionOutput;

// ╔════════════════════════════╗
// ║   Login OAuth Callback     ║
// ╚════════════════════════════╝

/// Query string the provider appends when redirecting back.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ╔════════════════════════════╗
// ║      Current Session       ║
// ╚════════════════════════════╝

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionOutput> for SessionResponse {
    fn from(output: SessionOutput) -> Self {
        Self { email: output.email, name: output.name, picture: output.picture, expires_at: output.expires_at }
    }
}
