//! Session token signing and verification.
//!
//! A session token is an HS256 JWT carrying the signed-in user's email as
//! `sub`, plus display name and picture. The backend keeps no session state;
//! any consumer holding the same key can verify it.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seven days.
pub const DEFAULT_SESSION_EXP_SECS: i64 = 7 * 24 * 60 * 60;

/// Placeholder secret shipped by earlier deployments; signing with it is
/// equivalent to signing with a public key.
const PLACEHOLDER_SECRET: &str = "CHANGE_THIS_SECRET";

#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format or signature")]
    InvalidToken,

    #[error("Failed to create token")]
    TokenCreation,

    #[error("Signing secret is empty or a known placeholder")]
    WeakSecret,
}

/// The identity a session token is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSubject {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait TokenManager: Send + Sync {
    fn create_session_token(&self, subject: &SessionSubject) -> Result<String, JwtError>;
    fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError>;
}

pub struct JwtConfig {
    pub secret: String,
    pub session_exp_secs: i64,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_exp_secs: i64,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        let secret = config.secret.trim();
        if secret.is_empty() || secret == PLACEHOLDER_SECRET {
            return Err(JwtError::WeakSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            session_exp_secs: config.session_exp_secs,
        })
    }

    /// Signs `subject` as if issued at `now`. Identical inputs produce
    /// identical tokens.
    pub fn sign_at(&self, subject: &SessionSubject, now: DateTime<Utc>) -> Result<String, JwtError> {
        let exp = Duration::try_seconds(self.session_exp_secs)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                tracing::error!("Session lifetime of {}s is out of range", self.session_exp_secs);
                JwtError::TokenCreation
            })?;

        let claims = SessionClaims {
            sub: subject.email.clone(),
            name: subject.name.clone(),
            picture: subject.picture.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|err| {
            tracing::error!("Failed to encode session token: {:?}", err);
            JwtError::TokenCreation
        })
    }
}

impl TokenManager for JwtService {
    fn create_session_token(&self, subject: &SessionSubject) -> Result<String, JwtError> {
        self.sign_at(subject, Utc::now())
    }

    fn validate_session_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding_key, &validation).map(|data| data.claims).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                _ => JwtError::InvalidToken,
            }
        })
    }
}
