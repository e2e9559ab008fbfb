//! Typed startup settings resolved from the layered configuration.

use std::time::Duration;

use app_core::config::{Config, ConfigError};
use app_core::database::DatabaseSettings;
use app_core::jwt::{DEFAULT_SESSION_EXP_SECS, JwtConfig};
use app_core::oauth::{
    GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL, OAuthCredentials, ProviderEndpoints,
};

const DEFAULT_ALLOWED_ORIGIN: &str = "*";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
const CALLBACK_PATH: &str = "/auth/callback";
/// Ten years.
const MAX_SESSION_EXP_SECS: i64 = 10 * 365 * 24 * 60 * 60;

pub struct ServerSettings {
    pub address: String,
    pub timeout: Duration,
}

pub struct OAuthSettings {
    pub credentials: OAuthCredentials,
    pub endpoints: ProviderEndpoints,
    pub request_timeout: Duration,
}

pub struct Settings {
    pub server: ServerSettings,
    pub frontend_url: String,
    pub allowed_origin: String,
    pub database: DatabaseSettings,
    pub create_schema: bool,
    pub jwt: JwtConfig,
    pub oauth: OAuthSettings,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerSettings {
                address: config.get_required_string("server.address")?,
                timeout: Duration::from_secs(positive(config.get("server.timeout_secs")?, "server.timeout_secs")?),
            },
            frontend_url: config.get_required_string("app.frontend_url")?,
            allowed_origin: optional_string(config, "cors.allowed_origin")?
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            database: DatabaseSettings {
                url: config.get_required_string("database.url")?,
                max_connections: config.get_opt("database.max_connections")?.unwrap_or(DEFAULT_MAX_CONNECTIONS),
                min_connections: config.get_opt("database.min_connections")?.unwrap_or(DEFAULT_MIN_CONNECTIONS),
                sqlx_logging: config.get_opt("database.sqlx_logging")?.unwrap_or(false),
            },
            create_schema: config.get_opt("database.create_schema")?.unwrap_or(false),
            jwt: JwtConfig {
                secret: config.get_required_string("jwt.secret")?,
                session_exp_secs: session_lifetime(config)?,
            },
            oauth: oauth_settings(config)?,
        })
    }
}

fn positive(value: u64, key: &str) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Invalid { key: key.to_string(), reason: "must be greater than zero".to_string() });
    }
    Ok(value)
}

fn session_lifetime(config: &Config) -> Result<i64, ConfigError> {
    let secs: i64 = config.get_opt("jwt.expiration_secs")?.unwrap_or(DEFAULT_SESSION_EXP_SECS);
    if !(1..=MAX_SESSION_EXP_SECS).contains(&secs) {
        return Err(ConfigError::Invalid {
            key: "jwt.expiration_secs".to_string(),
            reason: format!("must be between 1 and {MAX_SESSION_EXP_SECS}"),
        });
    }
    Ok(secs)
}

/// A string value where blank counts as unset.
fn optional_string(config: &Config, key: &str) -> Result<Option<String>, ConfigError> {
    Ok(config.get_opt::<String>(key)?.filter(|value| !value.trim().is_empty()))
}

fn oauth_settings(config: &Config) -> Result<OAuthSettings, ConfigError> {
    let redirect_uri = match optional_string(config, "oauth.google.redirect_uri")? {
        Some(uri) => uri,
        None => match optional_string(config, "app.backend_url")? {
            Some(backend) => format!("{}{CALLBACK_PATH}", backend.trim_end_matches('/')),
            None => return Err(ConfigError::Missing("oauth.google.redirect_uri".to_string())),
        },
    };

    let timeout_secs = positive(
        config.get_opt("oauth.google.request_timeout_secs")?.unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECS),
        "oauth.google.request_timeout_secs",
    )?;

    Ok(OAuthSettings {
        credentials: OAuthCredentials {
            client_id: config.get_required_string("oauth.google.client_id")?,
            client_secret: config.get_required_string("oauth.google.client_secret")?,
            redirect_uri,
        },
        endpoints: ProviderEndpoints {
            auth_url: optional_string(config, "oauth.google.auth_url")?.unwrap_or_else(|| GOOGLE_AUTH_URL.to_string()),
            token_url: optional_string(config, "oauth.google.token_url")?
                .unwrap_or_else(|| GOOGLE_TOKEN_URL.to_string()),
            userinfo_url: optional_string(config, "oauth.google.userinfo_url")?
                .unwrap_or_else(|| GOOGLE_USERINFO_URL.to_string()),
        },
        request_timeout: Duration::from_secs(timeout_secs),
    })
}
