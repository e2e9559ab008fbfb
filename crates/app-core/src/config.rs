//! Layered configuration: a YAML file overridden by prefixed environment
//! variables.
//!
//! The configuration is read once during startup. Callers pull typed values
//! out by dotted key and hand them to the services that need them, so no
//! component reaches back into the configuration at request time.

use std::path::{Path, PathBuf};

use config::{Config as RawConfig, Environment, File};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration")]
    Load(#[from] config::ConfigError),

    #[error("Missing required configuration value: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Debug)]
pub struct Config {
    inner: RawConfig,
}

impl Config {
    pub fn builder<P: AsRef<Path>>(path: P) -> ConfigBuilder {
        ConfigBuilder::new(path.as_ref().to_path_buf())
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn builder_test() -> test_utils::TestConfigBuilder {
        test_utils::TestConfigBuilder::new()
    }

    /// Reads a value, failing when the key is absent or has the wrong type.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.inner.get(key).map_err(|err| match err {
            config::ConfigError::NotFound(_) => ConfigError::Missing(key.to_string()),
            other => ConfigError::Load(other),
        })
    }

    /// Reads an optional value. A present value of the wrong type is still an
    /// error.
    pub fn get_opt<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(ConfigError::Missing(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Reads a string that must be present and non-blank.
    pub fn get_required_string(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.get::<String>(key)?;
        if value.trim().is_empty() {
            return Err(ConfigError::Missing(key.to_string()));
        }
        Ok(value)
    }
}

pub struct ConfigBuilder {
    path: PathBuf,
    env_prefix: Option<String>,
}

impl ConfigBuilder {
    fn new(path: PathBuf) -> Self {
        Self { path, env_prefix: None }
    }

    /// Lets `{PREFIX}__SECTION__KEY` environment variables override
    /// `section.key` from the file.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut builder = RawConfig::builder().add_source(File::from(self.path.as_path()).required(true));

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix).prefix_separator("__").separator("__").try_parsing(true),
            );
        }

        let inner = builder.build()?;
        tracing::info!("Configuration loaded from {}", self.path.to_string_lossy());

        Ok(Config { inner })
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod test_utils {
    use std::collections::HashMap;

    use config::Value;

    use super::*;

    #[derive(Default)]
    pub struct TestConfigBuilder {
        values: HashMap<String, Value>,
    }

    impl TestConfigBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
            self.values.insert(key.to_string(), value.into());
            self
        }

        pub fn build(self) -> Config {
            let mut builder = RawConfig::builder();

            for (key, value) in self.values {
                builder = builder.set_override(key, value).unwrap();
            }

            let inner = builder.build().expect("Failed to create config from test values");

            Config { inner }
        }
    }
}
