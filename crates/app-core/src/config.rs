//! Environment-backed configuration for the login server.
//!
//! The process environment is read once at startup; every other part of the
//! application receives values through [`Config::get`]. `PORT` maps to the
//! key `port`, `GOOGLE_CLIENT_ID` to `google_client_id`, and so on.

use config::{Config as RawConfig, Environment};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load or parse configuration from the environment")]
    Load(#[from] config::ConfigError),
}

const DEFAULT_PORT: i64 = 8080;
const DEFAULT_GOOGLE_REDIRECT_URL: &str = "http://localhost:8080/callback";
const DEFAULT_GITHUB_REDIRECT_URL: &str = "http://localhost:8080/github.callback";

#[derive(Debug, Clone)]
pub struct Config {
    inner: RawConfig,
}

impl Config {
    /// Reads the process environment. Missing credentials resolve to empty
    /// strings so the server can still boot and render the login page.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    fn from_source(env: Environment) -> Result<Self, ConfigError> {
        let inner = RawConfig::builder()
            .set_default("port", DEFAULT_PORT)?
            .set_default("google_client_id", "")?
            .set_default("google_client_secret", "")?
            .set_default("google_redirect_url", DEFAULT_GOOGLE_REDIRECT_URL)?
            .set_default("github_client_id", "")?
            .set_default("github_client_secret", "")?
            .set_default("github_redirect_url", DEFAULT_GITHUB_REDIRECT_URL)?
            .add_source(env)
            .build()?;

        Ok(Self { inner })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        self.inner.get(key).map_err(ConfigError::from)
    }
}
