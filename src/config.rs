use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::sync::SyncConfig;

/// Application configuration, layered from `config.toml` (optional) and
/// `CINEDEX__`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub providers: ProviderAuthConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

const fn default_max_connections() -> u32 {
    5
}

/// Shared secret compared against the `x-api-key` header on job triggers
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub job_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderAuthConfig {
    pub tmdb_bearer_token: String,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("CINEDEX")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }
}
