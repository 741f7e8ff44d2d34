use std::env;

use chrono::Duration;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::auth::models::AuthSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub reset: ResetConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    /// Seconds between revocation sweeps; 0 disables the sweep
    #[serde(default = "default_sweep_secs")]
    pub revocation_sweep_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            revocation_sweep_secs: default_sweep_secs(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResetConfig {
    #[serde(default = "default_reset_ttl_minutes")]
    pub ttl_minutes: i64,
    #[serde(default = "default_link_base_url")]
    pub link_base_url: String,
    #[serde(default)]
    pub expose_token: bool,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_reset_ttl_minutes(),
            link_base_url: default_link_base_url(),
            expose_token: false,
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_backend() -> StorageBackend {
    StorageBackend::Postgres
}

fn default_sweep_secs() -> u64 {
    300
}

fn default_access_ttl_minutes() -> i64 {
    120
}

fn default_refresh_ttl_days() -> i64 {
    7
}

fn default_reset_ttl_minutes() -> i64 {
    15
}

fn default_link_base_url() -> String {
    "http://localhost:8080/reset-password".to_string()
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (JWT__SECRET, DATABASE__URL, SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    ///
    /// # Errors
    /// * Missing or blank `jwt.secret`
    /// * Missing `database.url` with the postgres backend
    /// * Non-positive token lifetimes
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 8080)?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Check the invariants deserialization cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be set (e.g. JWT__SECRET)".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.database.url.trim().is_empty()
        {
            return Err(ConfigError::Message(
                "database.url must be set when storage.backend = \"postgres\"".to_string(),
            ));
        }

        if self.jwt.access_ttl_minutes <= 0
            || self.jwt.refresh_ttl_days <= 0
            || self.reset.ttl_minutes <= 0
        {
            return Err(ConfigError::Message(
                "token lifetimes must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            access_ttl: Duration::minutes(self.jwt.access_ttl_minutes),
            refresh_ttl: Duration::days(self.jwt.refresh_ttl_days),
            reset_ttl: Duration::minutes(self.reset.ttl_minutes),
        }
    }
}
