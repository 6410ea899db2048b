use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::ConvergencePolicy;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub geocoding: GeocodingSettings,
    pub proximity: ProximitySettings,
    pub auth: AuthSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// PostgreSQL URL; the in-memory store is used when absent
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocodingSettings {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub cache_size: u64,
    pub cache_ttl_secs: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://www.mapquestapi.com/geocoding/v1/address".to_string(),
            api_key: String::new(),
            timeout_secs: 10,
            cache_size: 10_000,
            cache_ttl_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProximitySettings {
    pub default_radius_km: f64,
    pub max_radius_km: f64,
    pub convergence_policy: ConvergencePolicy,
    pub parallel_threshold: usize,
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            max_radius_km: 20_100.0,
            convergence_policy: ConvergencePolicy::Fail,
            parallel_threshold: crate::core::proximity::DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

fn default_radius_km() -> f64 { 100.0 }

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub token_secret: String,
    pub token_ttl_secs: u64,
    pub users: Vec<UserSettings>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_ttl_secs: 3600,
            users: Vec::new(),
        }
    }
}

/// Secret used when none is configured; startup warns about it
pub const DEV_TOKEN_SECRET: &str = "address-directory-dev-secret";

#[derive(Debug, Clone, Deserialize)]
pub struct UserSettings {
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    /// Hex BLAKE3 digest of the password
    pub password_hash: String,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

fn environment() -> Environment {
    // e.g., ADDRDIR__SERVER__PORT -> server.port
    Environment::with_prefix("ADDRDIR")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with ADDRDIR__)
    /// 5. DATABASE_URL, MAPQUEST_API_KEY and ADDRDIR_AUTH_SECRET
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?;

        let settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize()
    }
}

/// Apply the conventional unprefixed secrets on top of the loaded sources
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(api_key) = env::var("MAPQUEST_API_KEY") {
        builder = builder.set_override("geocoding.api_key", api_key)?;
    }
    if let Ok(secret) = env::var("ADDRDIR_AUTH_SECRET") {
        builder = builder.set_override("auth.token_secret", secret)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.proximity.default_radius_km, 100.0);
        assert_eq!(settings.proximity.convergence_policy, ConvergencePolicy::Fail);
        assert!(settings.database.url.is_none());
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [proximity]
                convergence_policy = "great_circle"
                max_radius_km = 500.0

                [[auth.users]]
                username = "alice"
                password_hash = "abc"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.proximity.convergence_policy, ConvergencePolicy::GreatCircle);
        assert_eq!(settings.proximity.max_radius_km, 500.0);
        assert_eq!(settings.proximity.default_radius_km, 100.0);
        assert_eq!(settings.auth.users.len(), 1);
        assert!(!settings.auth.users[0].disabled);
        assert_eq!(settings.geocoding.timeout_secs, 10);
    }
}
