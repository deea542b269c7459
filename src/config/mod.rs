use config::{Config, ConfigError};
use serde::Deserialize;
use std::env;
use validator::Validate;

const DEFAULT_MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;
const DEFAULT_DELTA_SECS: u64 = 864_000;
const DEFAULT_P_INC_SECS: u64 = 86_400;
const DEFAULT_MAX_CONTACTS: u32 = 20_000;

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

fn default_max_request_size() -> usize {
    DEFAULT_MAX_REQUEST_SIZE
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct LogConfig {
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// The directory's own tuning parameters — Δ, `P_inc`, and C from
/// `spec.md` §6.3. `P_full` is not separately configurable: it is defined
/// to equal Δ, so `Directory::new` takes only `delta_secs` for both.
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct DirectoryConfig {
    #[serde(default = "default_delta_secs")]
    #[validate(range(min = 1))]
    pub delta_secs: u64,
    #[serde(default = "default_p_inc_secs")]
    #[validate(range(min = 1))]
    pub p_inc_secs: u64,
    #[serde(default = "default_max_contacts")]
    #[validate(range(min = 1))]
    pub max_contacts: u32,
}

fn default_delta_secs() -> u64 {
    DEFAULT_DELTA_SECS
}

fn default_p_inc_secs() -> u64 {
    DEFAULT_P_INC_SECS
}

fn default_max_contacts() -> u32 {
    DEFAULT_MAX_CONTACTS
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub log: LogConfig,
    #[validate(nested)]
    pub directory: DirectoryConfig,
}

fn parse_port(value: &str) -> Result<u16, ConfigError> {
    let port_i64 = value.parse::<i64>().map_err(|e| {
        ConfigError::Message(format!(
            "Invalid port value '{value}': {e}. Port must be a number between 1 and 65535."
        ))
    })?;

    if !(1..=65535).contains(&port_i64) {
        return Err(ConfigError::Message(format!(
            "Port value '{port_i64}' is out of range. Port must be between 1 and 65535."
        )));
    }

    u16::try_from(port_i64).map_err(|_| {
        ConfigError::Message("Port value out of u16 range (this should not happen)".into())
    })
}

fn load_env_file() {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("Failed to load .env file (this is optional): {}", e);
    }
}

fn build_config_from_sources() -> Result<AppConfig, ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 4000)?
        .set_default(
            "server.max_request_size",
            i64::try_from(DEFAULT_MAX_REQUEST_SIZE).unwrap_or(i64::MAX),
        )?
        .set_default("log.level", "info")?
        .set_default("log.format", "pretty")?
        .set_default(
            "directory.delta_secs",
            i64::try_from(DEFAULT_DELTA_SECS).unwrap_or(i64::MAX),
        )?
        .set_default(
            "directory.p_inc_secs",
            i64::try_from(DEFAULT_P_INC_SECS).unwrap_or(i64::MAX),
        )?
        .set_default("directory.max_contacts", DEFAULT_MAX_CONTACTS)?
        .add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("server.host", env::var("APP_SERVER__HOST").ok())?
        .set_override_option(
            "server.port",
            env::var("APP_SERVER__PORT")
                .ok()
                .map(|v| parse_port(&v))
                .transpose()?,
        )?
        .build()?
        .try_deserialize()
}

fn validate_config_values(config: &AppConfig) -> Result<(), ConfigError> {
    if let Err(e) = config.validate() {
        return Err(ConfigError::Message(format!("Validation error: {e}")));
    }
    Ok(())
}

impl AppConfig {
    /// Loads configuration from environment variables with the `APP_`
    /// prefix, falling back to the defaults from `spec.md` §6.3.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing or validation fails.
    pub fn new() -> Result<Self, ConfigError> {
        load_env_file();

        let config = build_config_from_sources()?;
        validate_config_values(&config)?;

        Ok(config)
    }
}
