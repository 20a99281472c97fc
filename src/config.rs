// ⚙️ Configuration - Defaults, TOML file, environment
//
// Later sources override earlier ones:
// 1. default values
// 2. configuration file (`KOMUNITIN_CONFIG_FILE`, default `komunitin.toml`)
// 3. environment variables
//
// | Variable | Description | Default |
// |----------|-------------|---------|
// | `KOMUNITIN_CONFIG_FILE` | Configuration file path | `komunitin.toml` |
// | `KOMUNITIN_HOST` | Mock server host | `127.0.0.1` |
// | `KOMUNITIN_PORT` | Mock server port | `2025` |
// | `KOMUNITIN_BASE_URL` | Public URL used in `links.self` | `http://localhost:2025` |
// | `KOMUNITIN_LATENCY_MS` | Simulated network delay per request | `0` |
// | `KOMUNITIN_SEED` | Fixture random seed | `2029` |
// | `KOMUNITIN_LANG` | Locale used when nothing is saved | system locale |
// | `KOMUNITIN_PREFERENCES` | SQLite file holding saved preferences | `komunitin.db` |
// | `KOMUNITIN_LOG_LEVEL` | Log level | `info` |
// | `KOMUNITIN_LOG_FORMAT` | Log format (json/pretty) | `pretty` |
// | `KOMUNITIN_ENVIRONMENT` | `development` enables dev-only diagnostics | `development` |

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

// ============================================================================
// Server Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public URL prefix of self links
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: default_base_url(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                field: "server.host:port".to_string(),
                message: format!("{}", e),
            })
    }
}

// ============================================================================
// Mock API Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_accounting_path")]
    pub accounting_path: String,

    #[serde(default = "default_social_path")]
    pub social_path: String,

    /// Simulated round-trip delay in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            accounting_path: default_accounting_path(),
            social_path: default_social_path(),
            latency_ms: 0,
        }
    }
}

// ============================================================================
// Fixture Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default = "default_groups")]
    pub groups: usize,

    #[serde(default = "default_members_per_group")]
    pub members_per_group: usize,

    /// Accounts trading with the first account
    #[serde(default = "default_transfer_partners")]
    pub transfer_partners: usize,

    #[serde(default = "default_needs_per_group")]
    pub needs_per_group: usize,

    #[serde(default = "default_offers_per_group")]
    pub offers_per_group: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            groups: default_groups(),
            members_per_group: default_members_per_group(),
            transfer_partners: default_transfer_partners(),
            needs_per_group: default_needs_per_group(),
            offers_per_group: default_offers_per_group(),
        }
    }
}

// ============================================================================
// Locale Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Environment locale; the system locale is used when unset
    #[serde(default)]
    pub lang: Option<String>,

    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            lang: None,
            preferences_path: default_preferences_path(),
        }
    }
}

impl LocaleConfig {
    /// Configured locale, or the one reported by the operating system
    pub fn environment_locale(&self) -> Option<String> {
        self.lang
            .clone()
            .or_else(sys_locale::get_locale)
            .map(|l| l.to_lowercase())
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub locale: LocaleConfig,

    #[serde(default)]
    pub log: LogConfig,

    /// Deployment environment (development, test, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            seed: SeedConfig::default(),
            locale: LocaleConfig::default(),
            log: LogConfig::default(),
            environment: default_environment(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let config_path =
            std::env::var("KOMUNITIN_CONFIG_FILE").unwrap_or_else(|_| "komunitin.toml".to_string());

        if Path::new(&config_path).exists() {
            config = Self::from_file(&config_path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("KOMUNITIN_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("KOMUNITIN_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(url) = std::env::var("KOMUNITIN_BASE_URL") {
            self.server.base_url = url;
        }
        if let Ok(latency) = std::env::var("KOMUNITIN_LATENCY_MS") {
            if let Ok(ms) = latency.parse() {
                self.api.latency_ms = ms;
            }
        }
        if let Ok(seed) = std::env::var("KOMUNITIN_SEED") {
            if let Ok(s) = seed.parse() {
                self.seed.seed = s;
            }
        }
        if let Ok(lang) = std::env::var("KOMUNITIN_LANG") {
            self.locale.lang = Some(lang);
        }
        if let Ok(path) = std::env::var("KOMUNITIN_PREFERENCES") {
            self.locale.preferences_path = PathBuf::from(path);
        }
        if let Ok(level) = std::env::var("KOMUNITIN_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Ok(format) = std::env::var("KOMUNITIN_LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            };
        }
        if let Ok(env) = std::env::var("KOMUNITIN_ENVIRONMENT") {
            self.environment = env;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        for (field, path) in [
            ("api.accounting_path", &self.api.accounting_path),
            ("api.social_path", &self.api.social_path),
        ] {
            if !path.starts_with('/') || path.len() < 2 || path.ends_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{}' must look like /name", path),
                });
            }
        }
        if self.api.accounting_path == self.api.social_path {
            return Err(ConfigError::InvalidValue {
                field: "api.social_path".to_string(),
                message: "must differ from api.accounting_path".to_string(),
            });
        }

        if self.server.base_url.ends_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "server.base_url".to_string(),
                message: "must not end with '/'".to_string(),
            });
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2025
}

fn default_base_url() -> String {
    "http://localhost:2025".to_string()
}

fn default_accounting_path() -> String {
    "/accounting".to_string()
}

fn default_social_path() -> String {
    "/social".to_string()
}

fn default_seed() -> u64 {
    2029
}

fn default_groups() -> usize {
    3
}

fn default_members_per_group() -> usize {
    10
}

fn default_transfer_partners() -> usize {
    5
}

fn default_needs_per_group() -> usize {
    4
}

fn default_offers_per_group() -> usize {
    4
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("komunitin.db")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

// ============================================================================
// Tests
// ============================================================================
