use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// JWT secret key for signing and validating tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Database URL
    pub db_url: Option<String>,

    /// Maximum age of a raised editing/typing indicator, in seconds
    #[serde(default = "default_indicator_ttl_secs")]
    pub indicator_ttl_secs: u64,
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Install the loaded configuration as the process-wide instance.
pub fn init_config(config: Config) {
    if CONFIG.set(config).is_err() {
        warn!("Configuration already initialized");
    }
}

/// Get the process-wide configuration instance.
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        // Load from environment variables using envy
        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("Configuration loaded successfully");
                if config.jwt_secret == default_jwt_secret() {
                    if config.is_production() {
                        error!("JWT_SECRET is not set - tokens are signed with the development secret");
                    } else {
                        warn!("JWT_SECRET not set - using the insecure development secret");
                    }
                }
                Ok(config)
            }
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    /// Check if running in production mode
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "prod" || self.environment.to_lowercase() == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            cors_origins: None,
            service_name: default_service_name(),
            jwt_secret: default_jwt_secret(),
            db_url: None,
            indicator_ttl_secs: default_indicator_ttl_secs(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "taskly-board".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_jwt_secret() -> String {
    "dev_secret_change_me".to_string()
}

fn default_indicator_ttl_secs() -> u64 {
    10
}
