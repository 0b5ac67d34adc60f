//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `TABLEBOOK_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `TABLEBOOK_` override YAML values
//! 3. **DATABASE_URL** - Special case: switches to an external database at this URL
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `TABLEBOOK_OPENING_HOURS__OPEN_HOUR=18` sets the `opening_hours.open_hour` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use tablebook::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Database**: `database.type` (`external` or `memory`), `database.url`, `database.pool`
//! - **Seeding**: `seed.enabled`, `seed.tables`, `seed.seats` - Tables created on an empty database
//! - **Booking rules**: `opening_hours`, `default_duration_minutes`
//! - **Security**: `cors.allowed_origins`
//! - **Telemetry**: `enable_otel_export`

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::engine::OpeningHours;
use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "TABLEBOOK_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty (or missing) config file gives a runnable in-memory
/// service on port 3000.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; folded into `database` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    /// Database configuration - external PostgreSQL or in-memory
    pub database: DatabaseConfig,
    /// Tables created at startup when none exist
    pub seed: SeedConfig,
    /// UTC hours in which reservations may start
    pub opening_hours: OpeningHours,
    /// Duration (minutes) stored for reservations created without one
    pub default_duration_minutes: i32,
    pub cors: CorsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            database: DatabaseConfig::default(),
            seed: SeedConfig::default(),
            opening_hours: OpeningHours::default(),
            default_duration_minutes: 60,
            cors: CorsConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// Individual pool configuration with all SQLx parameters.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolSettings {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum time to wait for a connection (seconds)
    pub acquire_timeout_secs: u64,
    /// Time before idle connections are closed (seconds, 0 = never)
    pub idle_timeout_secs: u64,
    /// Maximum lifetime of a connection (seconds, 0 = never)
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,  // 10 minutes
            max_lifetime_secs: 1800, // 30 minutes
        }
    }
}

/// Where reservations are stored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// External PostgreSQL database
    External {
        /// Connection string
        url: String,
        #[serde(default)]
        pool: PoolSettings,
    },
    /// Process-local store; data is lost on shutdown
    #[default]
    Memory,
}

impl DatabaseConfig {
    pub fn external_url(&self) -> Option<&str> {
        match self {
            DatabaseConfig::External { url, .. } => Some(url.as_str()),
            DatabaseConfig::Memory => None,
        }
    }

    pub fn pool_settings(&self) -> PoolSettings {
        match self {
            DatabaseConfig::External { pool, .. } => pool.clone(),
            DatabaseConfig::Memory => PoolSettings::default(),
        }
    }
}

/// Startup seeding of restaurant tables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    pub enabled: bool,
    /// Number of tables to create
    pub tables: u32,
    /// Seats per table
    pub seats: i32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tables: 5,
            seats: 4,
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// CORS origin specification.
///
/// Can be either a wildcard (`*`) to allow all origins, or a specific URL.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // if database_url is set, use it (preserving configured pool settings)
        if let Some(url) = config.database_url.take() {
            let pool = config.database.pool_settings();
            config.database = DatabaseConfig::External { url, pool };
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |message: String| Error::Internal {
            operation: format!("Config validation: {message}"),
        };

        let OpeningHours { open_hour, close_hour } = self.opening_hours;
        if close_hour > 24 {
            return Err(invalid(format!("opening_hours.close_hour must be at most 24, got {close_hour}")));
        }
        if open_hour >= close_hour {
            return Err(invalid(format!(
                "opening_hours.open_hour ({open_hour}) must be before opening_hours.close_hour ({close_hour})"
            )));
        }

        if self.default_duration_minutes < 1 {
            return Err(invalid(format!(
                "default_duration_minutes must be at least 1, got {}",
                self.default_duration_minutes
            )));
        }

        if self.seed.enabled && self.seed.seats < 1 {
            return Err(invalid(format!("seed.seats must be at least 1, got {}", self.seed.seats)));
        }

        if let DatabaseConfig::External { url, pool } = &self.database {
            if url.is_empty() {
                return Err(invalid("database.url must not be empty".to_string()));
            }
            if pool.max_connections == 0 {
                return Err(invalid("database.pool.max_connections must be greater than 0".to_string()));
            }
            if pool.min_connections > pool.max_connections {
                return Err(invalid(format!(
                    "database.pool.min_connections ({}) exceeds max_connections ({})",
                    pool.min_connections, pool.max_connections
                )));
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("TABLEBOOK_").ignore(&["config"]).split("__"))
            // Common DATABASE_URL pattern
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
