//! Application configuration structures
//!
//! Deserialized from environment variables or a config file by the infra
//! loader; consumed at startup to wire the database pool, HTTP server, and
//! week scheme.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DB_POOL_SIZE, DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT, DEFAULT_MAX_SUPPORTED_YEAR,
    DEFAULT_MIN_SUPPORTED_YEAR, DEFAULT_UTC_OFFSET_SECONDS,
};

/// Top-level configuration for the application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub week: WeekConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

/// Week scheme settings: the single fixed offset and supported year range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekConfig {
    #[serde(default = "default_utc_offset")]
    pub utc_offset_seconds: i32,
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default = "default_max_year")]
    pub max_year: i32,
}

impl Default for WeekConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: default_utc_offset(),
            min_year: default_min_year(),
            max_year: default_max_year(),
        }
    }
}

fn default_pool_size() -> u32 {
    DEFAULT_DB_POOL_SIZE
}

fn default_host() -> String {
    DEFAULT_HTTP_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_utc_offset() -> i32 {
    DEFAULT_UTC_OFFSET_SECONDS
}

fn default_min_year() -> i32 {
    DEFAULT_MIN_SUPPORTED_YEAR
}

fn default_max_year() -> i32 {
    DEFAULT_MAX_SUPPORTED_YEAR
}
