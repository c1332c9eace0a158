//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CADENCE_DB_PATH`: Database file path (required)
//! - `CADENCE_DB_POOL_SIZE`: Connection pool size
//! - `CADENCE_HTTP_HOST`: HTTP bind host
//! - `CADENCE_HTTP_PORT`: HTTP bind port
//! - `CADENCE_WEEK_UTC_OFFSET`: Fixed UTC offset in seconds
//! - `CADENCE_WEEK_MIN_YEAR` / `CADENCE_WEEK_MAX_YEAR`: Supported year range
//!
//! ## File Locations
//! The loader probes `config.{toml,json}` and `cadence.{toml,json}` in the
//! working directory, up to two parent directories, and next to the
//! executable.

use std::path::{Path, PathBuf};

use cadence_domain::{
    CadenceError, Config, DatabaseConfig, Result, ServerConfig, WeekConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CadenceError::Config` if configuration cannot be loaded from
/// either source, the file format is invalid, or required fields are
/// missing.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `CADENCE_DB_PATH` is required; everything else falls back to its
/// default.
///
/// # Errors
/// Returns `CadenceError::Config` if the database path is missing or any
/// present variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("CADENCE_DB_PATH")?;
    let pool_size = env_parsed("CADENCE_DB_POOL_SIZE")?;

    let host = std::env::var("CADENCE_HTTP_HOST").ok();
    let port = env_parsed("CADENCE_HTTP_PORT")?;

    let utc_offset_seconds = env_parsed("CADENCE_WEEK_UTC_OFFSET")?;
    let min_year = env_parsed("CADENCE_WEEK_MIN_YEAR")?;
    let max_year = env_parsed("CADENCE_WEEK_MAX_YEAR")?;

    let server_defaults = ServerConfig::default();
    let week_defaults = WeekConfig::default();

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: pool_size.unwrap_or(cadence_domain::constants::DEFAULT_DB_POOL_SIZE),
        },
        server: ServerConfig {
            host: host.unwrap_or(server_defaults.host),
            port: port.unwrap_or(server_defaults.port),
        },
        week: WeekConfig {
            utc_offset_seconds: utc_offset_seconds
                .unwrap_or(week_defaults.utc_offset_seconds),
            min_year: min_year.unwrap_or(week_defaults.min_year),
            max_year: max_year.unwrap_or(week_defaults.max_year),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `CadenceError::Config` if no file is found, the format is
/// invalid, or required fields are missing.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CadenceError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, detecting the format by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in [&cwd, &cwd.join(".."), &cwd.join("../..")] {
            candidates.extend([
                base.join("config.toml"),
                base.join("config.json"),
                base.join("cadence.toml"),
                base.join("cadence.json"),
            ]);
        }
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend([
                exe_dir.join("config.toml"),
                exe_dir.join("config.json"),
                exe_dir.join("cadence.toml"),
                exe_dir.join("cadence.json"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| CadenceError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable, erroring only when it is present
/// but malformed.
fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| CadenceError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}
