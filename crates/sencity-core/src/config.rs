use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup instead of mutating process state.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let database_url = require("DATABASE_URL")?;
    let auth_salt = require("SENCITY_AUTH_SALT")?;
    let navitia_token = require("SENCITY_NAVITIA_TOKEN")?;

    let env = parse_environment(&or_default("SENCITY_ENV", "development"));
    let bind_addr: SocketAddr = parse_as(
        "SENCITY_BIND_ADDR",
        &or_default("SENCITY_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("SENCITY_LOG_LEVEL", "info");
    let cors_origins = parse_origins(&or_default("SENCITY_CORS_ORIGINS", ""))?;

    let navitia_base_url = or_default("SENCITY_NAVITIA_BASE_URL", "https://api.navitia.io/v1/");
    let navitia_coverage = or_default("SENCITY_NAVITIA_COVERAGE", "fr-idf");
    let navitia_timeout_secs: u64 = parse_as(
        "SENCITY_NAVITIA_TIMEOUT_SECS",
        &or_default("SENCITY_NAVITIA_TIMEOUT_SECS", "15"),
    )?;
    let navitia_max_retries: u32 = parse_as(
        "SENCITY_NAVITIA_MAX_RETRIES",
        &or_default("SENCITY_NAVITIA_MAX_RETRIES", "2"),
    )?;
    let navitia_backoff_base_ms: u64 = parse_as(
        "SENCITY_NAVITIA_BACKOFF_BASE_MS",
        &or_default("SENCITY_NAVITIA_BACKOFF_BASE_MS", "250"),
    )?;

    let detour_concurrency: usize = parse_as(
        "SENCITY_DETOUR_CONCURRENCY",
        &or_default("SENCITY_DETOUR_CONCURRENCY", "4"),
    )?;
    if detour_concurrency == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SENCITY_DETOUR_CONCURRENCY".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    let closest_poi_radius_m: f64 = parse_as(
        "SENCITY_CLOSEST_POI_RADIUS_M",
        &or_default("SENCITY_CLOSEST_POI_RADIUS_M", "150"),
    )?;
    if !closest_poi_radius_m.is_finite() || closest_poi_radius_m <= 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SENCITY_CLOSEST_POI_RADIUS_M".to_string(),
            reason: "must be a positive number of meters".to_string(),
        });
    }

    let place_kinds_path = lookup("SENCITY_PLACE_KINDS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let db_max_connections: u32 = parse_as(
        "SENCITY_DB_MAX_CONNECTIONS",
        &or_default("SENCITY_DB_MAX_CONNECTIONS", "10"),
    )?;
    let db_min_connections: u32 = parse_as(
        "SENCITY_DB_MIN_CONNECTIONS",
        &or_default("SENCITY_DB_MIN_CONNECTIONS", "1"),
    )?;
    let db_acquire_timeout_secs: u64 = parse_as(
        "SENCITY_DB_ACQUIRE_TIMEOUT_SECS",
        &or_default("SENCITY_DB_ACQUIRE_TIMEOUT_SECS", "10"),
    )?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        cors_origins,
        log_level,
        auth_salt,
        navitia_token,
        navitia_base_url,
        navitia_coverage,
        navitia_timeout_secs,
        navitia_max_retries,
        navitia_backoff_base_ms,
        detour_concurrency,
        closest_poi_radius_m,
        place_kinds_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
    })
}

fn parse_as<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason: e.to_string(),
    })
}

/// Splits a comma-separated origin list, dropping blank entries.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if origins.iter().any(|o| o == "*") {
        return Err(ConfigError::InvalidEnvVar {
            var: "SENCITY_CORS_ORIGINS".to_string(),
            reason: "list explicit origins; any origin is only allowed outside production"
                .to_string(),
        });
    }
    Ok(origins)
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}
