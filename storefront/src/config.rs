// storefront/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use orderflow::{PlacementConfig, RetryPolicy};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub database_url: String,
  pub db_max_connections: u32,
  /// Apply `migrations/` on startup.
  pub run_migrations: bool,

  pub placement: PlacementConfig,
}

fn parse_or<T>(var_name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  /// Builds the config from any variable source. `from_env` passes the
  /// process environment; tests pass a map.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_or("SERVER_PORT", lookup("SERVER_PORT"), 8080u16)?;
    let database_url = lookup("DATABASE_URL")
      .ok_or_else(|| AppError::Config("Missing environment variable 'DATABASE_URL'".to_string()))?;
    let db_max_connections = parse_or("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 10u32)?;
    let run_migrations = parse_or("RUN_MIGRATIONS", lookup("RUN_MIGRATIONS"), false)?;

    let defaults = PlacementConfig::default();
    let store_timeout_ms = parse_or(
      "STORE_TIMEOUT_MS",
      lookup("STORE_TIMEOUT_MS"),
      defaults.store_timeout.as_millis() as u64,
    )?;
    let compensation = RetryPolicy {
      max_attempts: parse_or(
        "COMPENSATION_MAX_ATTEMPTS",
        lookup("COMPENSATION_MAX_ATTEMPTS"),
        defaults.compensation.max_attempts,
      )?,
      initial_backoff: Duration::from_millis(parse_or(
        "COMPENSATION_INITIAL_BACKOFF_MS",
        lookup("COMPENSATION_INITIAL_BACKOFF_MS"),
        defaults.compensation.initial_backoff.as_millis() as u64,
      )?),
      max_backoff: Duration::from_millis(parse_or(
        "COMPENSATION_MAX_BACKOFF_MS",
        lookup("COMPENSATION_MAX_BACKOFF_MS"),
        defaults.compensation.max_backoff.as_millis() as u64,
      )?),
    };
    if store_timeout_ms == 0 {
      return Err(AppError::Config("STORE_TIMEOUT_MS must be greater than zero".to_string()));
    }

    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      db_max_connections,
      run_migrations,
      placement: PlacementConfig::default()
        .with_store_timeout(Duration::from_millis(store_timeout_ms))
        .with_compensation(compensation),
    })
  }
}
