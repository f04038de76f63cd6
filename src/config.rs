use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,

    // Role cache
    pub role_cache_ttl: Duration,
    pub role_cache_capacity: u64,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_mutation_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    pub api_prefix: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn or_default<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value {raw:?}: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            database_max_connections: or_default("DATABASE_MAX_CONNECTIONS", "10")?,
            jwt_secret: required("JWT_SECRET")?,

            role_cache_ttl: Duration::from_secs(or_default("ROLE_CACHE_TTL_SECS", "30")?),
            role_cache_capacity: or_default("ROLE_CACHE_CAPACITY", "10000")?,

            rate_protected_per_min: or_default("RATE_PROTECTED_PER_MIN", "1000")?,
            rate_mutation_per_min: or_default("RATE_MUTATION_PER_MIN", "120")?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: or_default("LOG_LEVEL", "debug")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://unused".to_string(),
            database_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            role_cache_ttl: Duration::from_secs(30),
            role_cache_capacity: 100,
            rate_protected_per_min: 1000,
            rate_mutation_per_min: 1000,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
            api_prefix: "/api".to_string(),
        }
    }
}
