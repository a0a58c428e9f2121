use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub database_path: String,
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
    pub session_ttl: Duration,
    pub session_sweep_interval: Duration,
    pub shutdown_drain: Duration,
    pub log_json: bool,
    pub low_stock_threshold: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_path: "petzone.db".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout: Duration::from_secs(10),
            cors_allowed_origins: Vec::new(),
            session_ttl: Duration::from_secs(8 * 60 * 60),
            session_sweep_interval: Duration::from_secs(60),
            shutdown_drain: Duration::from_secs(5),
            log_json: true,
            low_stock_threshold: 10,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env::var("PETZONE_BIND").unwrap_or(defaults.bind_addr),
            database_path: env::var("PETZONE_DB_PATH").unwrap_or(defaults.database_path),
            max_body_bytes: env_usize("PETZONE_MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout: env_duration_ms("PETZONE_REQUEST_TIMEOUT_MS", 10_000),
            cors_allowed_origins: env_list("PETZONE_CORS_ALLOWED_ORIGINS"),
            session_ttl: env_duration_ms("PETZONE_SESSION_TTL_MS", 8 * 60 * 60 * 1000),
            session_sweep_interval: env_duration_ms("PETZONE_SESSION_SWEEP_MS", 60_000),
            shutdown_drain: env_duration_ms("PETZONE_SHUTDOWN_DRAIN_MS", 5000),
            log_json: env_bool("PETZONE_LOG_JSON", defaults.log_json),
            low_stock_threshold: i64::try_from(env_u64(
                "PETZONE_LOW_STOCK_THRESHOLD",
                defaults.low_stock_threshold as u64,
            ))
            .unwrap_or(defaults.low_stock_threshold),
        }
    }
}

pub fn validate_startup_config(config: &ServerConfig) -> Result<(), String> {
    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        return Err(format!("invalid bind addr: {}", config.bind_addr));
    }
    if config.database_path.trim().is_empty() {
        return Err("database path must not be empty".to_string());
    }
    if config.max_body_bytes == 0 {
        return Err("body limit must be > 0".to_string());
    }
    if config.request_timeout.is_zero() || config.session_ttl.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if config.session_sweep_interval.is_zero() {
        return Err("session sweep interval must be > 0".to_string());
    }
    if config.low_stock_threshold <= 0 {
        return Err("low stock threshold must be > 0".to_string());
    }
    Ok(())
}

pub fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

pub fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

pub fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
