use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup from the environment.
///
/// A `.env` file is honored via `dotenv` before the first read. Every value
/// has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file.
    pub database_path: String,
    /// Address the HTTP API binds to.
    pub bind_addr: String,
    /// Base URL of the llama-server completion endpoint.
    pub llm_url: String,
    /// Base URL of the dashboard-indicator detection service.
    pub vision_url: String,
    /// Hard deadline for a single generation call.
    pub llm_timeout: Duration,
    /// Hard deadline for a single image-analysis call.
    pub vision_timeout: Duration,
    /// Hard deadline for a single web-search call.
    pub search_timeout: Duration,
    /// Lifetime of cached search results, in hours.
    pub search_cache_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            database_path: env::var("KOUNHANY_DB_PATH")
                .unwrap_or_else(|_| "kounhany.sqlite".to_string()),
            bind_addr: env::var("KOUNHANY_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8000".to_string()),
            llm_url: env::var("KOUNHANY_LLM_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            vision_url: env::var("KOUNHANY_VISION_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8090".to_string()),
            llm_timeout: Duration::from_secs(env_u64("KOUNHANY_LLM_TIMEOUT_SECS", 120)),
            vision_timeout: Duration::from_secs(env_u64("KOUNHANY_VISION_TIMEOUT_SECS", 30)),
            search_timeout: Duration::from_secs(env_u64("KOUNHANY_SEARCH_TIMEOUT_SECS", 10)),
            search_cache_ttl_hours: env_u64("KOUNHANY_SEARCH_CACHE_TTL_HOURS", 24) as i64,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
