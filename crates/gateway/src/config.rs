//! Gateway configuration loaded from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings of the gateway process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Root of generated artifacts.
    pub data_dir: PathBuf,
    /// CORS origins; `*` allows any.
    pub allowed_origins: Vec<String>,
    /// Production mode switches logs to JSON.
    pub production: bool,
    /// Upper bound on a single agent execution.
    pub execution_timeout: Duration,
    /// Requests per client IP per minute on `/api`; zero disables the limit.
    pub rate_limit_per_minute: u32,
    /// Lifetime of cached results.
    pub cache_ttl: Duration,
    /// Maximum cached results.
    pub cache_capacity: usize,
    /// Registry override file.
    pub registry_path: Option<PathBuf>,
    /// Model provider API key.
    pub llm_api_key: String,
    /// Model name.
    pub llm_model: String,
    /// Model provider base URL.
    pub llm_base_url: String,
    /// Concurrent model calls.
    pub llm_max_concurrency: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("data"),
            allowed_origins: vec!["*".to_string()],
            production: false,
            execution_timeout: Duration::from_secs(300),
            rate_limit_per_minute: 30,
            cache_ttl: Duration::from_secs(3600),
            cache_capacity: 100,
            registry_path: None,
            llm_api_key: String::new(),
            llm_model: "gemini-2.5-flash".to_string(),
            llm_base_url: "https://generativelanguage.googleapis.com".to_string(),
            llm_max_concurrency: 2,
        }
    }
}

impl GatewayConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse(&get, "PORT", defaults.port)?,
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.allowed_origins),
            production: get("PRODUCTION")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.production),
            execution_timeout: Duration::from_secs(parse(
                &get,
                "EXECUTION_TIMEOUT_SECS",
                defaults.execution_timeout.as_secs(),
            )?),
            rate_limit_per_minute: parse(&get, "RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?,
            cache_ttl: Duration::from_secs(parse(&get, "CACHE_TTL_SECS", defaults.cache_ttl.as_secs())?),
            cache_capacity: parse(&get, "CACHE_CAPACITY", defaults.cache_capacity)?,
            registry_path: get("AGENT_REGISTRY_PATH").map(PathBuf::from),
            llm_api_key: get("GEMINI_API_KEY").unwrap_or(defaults.llm_api_key),
            llm_model: get("GEMINI_MODEL").unwrap_or(defaults.llm_model),
            llm_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.llm_base_url),
            llm_max_concurrency: parse(&get, "LLM_MAX_CONCURRENCY", defaults.llm_max_concurrency)?,
        })
    }

    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
