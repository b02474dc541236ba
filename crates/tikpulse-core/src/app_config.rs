use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where analysis records are persisted.
#[derive(Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File(PathBuf),
    Rest { url: String, token: String },
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "Memory"),
            StoreBackend::File(path) => f.debug_tuple("File").field(path).finish(),
            StoreBackend::Rest { url, .. } => f
                .debug_struct("Rest")
                .field("url", url)
                .field("token", &"[redacted]")
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub scrape_timeout_secs: u64,
    pub scrape_max_retries: u32,
    pub scrape_backoff_base_secs: u64,
    pub use_proxy: bool,
    pub proxy_api_key: Option<String>,
    pub proxy_base_url: String,
    pub proxy_country_code: String,
    pub profile_base_url: String,
    pub cache_ttl_secs: u64,
    pub cache_max_items: usize,
    pub rate_limit_window_secs: u64,
    pub rate_limit_max: usize,
    pub openai_api_key: Option<String>,
    pub ai_enabled: bool,
    pub ai_model: String,
    pub ai_base_url: String,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// LLM advice is available only when enabled and a key is present.
    #[must_use]
    pub fn ai_available(&self) -> bool {
        self.ai_enabled && self.openai_api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("scrape_timeout_secs", &self.scrape_timeout_secs)
            .field("scrape_max_retries", &self.scrape_max_retries)
            .field("scrape_backoff_base_secs", &self.scrape_backoff_base_secs)
            .field("use_proxy", &self.use_proxy)
            .field(
                "proxy_api_key",
                &self.proxy_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("proxy_base_url", &self.proxy_base_url)
            .field("proxy_country_code", &self.proxy_country_code)
            .field("profile_base_url", &self.profile_base_url)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("cache_max_items", &self.cache_max_items)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("rate_limit_max", &self.rate_limit_max)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("ai_enabled", &self.ai_enabled)
            .field("ai_model", &self.ai_model)
            .field("ai_base_url", &self.ai_base_url)
            .field("store_backend", &self.store_backend)
            .finish()
    }
}
