use crate::app_config::{AppConfig, Environment, StoreBackend};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are invalid or a selected backend is
/// missing its required settings.
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
/// Returns `ConfigError` if values are invalid or a selected backend is
/// missing its required settings.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    // Empty values are treated as unset so `FOO=` in a .env file does not
    // turn into an empty API key.
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_flag = |var: &str, default: bool| -> Result<bool, ConfigError> {
        match optional(var) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid(var, format!("expected a boolean (true/false/1/0), got \"{raw}\""))
            }),
        }
    };

    let env = parse_environment(&or_default("TIKPULSE_ENV", "development"))?;
    let bind_addr = parse_addr("TIKPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("TIKPULSE_LOG_LEVEL", "info");

    let scrape_timeout_secs = parse_u64("TIKPULSE_SCRAPE_TIMEOUT_SECS", "15")?;
    let scrape_max_retries = parse_u32("TIKPULSE_SCRAPE_MAX_RETRIES", "2")?;
    let scrape_backoff_base_secs = parse_u64("TIKPULSE_SCRAPE_BACKOFF_BASE_SECS", "1")?;

    let use_proxy = parse_flag("TIKPULSE_USE_PROXY", false)?;
    let proxy_api_key =
        optional("TIKPULSE_PROXY_API_KEY").or_else(|| optional("SCRAPINGBEE_API_KEY"));
    let proxy_base_url = or_default(
        "TIKPULSE_PROXY_BASE_URL",
        "https://app.scrapingbee.com/api/v1/",
    );
    let proxy_country_code = or_default("TIKPULSE_PROXY_COUNTRY_CODE", "fr");
    let profile_base_url = or_default("TIKPULSE_PROFILE_BASE_URL", "https://www.tiktok.com")
        .trim_end_matches('/')
        .to_string();

    let cache_ttl_secs = parse_u64("TIKPULSE_CACHE_TTL_SECS", "900")?;
    let cache_max_items = parse_usize("TIKPULSE_CACHE_MAX_ITEMS", "200")?;
    let rate_limit_window_secs = parse_u64("TIKPULSE_RATE_LIMIT_WINDOW_SECS", "60")?;
    let rate_limit_max = parse_usize("TIKPULSE_RATE_LIMIT_MAX", "30")?;

    let openai_api_key = optional("OPENAI_API_KEY");
    let ai_enabled = parse_flag("TIKPULSE_AI_ENABLED", true)?;
    let ai_model = or_default("TIKPULSE_AI_MODEL", "gpt-4o-mini");
    let ai_base_url = or_default("TIKPULSE_AI_BASE_URL", "https://api.openai.com/v1")
        .trim_end_matches('/')
        .to_string();

    let store_backend = match or_default("TIKPULSE_STORE_BACKEND", "memory").as_str() {
        "memory" => StoreBackend::Memory,
        "file" => StoreBackend::File(PathBuf::from(or_default(
            "TIKPULSE_STORE_PATH",
            "./data/analyses.json",
        ))),
        "rest" => StoreBackend::Rest {
            url: optional("KV_REST_API_URL")
                .ok_or_else(|| ConfigError::MissingEnvVar("KV_REST_API_URL".to_string()))?,
            token: optional("KV_REST_API_TOKEN")
                .ok_or_else(|| ConfigError::MissingEnvVar("KV_REST_API_TOKEN".to_string()))?,
        },
        other => {
            return Err(invalid(
                "TIKPULSE_STORE_BACKEND",
                format!("expected one of memory, file, rest; got \"{other}\""),
            ))
        }
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        scrape_timeout_secs,
        scrape_max_retries,
        scrape_backoff_base_secs,
        use_proxy,
        proxy_api_key,
        proxy_base_url,
        proxy_country_code,
        profile_base_url,
        cache_ttl_secs,
        cache_max_items,
        rate_limit_window_secs,
        rate_limit_max,
        openai_api_key,
        ai_enabled,
        ai_model,
        ai_base_url,
        store_backend,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TIKPULSE_ENV".to_string(),
            reason: format!("expected one of development, test, production; got \"{other}\""),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
