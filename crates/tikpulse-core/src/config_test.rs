use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn parse_environment_development() {
    assert_eq!(
        parse_environment("development").unwrap(),
        Environment::Development
    );
}

#[test]
fn parse_environment_production() {
    assert_eq!(
        parse_environment("production").unwrap(),
        Environment::Production
    );
}

#[test]
fn parse_environment_unknown_fails() {
    let err = parse_environment("staging").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidEnvVar { ref var, .. } if var == "TIKPULSE_ENV"));
}

#[test]
fn build_app_config_uses_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).expect("defaults should be valid");
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.scrape_timeout_secs, 15);
    assert_eq!(cfg.scrape_max_retries, 2);
    assert_eq!(cfg.scrape_backoff_base_secs, 1);
    assert!(!cfg.use_proxy);
    assert!(cfg.proxy_api_key.is_none());
    assert_eq!(cfg.proxy_country_code, "fr");
    assert_eq!(cfg.profile_base_url, "https://www.tiktok.com");
    assert_eq!(cfg.cache_ttl_secs, 900);
    assert_eq!(cfg.cache_max_items, 200);
    assert_eq!(cfg.rate_limit_window_secs, 60);
    assert_eq!(cfg.rate_limit_max, 30);
    assert!(cfg.ai_enabled);
    assert!(!cfg.ai_available());
    assert_eq!(cfg.ai_model, "gpt-4o-mini");
    assert_eq!(cfg.store_backend, StoreBackend::Memory);
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIKPULSE_BIND_ADDR"),
        "expected InvalidEnvVar(TIKPULSE_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_with_invalid_timeout() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_SCRAPE_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIKPULSE_SCRAPE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(TIKPULSE_SCRAPE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn build_app_config_parses_proxy_flag_variants() {
    for (raw, expected) in [("1", true), ("true", true), ("0", false), ("off", false)] {
        let mut map = HashMap::new();
        map.insert("TIKPULSE_USE_PROXY", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.use_proxy, expected, "raw value {raw}");
    }
}

#[test]
fn build_app_config_rejects_garbage_flag() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_AI_ENABLED", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIKPULSE_AI_ENABLED"),
        "expected InvalidEnvVar(TIKPULSE_AI_ENABLED), got: {result:?}"
    );
}

#[test]
fn build_app_config_accepts_scrapingbee_key_alias() {
    let mut map = HashMap::new();
    map.insert("SCRAPINGBEE_API_KEY", "bee-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.proxy_api_key.as_deref(), Some("bee-key"));
}

#[test]
fn build_app_config_prefers_primary_proxy_key() {
    let mut map = HashMap::new();
    map.insert("SCRAPINGBEE_API_KEY", "bee-key");
    map.insert("TIKPULSE_PROXY_API_KEY", "primary-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.proxy_api_key.as_deref(), Some("primary-key"));
}

#[test]
fn build_app_config_treats_empty_key_as_unset() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.openai_api_key.is_none());
}

#[test]
fn build_app_config_ai_available_requires_key_and_flag() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-test");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.ai_available());

    map.insert("TIKPULSE_AI_ENABLED", "0");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.ai_available());
}

#[test]
fn build_app_config_file_backend_uses_path() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_STORE_BACKEND", "file");
    map.insert("TIKPULSE_STORE_PATH", "/tmp/tikpulse.json");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.store_backend,
        StoreBackend::File(std::path::PathBuf::from("/tmp/tikpulse.json"))
    );
}

#[test]
fn build_app_config_rest_backend_requires_url() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_STORE_BACKEND", "rest");
    map.insert("KV_REST_API_TOKEN", "token");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "KV_REST_API_URL"),
        "expected MissingEnvVar(KV_REST_API_URL), got: {result:?}"
    );
}

#[test]
fn build_app_config_unknown_backend_fails() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_STORE_BACKEND", "postgres");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TIKPULSE_STORE_BACKEND"),
        "expected InvalidEnvVar(TIKPULSE_STORE_BACKEND), got: {result:?}"
    );
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-very-secret");
    map.insert("TIKPULSE_PROXY_API_KEY", "proxy-secret");
    map.insert("TIKPULSE_STORE_BACKEND", "rest");
    map.insert("KV_REST_API_URL", "https://kv.example.com");
    map.insert("KV_REST_API_TOKEN", "kv-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let debug = format!("{cfg:?}");
    assert!(!debug.contains("sk-very-secret"));
    assert!(!debug.contains("proxy-secret"));
    assert!(!debug.contains("kv-secret"));
    assert!(debug.contains("[redacted]"));
}

#[test]
fn profile_base_url_trailing_slash_is_trimmed() {
    let mut map = HashMap::new();
    map.insert("TIKPULSE_PROFILE_BASE_URL", "http://127.0.0.1:9000/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.profile_base_url, "http://127.0.0.1:9000");
}
