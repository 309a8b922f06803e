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

/// Returns a map with all required env vars populated with valid values.
fn full_env<'a>() -> HashMap<&'a str, &'a str> {
    let mut m = HashMap::new();
    m.insert("PRODUCT_HANDLE", "w9536r-seamless-delight-high-neck-bra-white-heather");
    m.insert("VARIANT_ID", "43774160568500");
    m
}

#[test]
fn build_app_config_fails_without_product_handle() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PRODUCT_HANDLE"),
        "expected MissingEnvVar(PRODUCT_HANDLE), got: {result:?}"
    );
}

#[test]
fn build_app_config_fails_without_variant_id() {
    let mut map: HashMap<&str, &str> = HashMap::new();
    map.insert("PRODUCT_HANDLE", "some-handle");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "VARIANT_ID"),
        "expected MissingEnvVar(VARIANT_ID), got: {result:?}"
    );
}

#[test]
fn build_app_config_treats_blank_handle_as_missing() {
    let mut map = full_env();
    map.insert("PRODUCT_HANDLE", "   ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "PRODUCT_HANDLE"));
}

#[test]
fn build_app_config_rejects_non_numeric_variant_id() {
    let mut map = full_env();
    map.insert("VARIANT_ID", "size-l");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "VARIANT_ID"),
        "expected InvalidEnvVar(VARIANT_ID), got: {result:?}"
    );
}

#[test]
fn build_app_config_succeeds_with_defaults() {
    let map = full_env();
    let cfg = build_app_config(lookup_from_map(&map)).expect("expected Ok");
    assert_eq!(
        cfg.product_handle,
        "w9536r-seamless-delight-high-neck-bra-white-heather"
    );
    assert_eq!(cfg.variant_id, 43_774_160_568_500);
    assert_eq!(cfg.store_url, "https://www.aloyoga.com");
    assert_eq!(cfg.region_path.as_deref(), Some("ko-kr"));
    assert!(cfg.telegram.is_none());
    assert!(cfg.product_title.is_none());
    assert!(cfg.variant_label.is_none());
    assert_eq!(cfg.state_path, PathBuf::from(".restock_state.json"));
    assert_eq!(cfg.relay_url_template, "https://r.jina.ai/{url}");
    assert_eq!(cfg.request_timeout_secs, 15);
    assert_eq!(cfg.retry.max_attempts, 3);
    assert_eq!(cfg.retry.backoff_base_ms, 1000);
    assert_eq!(cfg.retry.backoff_jitter_ms, 500);
    assert_eq!(cfg.retry.max_retry_after_secs, 30);
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn empty_region_path_disables_region_prefix() {
    let mut map = full_env();
    map.insert("RESTOCK_REGION_PATH", "");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.region_path.is_none());
}

#[test]
fn region_path_is_trimmed_of_slashes() {
    let mut map = full_env();
    map.insert("RESTOCK_REGION_PATH", "/en-us/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.region_path.as_deref(), Some("en-us"));
}

#[test]
fn store_url_trailing_slash_is_stripped() {
    let mut map = full_env();
    map.insert("RESTOCK_STORE_URL", "https://shop.example.com/");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.store_url, "https://shop.example.com");
}

#[test]
fn store_url_must_be_http() {
    let mut map = full_env();
    map.insert("RESTOCK_STORE_URL", "ftp://shop.example.com");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RESTOCK_STORE_URL"),
        "expected InvalidEnvVar(RESTOCK_STORE_URL), got: {result:?}"
    );
}

#[test]
fn telegram_requires_both_token_and_chat_id() {
    let mut map = full_env();
    map.insert("TELEGRAM_BOT_TOKEN", "123456:ABC-DEF");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.telegram.is_none());

    map.insert("TELEGRAM_CHAT_ID", "987654321");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let telegram = cfg.telegram.expect("telegram settings");
    assert_eq!(telegram.bot_token, "123456:ABC-DEF");
    assert_eq!(telegram.chat_id, "987654321");
    assert_eq!(telegram.api_url, "https://api.telegram.org");
}

#[test]
fn telegram_token_is_redacted_in_debug_output() {
    let mut map = full_env();
    map.insert("TELEGRAM_BOT_TOKEN", "123456:SECRET");
    map.insert("TELEGRAM_CHAT_ID", "987654321");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("SECRET"), "token leaked: {rendered}");
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn relay_template_must_contain_placeholder() {
    let mut map = full_env();
    map.insert("RESTOCK_RELAY_URL_TEMPLATE", "https://relay.example.com/");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RESTOCK_RELAY_URL_TEMPLATE"),
        "expected InvalidEnvVar(RESTOCK_RELAY_URL_TEMPLATE), got: {result:?}"
    );
}

#[test]
fn max_attempts_of_zero_is_rejected() {
    let mut map = full_env();
    map.insert("RESTOCK_MAX_ATTEMPTS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RESTOCK_MAX_ATTEMPTS"),
        "expected InvalidEnvVar(RESTOCK_MAX_ATTEMPTS), got: {result:?}"
    );
}

#[test]
fn retry_settings_override() {
    let mut map = full_env();
    map.insert("RESTOCK_MAX_ATTEMPTS", "5");
    map.insert("RESTOCK_BACKOFF_BASE_MS", "250");
    map.insert("RESTOCK_BACKOFF_JITTER_MS", "0");
    map.insert("RESTOCK_MAX_RETRY_AFTER_SECS", "10");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.retry,
        RetrySettings {
            max_attempts: 5,
            backoff_base_ms: 250,
            backoff_jitter_ms: 0,
            max_retry_after_secs: 10,
        }
    );
}

#[test]
fn backoff_base_ms_invalid() {
    let mut map = full_env();
    map.insert("RESTOCK_BACKOFF_BASE_MS", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "RESTOCK_BACKOFF_BASE_MS"),
        "expected InvalidEnvVar(RESTOCK_BACKOFF_BASE_MS), got: {result:?}"
    );
}

#[test]
fn variant_query_uses_configured_store_and_region() {
    let mut map = full_env();
    map.insert("RESTOCK_STORE_URL", "https://shop.example.com");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let query = cfg.variant_query();
    assert_eq!(
        query.page_url(),
        "https://shop.example.com/ko-kr/products/w9536r-seamless-delight-high-neck-bra-white-heather?variant=43774160568500"
    );
}
