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
    assert_eq!(parse_environment("development"), Environment::Development);
}

#[test]
fn parse_environment_production() {
    assert_eq!(parse_environment("production"), Environment::Production);
}

#[test]
fn parse_environment_unknown_defaults_to_development() {
    assert_eq!(parse_environment("staging"), Environment::Development);
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.env, Environment::Development);
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.http_timeout_secs, 45);
    assert_eq!(cfg.pipeline_timeout_secs, 20);
    assert_eq!(cfg.http_stage_timeout_secs, 15);
    assert_eq!(cfg.domain_stage_timeout_secs, 30);
    assert_eq!(cfg.llm_stage_timeout_secs, 45);
    assert_eq!(cfg.max_concurrent_extractions, 2);
    assert!(cfg.llm_api_key.is_none());
    assert!(!cfg.llm_enabled());
    assert_eq!(cfg.llm_model, "gpt-4o-mini");
    assert_eq!(cfg.llm_max_retries, 2);
    assert_eq!(cfg.reader_base_url, "https://r.jina.ai/");
    assert!(!cfg.enable_free_proxy);
    assert!(!cfg.debug_extract);
    assert_eq!(cfg.debug_dir.to_str(), Some("debug-artifacts"));
}

#[test]
fn llm_enabled_when_api_key_present() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-test");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.llm_enabled());
}

#[test]
fn blank_api_key_leaves_llm_disabled() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "   ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(!cfg.llm_enabled());
}

#[test]
fn api_key_is_redacted_in_debug_output() {
    let mut map = HashMap::new();
    map.insert("OPENAI_API_KEY", "sk-very-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("sk-very-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn pipeline_timeout_override() {
    let mut map = HashMap::new();
    map.insert("PRICEFUSE_PIPELINE_TIMEOUT_SECS", "5");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.pipeline_timeout_secs, 5);
}

#[test]
fn pipeline_timeout_invalid() {
    let mut map = HashMap::new();
    map.insert("PRICEFUSE_PIPELINE_TIMEOUT_SECS", "soon");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEFUSE_PIPELINE_TIMEOUT_SECS"),
        "expected InvalidEnvVar(PRICEFUSE_PIPELINE_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn max_concurrent_extractions_rejects_zero() {
    let mut map = HashMap::new();
    map.insert("PRICEFUSE_MAX_CONCURRENT_EXTRACTIONS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEFUSE_MAX_CONCURRENT_EXTRACTIONS"),
        "expected InvalidEnvVar(PRICEFUSE_MAX_CONCURRENT_EXTRACTIONS), got: {result:?}"
    );
}

#[test]
fn boolean_flags_accept_common_spellings() {
    for (raw, expected) in [("1", true), ("YES", true), ("on", true), ("0", false), ("off", false)] {
        let mut map = HashMap::new();
        map.insert("PRICEFUSE_DEBUG_EXTRACT", raw);
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.debug_extract, expected, "raw value {raw}");
    }
}

#[test]
fn boolean_flag_invalid() {
    let mut map = HashMap::new();
    map.insert("PRICEFUSE_ENABLE_FREE_PROXY", "maybe");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "PRICEFUSE_ENABLE_FREE_PROXY"),
        "expected InvalidEnvVar(PRICEFUSE_ENABLE_FREE_PROXY), got: {result:?}"
    );
}

#[test]
fn llm_retry_settings_override() {
    let mut map = HashMap::new();
    map.insert("PRICEFUSE_LLM_MAX_RETRIES", "0");
    map.insert("PRICEFUSE_LLM_BACKOFF_BASE_SECS", "1");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_max_retries, 0);
    assert_eq!(cfg.llm_backoff_base_secs, 1);
}
