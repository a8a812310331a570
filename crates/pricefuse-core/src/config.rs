use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
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
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable is optional; decoupling the lookup lets tests drive this with
/// a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
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
        match lookup(var) {
            Err(_) => Ok(default),
            Ok(raw) => parse_bool(&raw).ok_or_else(|| {
                invalid(var, format!("expected a boolean (true/false/1/0/yes/no/on/off), got \"{raw}\""))
            }),
        }
    };

    let env = parse_environment(&or_default("PRICEFUSE_ENV", "development"));
    let log_level = or_default("PRICEFUSE_LOG_LEVEL", "info");

    let http_timeout_secs = parse_u64("PRICEFUSE_HTTP_TIMEOUT_SECS", "45")?;
    let pipeline_timeout_secs = parse_u64("PRICEFUSE_PIPELINE_TIMEOUT_SECS", "20")?;
    let http_stage_timeout_secs = parse_u64("PRICEFUSE_HTTP_STAGE_TIMEOUT_SECS", "15")?;
    let domain_stage_timeout_secs = parse_u64("PRICEFUSE_DOMAIN_STAGE_TIMEOUT_SECS", "30")?;
    let llm_stage_timeout_secs = parse_u64("PRICEFUSE_LLM_STAGE_TIMEOUT_SECS", "45")?;

    let max_concurrent_extractions = parse_usize("PRICEFUSE_MAX_CONCURRENT_EXTRACTIONS", "2")?;
    if max_concurrent_extractions == 0 {
        return Err(invalid(
            "PRICEFUSE_MAX_CONCURRENT_EXTRACTIONS",
            "must be at least 1".to_string(),
        ));
    }

    let llm_api_key = lookup("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
    let llm_model = or_default("PRICEFUSE_LLM_MODEL", "gpt-4o-mini");
    let llm_base_url = or_default("PRICEFUSE_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_max_retries = parse_u32("PRICEFUSE_LLM_MAX_RETRIES", "2")?;
    let llm_backoff_base_secs = parse_u64("PRICEFUSE_LLM_BACKOFF_BASE_SECS", "4")?;

    let reader_base_url = or_default("PRICEFUSE_READER_BASE_URL", "https://r.jina.ai/");
    let enable_free_proxy = parse_flag("PRICEFUSE_ENABLE_FREE_PROXY", false)?;
    let proxy_list_url = or_default("PRICEFUSE_PROXY_LIST_URL", "https://free-proxy-list.net/");

    let site_profiles_path = PathBuf::from(or_default(
        "PRICEFUSE_SITE_PROFILES_PATH",
        "./config/site-profiles.yaml",
    ));
    let debug_extract = parse_flag("PRICEFUSE_DEBUG_EXTRACT", false)?;
    let debug_dir = PathBuf::from(or_default("PRICEFUSE_DEBUG_DIR", "debug-artifacts"));

    Ok(AppConfig {
        env,
        log_level,
        http_timeout_secs,
        pipeline_timeout_secs,
        http_stage_timeout_secs,
        domain_stage_timeout_secs,
        llm_stage_timeout_secs,
        max_concurrent_extractions,
        llm_api_key,
        llm_model,
        llm_base_url,
        llm_max_retries,
        llm_backoff_base_secs,
        reader_base_url,
        enable_free_proxy,
        proxy_list_url,
        site_profiles_path,
        debug_extract,
        debug_dir,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
