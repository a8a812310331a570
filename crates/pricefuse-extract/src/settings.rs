//! Immutable engine configuration, built once at startup and shared via `Arc`.

use std::path::PathBuf;
use std::time::Duration;

use pricefuse_core::{AppConfig, SiteProfiles};

/// One realistic browser header set used for direct page fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    pub user_agent: &'static str,
    pub accept_language: &'static str,
}

/// Pool rotated by random selection on every direct fetch.
pub const DEFAULT_HEADER_POOL: [HeaderSet; 3] = [
    HeaderSet {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    HeaderSet {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17 Safari/605.1.15",
        accept_language: "en-US,en;q=0.8",
    },
    HeaderSet {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/126.0",
        accept_language: "en-US,en;q=0.7",
    },
];

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub header_pool: Vec<HeaderSet>,
    pub site_profiles: SiteProfiles,
    /// Per-request timeout of the shared HTTP client.
    pub http_timeout: Duration,
    /// Deadline for the snapshot stage; on expiry the remaining stages are skipped.
    pub pipeline_timeout: Duration,
    pub http_stage_timeout: Duration,
    pub domain_stage_timeout: Duration,
    pub llm_stage_timeout: Duration,
    /// Readability proxy prefix; the target URL is appended verbatim.
    pub reader_base_url: String,
    pub macys_api_base: String,
    pub macys_image_base: String,
    pub enable_free_proxy: bool,
    pub proxy_list_url: String,
    /// Timeout for a single fetch through an anonymous proxy.
    pub proxy_fetch_timeout: Duration,
    pub debug_extract: bool,
    pub debug_dir: PathBuf,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            header_pool: DEFAULT_HEADER_POOL.to_vec(),
            site_profiles: SiteProfiles::default(),
            http_timeout: Duration::from_secs(45),
            pipeline_timeout: Duration::from_secs(20),
            http_stage_timeout: Duration::from_secs(15),
            domain_stage_timeout: Duration::from_secs(30),
            llm_stage_timeout: Duration::from_secs(45),
            reader_base_url: "https://r.jina.ai/".to_owned(),
            macys_api_base: "https://www.macys.com".to_owned(),
            macys_image_base: "https://slimages.macysassets.com/is/image/MCY/products/".to_owned(),
            enable_free_proxy: false,
            proxy_list_url: "https://free-proxy-list.net/".to_owned(),
            proxy_fetch_timeout: Duration::from_secs(10),
            debug_extract: false,
            debug_dir: PathBuf::from("debug-artifacts"),
        }
    }
}

impl ExtractorSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, site_profiles: SiteProfiles) -> Self {
        Self {
            site_profiles,
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            pipeline_timeout: Duration::from_secs(config.pipeline_timeout_secs),
            http_stage_timeout: Duration::from_secs(config.http_stage_timeout_secs),
            domain_stage_timeout: Duration::from_secs(config.domain_stage_timeout_secs),
            llm_stage_timeout: Duration::from_secs(config.llm_stage_timeout_secs),
            reader_base_url: config.reader_base_url.clone(),
            enable_free_proxy: config.enable_free_proxy,
            proxy_list_url: config.proxy_list_url.clone(),
            debug_extract: config.debug_extract,
            debug_dir: config.debug_dir.clone(),
            ..Self::default()
        }
    }
}
