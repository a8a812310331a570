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

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Per-request timeout of the shared HTTP client.
    pub http_timeout_secs: u64,
    /// Deadline for one whole extraction (render plus HTTP, domain and LLM stages).
    pub pipeline_timeout_secs: u64,
    pub http_stage_timeout_secs: u64,
    pub domain_stage_timeout_secs: u64,
    pub llm_stage_timeout_secs: u64,
    pub max_concurrent_extractions: usize,
    /// `None` disables the LLM stage.
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_max_retries: u32,
    pub llm_backoff_base_secs: u64,
    /// Readability proxy prefix; the target URL is appended verbatim.
    pub reader_base_url: String,
    pub enable_free_proxy: bool,
    pub proxy_list_url: String,
    pub site_profiles_path: PathBuf,
    pub debug_extract: bool,
    pub debug_dir: PathBuf,
}

impl AppConfig {
    #[must_use]
    pub fn llm_enabled(&self) -> bool {
        self.llm_api_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("pipeline_timeout_secs", &self.pipeline_timeout_secs)
            .field("http_stage_timeout_secs", &self.http_stage_timeout_secs)
            .field("domain_stage_timeout_secs", &self.domain_stage_timeout_secs)
            .field("llm_stage_timeout_secs", &self.llm_stage_timeout_secs)
            .field(
                "max_concurrent_extractions",
                &self.max_concurrent_extractions,
            )
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_model", &self.llm_model)
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_backoff_base_secs", &self.llm_backoff_base_secs)
            .field("reader_base_url", &self.reader_base_url)
            .field("enable_free_proxy", &self.enable_free_proxy)
            .field("proxy_list_url", &self.proxy_list_url)
            .field("site_profiles_path", &self.site_profiles_path)
            .field("debug_extract", &self.debug_extract)
            .field("debug_dir", &self.debug_dir)
            .finish()
    }
}
