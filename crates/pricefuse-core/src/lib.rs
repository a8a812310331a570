//! Shared data model and configuration for the pricefuse workspace.
//!
//! The extraction engine and the CLI both depend on this crate: it owns the
//! [`ProductRecord`] produced by every extractor, the [`PageSnapshot`] handed
//! over by the page-rendering collaborator, the environment-driven
//! [`AppConfig`], and the read-only [`SiteProfiles`] table.

pub mod app_config;
pub mod config;
pub mod record;
pub mod site_profiles;
pub mod snapshot;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{source, ProductRecord};
pub use site_profiles::{load_site_profiles, SiteProfile, SiteProfiles};
pub use snapshot::{PageMetadata, PageSnapshot};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read site profiles from {path}: {source}")]
    ProfilesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse site profiles: {0}")]
    ProfilesFileParse(#[from] serde_yaml::Error),

    #[error("site profile validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// `true` when the site-profile file simply does not exist, which callers
    /// treat as "no custom rules" rather than a misconfiguration.
    #[must_use]
    pub fn is_missing_file(&self) -> bool {
        matches!(
            self,
            ConfigError::ProfilesFileIo { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
