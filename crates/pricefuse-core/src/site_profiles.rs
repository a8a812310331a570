//! Per-domain extraction rules loaded once at startup.
//!
//! ```yaml
//! profiles:
//!   shop.example.com:
//!     title: "h1.product-name"
//!     sale_price: [".price-now", "meta[itemprop=price]"]
//!     original_price: ".price-was"
//!     currency: USD
//! ```
//!
//! Every selector field accepts a single CSS selector or a list tried in order.
//! Hosts are matched case-insensitively with a leading `www.` removed.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    #[serde(default, deserialize_with = "one_or_many")]
    pub title: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub sale_price: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub original_price: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub image: Vec<String>,
    /// Fixed currency code for the site, used when no price string reveals one.
    #[serde(default)]
    pub currency: Option<String>,
}

impl SiteProfile {
    fn has_rules(&self) -> bool {
        !(self.title.is_empty()
            && self.sale_price.is_empty()
            && self.original_price.is_empty()
            && self.image.is_empty()
            && self.currency.is_none())
    }
}

/// Read-only table of [`SiteProfile`]s keyed by bare host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteProfiles {
    #[serde(default)]
    profiles: HashMap<String, SiteProfile>,
}

impl SiteProfiles {
    /// Looks up the profile for `host` (e.g. `"www.Shop.example.com"`).
    #[must_use]
    pub fn get(&self, host: &str) -> Option<&SiteProfile> {
        self.profiles.get(&bare_host(host))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl FromIterator<(String, SiteProfile)> for SiteProfiles {
    fn from_iter<I: IntoIterator<Item = (String, SiteProfile)>>(iter: I) -> Self {
        Self {
            profiles: iter
                .into_iter()
                .map(|(host, profile)| (bare_host(&host), profile))
                .collect(),
        }
    }
}

/// Lowercases `host` and strips one leading `www.`.
#[must_use]
pub fn bare_host(host: &str) -> String {
    let lower = host.trim().to_ascii_lowercase();
    lower
        .strip_prefix("www.")
        .map_or_else(|| lower.clone(), str::to_owned)
}

/// Load and validate the site-profile table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
/// Use [`ConfigError::is_missing_file`] to treat an absent file as an empty table.
pub fn load_site_profiles(path: &Path) -> Result<SiteProfiles, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProfilesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let parsed: SiteProfiles = serde_yaml::from_str(&content)?;
    validate_profiles(&parsed)?;

    // Re-key so lookups and file keys agree on normalization.
    Ok(parsed.profiles.into_iter().collect())
}

fn validate_profiles(profiles: &SiteProfiles) -> Result<(), ConfigError> {
    for (host, profile) in &profiles.profiles {
        if host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "profile host must be non-empty".to_string(),
            ));
        }
        if !profile.has_rules() {
            return Err(ConfigError::Validation(format!(
                "profile '{host}' defines no selectors and no currency"
            )));
        }
        let blank_selector = [
            &profile.title,
            &profile.sale_price,
            &profile.original_price,
            &profile.image,
        ]
        .into_iter()
        .flatten()
        .any(|s| s.trim().is_empty());
        if blank_selector {
            return Err(ConfigError::Validation(format!(
                "profile '{host}' contains an empty selector"
            )));
        }
    }
    Ok(())
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
