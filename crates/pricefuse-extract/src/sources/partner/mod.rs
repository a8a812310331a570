//! Domain-specific extraction.
//!
//! Each [`PartnerExtractor`] knows one retailer's private API or rendering
//! quirks. The [`DomainRouter`] picks the dedicated integration for a host,
//! or the generic fallback when one is configured.

pub mod free_proxy;
pub mod macys;

use async_trait::async_trait;
use pricefuse_core::ProductRecord;

use crate::client::PageFetcher;
use crate::error::ExtractError;
use crate::settings::ExtractorSettings;
use crate::urls::host_of;

pub use free_proxy::FreeProxyExtractor;
pub use macys::MacysExtractor;

/// Produces a record for URLs on the domains it handles.
#[async_trait]
pub trait PartnerExtractor: Send + Sync {
    /// Short name for logs and debug dumps.
    fn name(&self) -> &'static str;

    /// `host` is lower-cased with any leading `www.` removed.
    fn handles(&self, host: &str) -> bool;

    /// `Ok(None)` means the partner had nothing usable for this URL.
    async fn extract(&self, url: &str) -> Result<Option<ProductRecord>, ExtractError>;
}

/// Dedicated integrations first, then an optional catch-all.
#[derive(Default)]
pub struct DomainRouter {
    partners: Vec<Box<dyn PartnerExtractor>>,
    fallback: Option<Box<dyn PartnerExtractor>>,
}

impl DomainRouter {
    /// The built-in integrations, plus the anonymous-proxy fallback when enabled.
    #[must_use]
    pub fn from_settings(fetcher: &PageFetcher, settings: &ExtractorSettings) -> Self {
        let mut router = Self::default().with_partner(Box::new(MacysExtractor::new(
            fetcher.clone(),
            settings,
        )));
        if settings.enable_free_proxy {
            router = router.with_fallback(Box::new(FreeProxyExtractor::new(
                fetcher.clone(),
                settings,
            )));
        }
        router
    }

    #[must_use]
    pub fn with_partner(mut self, partner: Box<dyn PartnerExtractor>) -> Self {
        self.partners.push(partner);
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Box<dyn PartnerExtractor>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// The extractor responsible for `url`, if any.
    #[must_use]
    pub fn route(&self, url: &str) -> Option<&dyn PartnerExtractor> {
        let host = host_of(url)?;
        self.partners
            .iter()
            .find(|p| p.handles(&host))
            .or(self.fallback.as_ref())
            .map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, &'static str);

    #[async_trait]
    impl PartnerExtractor for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn handles(&self, host: &str) -> bool {
            self.1 == "*" || host == self.1
        }

        async fn extract(&self, _url: &str) -> Result<Option<ProductRecord>, ExtractError> {
            Ok(None)
        }
    }

    #[test]
    fn routes_dedicated_partner_before_fallback() {
        let router = DomainRouter::default()
            .with_partner(Box::new(Fixed("shop", "shop.example.com")))
            .with_fallback(Box::new(Fixed("any", "*")));
        assert_eq!(
            router.route("https://www.shop.example.com/p/1").map(PartnerExtractor::name),
            Some("shop")
        );
        assert_eq!(
            router.route("https://other.example.com/p/1").map(PartnerExtractor::name),
            Some("any")
        );
    }

    #[test]
    fn no_route_without_fallback() {
        let router = DomainRouter::default().with_partner(Box::new(Fixed("shop", "shop.example.com")));
        assert!(router.route("https://other.example.com/").is_none());
        assert!(router.route("not a url").is_none());
    }
}
