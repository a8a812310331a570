//! Operator-supplied per-domain selector rules.

use pricefuse_core::{source, ProductRecord, SiteProfiles};
use scraper::Html;

use crate::html::query_first;
use crate::normalize::{canonical_currency, infer_currency, normalize_price};
use crate::urls::{absolutize_url, host_of};

pub const PROFILE_CONFIDENCE: f64 = 0.8;

/// Applies the site profile for `page_url`'s host, if one exists.
///
/// Returns `None` when no profile matches. A matching profile always yields
/// a record, even if none of its selectors hit, so that it anchors the
/// snapshot stage.
pub(crate) fn extract_from_profile(
    document: &Html,
    page_url: &str,
    profiles: &SiteProfiles,
) -> Option<ProductRecord> {
    let host = host_of(page_url)?;
    let profile = profiles.get(&host)?;

    let raw_sale = query_first(document, &profile.sale_price);
    let raw_original = query_first(document, &profile.original_price);

    let mut record = ProductRecord::empty(source::PROFILE);
    record.confidence = PROFILE_CONFIDENCE;
    record.title = query_first(document, &profile.title).filter(|t| !t.is_empty());
    record.sale_price = raw_sale.as_deref().and_then(normalize_price);
    record.original_price = raw_original.as_deref().and_then(normalize_price);
    record.image_url = query_first(document, &profile.image)
        .and_then(|src| absolutize_url(page_url, &src));
    record.currency = profile
        .currency
        .as_deref()
        .and_then(canonical_currency)
        .or_else(|| infer_currency(raw_sale.iter().chain(raw_original.iter())).map(str::to_owned));

    tracing::debug!(
        host = %host,
        title = ?record.title,
        sale_price = ?record.sale_price,
        "site profile applied"
    );
    Some(record)
}

#[cfg(test)]
mod tests {
    use pricefuse_core::SiteProfile;

    use super::*;

    fn profiles() -> SiteProfiles {
        [(
            "www.shop.example.com".to_owned(),
            SiteProfile {
                title: vec!["h1.name".to_owned()],
                sale_price: vec![".missing".to_owned(), "span.now".to_owned()],
                original_price: vec!["meta[itemprop=\"highPrice\"]".to_owned()],
                image: vec!["img.hero".to_owned()],
                currency: None,
            },
        )]
        .into_iter()
        .collect()
    }

    const HTML: &str = r#"<html><body>
        <h1 class="name"> Trail Runner </h1>
        <span class="now">£49.50</span>
        <meta itemprop="highPrice" content="70">
        <img class="hero" src="/img/runner.jpg">
    </body></html>"#;

    #[test]
    fn applies_matching_profile() {
        let doc = Html::parse_document(HTML);
        let record = extract_from_profile(&doc, "https://shop.example.com/p/1", &profiles())
            .expect("profile record");
        assert_eq!(record.title.as_deref(), Some("Trail Runner"));
        assert_eq!(record.sale_price.as_deref(), Some("49.50"));
        assert_eq!(record.original_price.as_deref(), Some("70.00"));
        assert_eq!(record.currency.as_deref(), Some("GBP"));
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://shop.example.com/img/runner.jpg")
        );
        assert_eq!(record.source, "profile");
    }

    #[test]
    fn no_profile_for_host() {
        let doc = Html::parse_document(HTML);
        assert!(extract_from_profile(&doc, "https://other.example.com/p/1", &profiles()).is_none());
    }
}
