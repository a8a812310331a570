//! Raw HTTP fetch, independent of the rendering session.

use pricefuse_core::{source, ProductRecord};
use scraper::Html;

use crate::client::PageFetcher;
use crate::html::{page_title, visible_text};
use crate::normalize::infer_currency;
use crate::patterns::trim_secondary_sections;
use crate::pricing::pick_prices;
use crate::sources::dom::PriceCandidates;

pub const HTTP_PRICED_CONFIDENCE: f64 = 0.45;
pub const HTTP_UNPRICED_CONFIDENCE: f64 = 0.3;

/// Fetches `url` directly and extracts a record from the raw HTML.
///
/// Transport failures are logged and produce an empty zero-confidence record.
pub async fn fetch_and_extract(fetcher: &PageFetcher, url: &str) -> ProductRecord {
    match fetcher.get_page(url).await {
        Ok(page) => {
            tracing::debug!(url, status = page.status, bytes = page.html.len(), "HTTP fallback fetched");
            extract_from_html(&page.html, source::HTTP)
        }
        Err(e) => {
            tracing::warn!(url, error = %e, "HTTP fallback failed");
            ProductRecord::empty(source::HTTP)
        }
    }
}

/// Title and regex-found prices from raw HTML, tagged with `source_tag`.
///
/// Empty HTML yields an empty zero-confidence record.
#[must_use]
pub fn extract_from_html(html: &str, source_tag: &str) -> ProductRecord {
    if html.trim().is_empty() {
        return ProductRecord::empty(source_tag);
    }

    let (title, text) = {
        let document = Html::parse_document(html);
        (page_title(&document), visible_text(&document))
    };

    let mut candidates = PriceCandidates::default();
    candidates.extend_from_regex(trim_secondary_sections(html));
    candidates.extend_from_regex(trim_secondary_sections(&text));

    let (sale_price, original_price) = pick_prices(candidates.as_slice());

    let mut record = ProductRecord::empty(source_tag);
    record.confidence = if sale_price.is_some() || original_price.is_some() {
        HTTP_PRICED_CONFIDENCE
    } else {
        HTTP_UNPRICED_CONFIDENCE
    };
    record.currency = infer_currency(candidates.as_slice()).map(str::to_owned);
    record.title = title;
    record.sale_price = sale_price;
    record.original_price = original_price;
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_html_is_a_zero_confidence_record() {
        let record = extract_from_html("  ", source::HTTP);
        assert!(record.is_blank());
        assert!(record.confidence.abs() < f64::EPSILON);
        assert_eq!(record.source, "http");
    }

    #[test]
    fn extracts_title_and_prices() {
        let html = "<html><head><title>Desk Lamp</title></head>\
                    <body><span>€39.99</span><s>€59.99</s></body></html>";
        let record = extract_from_html(html, source::HTTP);
        assert_eq!(record.title.as_deref(), Some("Desk Lamp"));
        assert_eq!(record.sale_price.as_deref(), Some("39.99"));
        assert_eq!(record.original_price.as_deref(), Some("59.99"));
        assert_eq!(record.currency.as_deref(), Some("EUR"));
        assert!((record.confidence - HTTP_PRICED_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn page_without_prices_has_lower_confidence() {
        let html = "<html><head><title>Sign in</title></head><body>Please log in</body></html>";
        let record = extract_from_html(html, source::FREE_PROXY);
        assert_eq!(record.title.as_deref(), Some("Sign in"));
        assert!(!record.has_price());
        assert!((record.confidence - HTTP_UNPRICED_CONFIDENCE).abs() < f64::EPSILON);
        assert_eq!(record.source, "free-proxy");
    }
}
