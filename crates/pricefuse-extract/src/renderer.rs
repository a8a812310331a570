//! Page-rendering collaborator.
//!
//! A [`Renderer`] turns a URL into a [`PageSnapshot`]. A headless browser
//! plugs in through the trait; [`HttpRenderer`] is the built-in variant that
//! works from raw HTML only.

use async_trait::async_trait;
use pricefuse_core::{PageMetadata, PageSnapshot};
use scraper::Html;

use crate::client::PageFetcher;
use crate::error::ExtractError;
use crate::html::{json_ld_bodies, meta_property, page_title, visible_text};
use crate::patterns::find_price_strings;

/// Substrings that mark a bot-defense or error page.
const BLOCK_MARKERS: [&str; 4] = ["captcha", "access denied", "blocked", "bot"];

#[async_trait]
pub trait Renderer: Send + Sync {
    /// A stateful page the caller can lend for one render, e.g. an
    /// already-authenticated browser tab.
    type Page: Send;

    /// Renders `url`, on the borrowed `page` when one is given.
    ///
    /// The renderer must not keep `page` past the call.
    async fn render(
        &self,
        url: &str,
        page: Option<&mut Self::Page>,
    ) -> Result<PageSnapshot, ExtractError>;
}

/// Fetches raw HTML over HTTP; no JavaScript runs and no screenshot is taken.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    fetcher: PageFetcher,
}

impl HttpRenderer {
    #[must_use]
    pub fn new(fetcher: PageFetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    type Page = ();

    async fn render(
        &self,
        url: &str,
        _page: Option<&mut Self::Page>,
    ) -> Result<PageSnapshot, ExtractError> {
        let page = self.fetcher.get_page(url).await?;
        tracing::debug!(url, status = page.status, bytes = page.html.len(), "page fetched for rendering");
        Ok(snapshot_from_html(url, &page.html))
    }
}

/// Builds the snapshot a browser would have produced for `html`.
#[must_use]
pub fn snapshot_from_html(url: &str, html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);
    let text = visible_text(&document);
    let blocked = detect_blocked(html);
    if blocked {
        tracing::warn!(url, "page looks blocked");
    }

    PageSnapshot {
        url: url.to_owned(),
        html: html.to_owned(),
        json_ld: json_ld_bodies(&document),
        price_strings: find_price_strings(html),
        metadata: PageMetadata {
            page_title: page_title(&document),
            og_title: meta_property(&document, "og:title"),
            og_price: meta_property(&document, "product:price:amount"),
            og_currency: meta_property(&document, "product:price:currency"),
            og_image: meta_property(&document, "og:image"),
            blocked,
            error: None,
        },
        text,
        screenshot: None,
    }
}

/// `true` if the page carries any bot-defense marker, case-insensitively.
#[must_use]
pub fn detect_blocked(html: &str) -> bool {
    let lowered = html.to_lowercase();
    BLOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_PAGE: &str = r#"<html><head>
        <title>Espresso Machine</title>
        <meta property="og:title" content="Espresso Machine Pro">
        <meta property="product:price:amount" content="249.00">
        <meta property="product:price:currency" content="USD">
        <meta property="og:image" content="https://cdn.example.com/espresso.jpg">
        <script type="application/ld+json">{"@type":"Product","name":"Espresso Machine Pro"}</script>
        <style>.price { color: red }</style>
    </head><body><h1>Espresso Machine Pro</h1><span class="price">$249.00</span><s>$299.00</s></body></html>"#;

    #[test]
    fn snapshot_carries_metadata_and_signals() {
        let snapshot = snapshot_from_html("https://shop.example.com/espresso", PRODUCT_PAGE);
        assert_eq!(snapshot.metadata.page_title.as_deref(), Some("Espresso Machine"));
        assert_eq!(snapshot.metadata.og_title.as_deref(), Some("Espresso Machine Pro"));
        assert_eq!(snapshot.metadata.og_price.as_deref(), Some("249.00"));
        assert_eq!(snapshot.metadata.og_currency.as_deref(), Some("USD"));
        assert_eq!(
            snapshot.metadata.og_image.as_deref(),
            Some("https://cdn.example.com/espresso.jpg")
        );
        assert!(!snapshot.metadata.blocked);
        assert_eq!(snapshot.json_ld.len(), 1);
        assert_eq!(snapshot.price_strings, vec!["$249.00", "$299.00"]);
        assert!(snapshot.text.contains("$249.00"));
        assert!(!snapshot.text.contains("color: red"));
    }

    #[test]
    fn block_markers_are_case_insensitive() {
        assert!(detect_blocked("<h1>Access Denied</h1>"));
        assert!(detect_blocked("Please complete the CAPTCHA"));
        assert!(!detect_blocked("<p>Solid oak table</p>"));
    }
}
