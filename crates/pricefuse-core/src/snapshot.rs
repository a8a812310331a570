//! Input contract from the page-rendering collaborator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Metadata read from the rendered page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    /// Content of the `<title>` element.
    pub page_title: Option<String>,
    /// `og:title`.
    pub og_title: Option<String>,
    /// `product:price:amount`.
    pub og_price: Option<String>,
    /// `product:price:currency`.
    pub og_currency: Option<String>,
    /// `og:image`.
    pub og_image: Option<String>,
    /// Page looked like a bot-defense or error page.
    pub blocked: bool,
    /// Set when rendering failed; the rest of the snapshot is then empty.
    pub error: Option<String>,
}

/// One fully rendered capture of a product page.
///
/// Produced once per extraction attempt and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub html: String,
    /// Visible text of the page body.
    pub text: String,
    /// Raw bodies of every `<script type="application/ld+json">` element.
    pub json_ld: Vec<String>,
    /// Every price-like substring found in the HTML, in document order.
    pub price_strings: Vec<String>,
    pub metadata: PageMetadata,
    /// Full-page screenshot, when the renderer took one.
    pub screenshot: Option<PathBuf>,
}

impl PageSnapshot {
    /// Snapshot standing in for a page that could not be rendered.
    #[must_use]
    pub fn failed(url: &str, error: &str) -> Self {
        Self {
            url: url.to_owned(),
            metadata: PageMetadata {
                error: Some(error.to_owned()),
                ..PageMetadata::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.metadata.blocked
    }
}
