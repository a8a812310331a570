//! Macy's: product API lookup by `ID`, with a reader-proxy fallback.

use std::sync::LazyLock;

use async_trait::async_trait;
use pricefuse_core::ProductRecord;
use regex::Regex;
use serde_json::Value;

use super::PartnerExtractor;
use crate::client::PageFetcher;
use crate::error::ExtractError;
use crate::normalize::{canonical_currency, infer_currency, normalize_price, normalize_price_value};
use crate::patterns::PRICE_RE;
use crate::settings::ExtractorSettings;
use crate::sources::reader::fetch_reader_document;
use crate::urls::{parse_url, query_param};

pub const API_SOURCE: &str = "macys-api";
pub const PROXY_SOURCE: &str = "macys-proxy";
pub const API_CONFIDENCE: f64 = 0.85;
pub const PROXY_CONFIDENCE: f64 = 0.75;
pub const PROXY_UNPRICED_CONFIDENCE: f64 = 0.5;

const SALE_KEY_TOKENS: [&str; 5] = ["sale", "current", "offer", "promo", "now"];
const ORIGINAL_KEY_TOKENS: [&str; 4] = ["regular", "original", "list", "was"];

/// Reader output past this heading lists other products.
const RELATED_PRODUCTS_MARKER: &str = "Shop similar styles";

static READER_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Title:\s*(.+)").expect("valid reader title regex"));

pub struct MacysExtractor {
    fetcher: PageFetcher,
    api_base: String,
    image_base: String,
    reader_base_url: String,
}

impl MacysExtractor {
    #[must_use]
    pub fn new(fetcher: PageFetcher, settings: &ExtractorSettings) -> Self {
        Self {
            fetcher,
            api_base: settings.macys_api_base.trim_end_matches('/').to_owned(),
            image_base: settings.macys_image_base.clone(),
            reader_base_url: settings.reader_base_url.clone(),
        }
    }

    async fn from_api(&self, url: &str, product_id: &str) -> Result<Option<ProductRecord>, ExtractError> {
        let api_url = format!("{}/xapi/digital/v1/product/{product_id}", self.api_base);
        let payload = self.fetcher.get_json(&api_url, url, &self.api_base).await?;
        Ok(record_from_api(&payload, &self.image_base))
    }

    async fn from_reader(&self, url: &str) -> Result<Option<ProductRecord>, ExtractError> {
        let document = fetch_reader_document(&self.fetcher, &self.reader_base_url, url).await?;
        Ok(record_from_reader(&document))
    }
}

#[async_trait]
impl PartnerExtractor for MacysExtractor {
    fn name(&self) -> &'static str {
        "macys"
    }

    fn handles(&self, host: &str) -> bool {
        host == "macys.com" || host.ends_with(".macys.com")
    }

    async fn extract(&self, url: &str) -> Result<Option<ProductRecord>, ExtractError> {
        let parsed = parse_url(url)?;
        match query_param(&parsed, &["ID", "id"]) {
            Some(product_id) => match self.from_api(url, &product_id).await {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => tracing::warn!(url, product_id, "Macy's API returned no usable product data"),
                Err(e) => tracing::warn!(url, product_id, error = %e, "Macy's API request failed"),
            },
            None => tracing::warn!(url, "no product ID in Macy's URL"),
        }

        self.from_reader(url).await
    }
}

/// Maps the product API payload onto a record; `None` when it carries neither
/// a title nor a price.
pub(crate) fn record_from_api(payload: &Value, image_base: &str) -> Option<ProductRecord> {
    let product = payload.get("product")?;
    let text_at = |pointer: &str| {
        product
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };
    let title = text_at("/details/productName")
        .or_else(|| text_at("/summary/name"))
        .or_else(|| text_at("/name"));

    let (sale_price, original_price, currency) = product
        .get("price")
        .map(parse_price_block)
        .unwrap_or_default();

    if title.is_none() && sale_price.is_none() && original_price.is_none() {
        return None;
    }

    let image_url = ["media", "imagery"]
        .iter()
        .filter_map(|key| product.get(*key))
        .find_map(|media| media.get("images").and_then(Value::as_array))
        .and_then(|images| images.first())
        .and_then(|first| {
            first
                .get("filePath")
                .or_else(|| first.get("url"))
                .and_then(Value::as_str)
        })
        .map(|path| {
            if path.starts_with("http") {
                path.to_owned()
            } else {
                format!("{image_base}{}", path.trim_start_matches('/'))
            }
        });

    Some(ProductRecord {
        title,
        original_price,
        sale_price,
        currency: currency.or_else(|| Some("USD".to_owned())),
        image_url,
        confidence: API_CONFIDENCE,
        source: API_SOURCE.to_owned(),
    })
}

/// Reads `(sale, original, currency)` from the API's price object, whose
/// keys follow Macy's own naming (`salePrice`, `regularPrice`, `nowPrice`, ...).
/// The first matching key in payload order wins for each field.
fn parse_price_block(price: &Value) -> (Option<String>, Option<String>, Option<String>) {
    let mut sale = None;
    let mut original = None;
    let mut currency = None;

    let Some(entries) = price.as_object() else {
        return (sale, original, currency);
    };

    for (key, entry) in entries {
        let (value, entry_currency) = match entry {
            Value::Object(fields) => {
                let value = fields
                    .get("value")
                    .filter(|v| !v.is_null())
                    .and_then(normalize_price_value)
                    .or_else(|| {
                        fields
                            .get("formatted")
                            .and_then(Value::as_str)
                            .and_then(normalize_price)
                    });
                let code = fields
                    .get("currencyCode")
                    .or_else(|| fields.get("currency"))
                    .and_then(Value::as_str)
                    .and_then(canonical_currency);
                (value, code)
            }
            Value::Number(_) | Value::String(_) => (normalize_price_value(entry), None),
            _ => (None, None),
        };
        let Some(value) = value else {
            continue;
        };

        let lowered = key.to_ascii_lowercase();
        if sale.is_none() && SALE_KEY_TOKENS.iter().any(|t| lowered.contains(t)) {
            sale = Some(value.clone());
        }
        if original.is_none() && ORIGINAL_KEY_TOKENS.iter().any(|t| lowered.contains(t)) {
            original = Some(value);
        }
        if currency.is_none() {
            currency = entry_currency;
        }
    }

    (sale, original, currency)
}

/// Parses reader output for a Macy's product page.
pub(crate) fn record_from_reader(document: &str) -> Option<ProductRecord> {
    if document.trim().is_empty() {
        return None;
    }

    let main_section = document
        .split_once(RELATED_PRODUCTS_MARKER)
        .map_or(document, |(main, _)| main);

    let title = READER_TITLE_RE
        .captures(document)
        .map(|caps| caps[1].replace(" - Macy's", "").trim().to_owned())
        .filter(|t| !t.is_empty());

    let raw_prices: Vec<&str> = PRICE_RE.find_iter(main_section).map(|m| m.as_str()).collect();
    let prices: Vec<String> = raw_prices.iter().filter_map(|raw| normalize_price(raw)).collect();

    let mut record = ProductRecord::empty(PROXY_SOURCE);
    record.title = title;

    let Some(sale) = prices.first().cloned() else {
        tracing::warn!("Macy's reader text contained no recognizable prices");
        record.confidence = PROXY_UNPRICED_CONFIDENCE;
        return Some(record);
    };

    record.original_price = prices.iter().skip(1).find(|p| **p != sale).cloned();
    record.sale_price = Some(sale);
    record.currency = Some(infer_currency(&raw_prices).unwrap_or("USD").to_owned());
    record.confidence = PROXY_CONFIDENCE;
    Some(record)
}

#[cfg(test)]
#[path = "macys_test.rs"]
mod tests;
