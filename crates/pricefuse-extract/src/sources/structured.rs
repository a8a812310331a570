//! Publisher-declared schema.org `Product` data from JSON-LD blocks.

use pricefuse_core::{source, ProductRecord};
use serde_json::Value;

use crate::normalize::{canonical_currency, normalize_price_value};
use crate::urls::absolutize_url;

pub const JSON_LD_CONFIDENCE: f64 = 0.9;

/// Returns a record for the first `Product` item found across `blobs`.
///
/// Blocks that fail to parse are skipped individually. Top-level arrays and
/// `@graph` containers are expanded before matching. Images are resolved
/// against `page_url`; one that does not resolve to http(s) is dropped.
#[must_use]
pub fn extract_from_json_ld<S: AsRef<str>>(page_url: &str, blobs: &[S]) -> Option<ProductRecord> {
    for blob in blobs {
        let value: Value = match serde_json::from_str(blob.as_ref()) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        if let Some(record) = candidates(&value)
            .into_iter()
            .find_map(|item| product_from_item(item, page_url)) {
            return Some(record);
        }
    }
    None
}

/// Top-level items in document order, each followed by its `@graph` members.
fn candidates(value: &Value) -> Vec<&Value> {
    let top: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    let mut out = Vec::with_capacity(top.len());
    for item in top {
        out.push(item);
        if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
            out.extend(graph.iter());
        }
    }
    out
}

fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(t)) => t == "Product",
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some("Product")),
        _ => false,
    }
}

/// First present, non-null field among `keys`.
fn first_field<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null() && v.as_str() != Some(""))
}

fn product_from_item(item: &Value, page_url: &str) -> Option<ProductRecord> {
    if !is_product(item) {
        return None;
    }

    let offer = match item.get("offers") {
        Some(Value::Array(offers)) => offers.first(),
        Some(other @ Value::Object(_)) => Some(other),
        _ => None,
    };

    let mut record = ProductRecord::empty(source::JSON_LD);
    record.confidence = JSON_LD_CONFIDENCE;
    record.title = item
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned);

    if let Some(offer) = offer {
        record.currency = first_field(offer, &["priceCurrency", "priceCurrencyCode"])
            .and_then(Value::as_str)
            .and_then(canonical_currency);
        record.sale_price = first_field(offer, &["price", "salePrice", "lowPrice"])
            .and_then(normalize_price_value);
        record.original_price =
            first_field(offer, &["highPrice", "price"]).and_then(normalize_price_value);
    }

    record.image_url = item
        .get("image")
        .and_then(image_url)
        .and_then(|raw| absolutize_url(page_url, &raw));
    Some(record)
}

fn image_url(image: &Value) -> Option<String> {
    let found = match image {
        Value::String(url) => Some(url.as_str()),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::String(url) => Some(url.as_str()),
            other => other.get("url").and_then(Value::as_str),
        }),
        Value::Object(_) => image.get("url").and_then(Value::as_str),
        _ => None,
    };
    found
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}
