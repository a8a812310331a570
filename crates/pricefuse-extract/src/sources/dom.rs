//! Heuristics over the rendered DOM and its visible text.

use std::str::FromStr;

use pricefuse_core::{source, PageSnapshot, ProductRecord};
use rust_decimal::Decimal;
use scraper::Html;

use crate::html::{attr_of_first, first_heading, page_title};
use crate::normalize::{canonical_currency, infer_currency, normalize_price};
use crate::patterns::{
    collapse_whitespace, find_price_strings, trim_secondary_sections, DISCOUNT_PAIR_RE, NUMBER_RE,
    PRICE_RE, REFERENCE_PRICE_RE, WAS_NOW_RE,
};
use crate::pricing::pick_prices;
use crate::sources::image::extract_product_image;

pub const DOM_PRICED_CONFIDENCE: f64 = 0.6;
pub const DOM_UNPRICED_CONFIDENCE: f64 = 0.4;

/// Ordered, de-duplicated raw price strings.
#[derive(Debug, Default)]
pub(crate) struct PriceCandidates(Vec<String>);

impl PriceCandidates {
    pub(crate) fn push(&mut self, raw: &str) {
        let candidate = raw.trim();
        if candidate.is_empty() || self.0.iter().any(|c| c == candidate) {
            return;
        }
        self.0.push(candidate.to_owned());
    }

    pub(crate) fn extend_from_regex(&mut self, content: &str) {
        for found in find_price_strings(content) {
            self.push(&found);
        }
    }

    pub(crate) fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Builds a record from the rendered page.
///
/// `document` must be the parsed form of `snapshot.html`.
pub(crate) fn extract_from_dom(snapshot: &PageSnapshot, document: &Html) -> ProductRecord {
    let primary_html = trim_secondary_sections(&snapshot.html);
    let primary_text = trim_secondary_sections(&snapshot.text);

    let title = [
        snapshot.metadata.og_title.clone(),
        page_title(document).or_else(|| snapshot.metadata.page_title.clone()),
        first_heading(document),
    ]
    .into_iter()
    .flatten()
    .map(|t| t.trim().to_owned())
    .find(|t| !t.is_empty());

    let mut candidates = PriceCandidates::default();
    for raw in &snapshot.price_strings {
        if primary_html.contains(raw.as_str()) || primary_text.contains(raw.as_str()) {
            candidates.push(raw);
        }
    }
    candidates.extend_from_regex(primary_html);
    candidates.extend_from_regex(primary_text);
    for itemprop in ["price", "sale_price"] {
        if let Some(content) =
            attr_of_first(document, &format!(r#"meta[itemprop="{itemprop}"]"#), "content")
        {
            candidates.push(&content);
        }
    }

    let (mut sale_price, mut original_price) = pick_prices(candidates.as_slice());
    let currency = snapshot
        .metadata
        .og_currency
        .as_deref()
        .and_then(canonical_currency)
        .or_else(|| infer_currency(candidates.as_slice()).map(str::to_owned));

    tracing::debug!(
        url = %snapshot.url,
        candidates = candidates.as_slice().len(),
        sale = ?sale_price,
        original = ?original_price,
        "DOM price candidates"
    );

    for content in [primary_html, primary_text] {
        if let Some((low, high)) = find_discount_pair(content) {
            sale_price.get_or_insert(low);
            original_price.get_or_insert(high);
            if sale_price.is_some() && original_price.is_some() {
                break;
            }
        }
    }

    let collapsed = collapse_whitespace(primary_text);
    if !collapsed.is_empty() {
        if let Some(caps) = WAS_NOW_RE.captures(&collapsed) {
            if let Some(was) = normalize_price(&caps[1]) {
                original_price.get_or_insert(was);
            }
            if let Some(now) = normalize_price(&caps[2]) {
                sale_price.get_or_insert(now);
            }
        }
        if original_price.is_none() {
            original_price = REFERENCE_PRICE_RE
                .captures(&collapsed)
                .and_then(|caps| normalize_price(&caps[1]));
        }
    }

    if let Some(title) = title.as_deref().filter(|_| sale_price.is_none()) {
        let in_title: Vec<String> = PRICE_RE
            .find_iter(title)
            .filter_map(|m| NUMBER_RE.find(m.as_str()))
            .filter_map(|n| normalize_price(n.as_str()))
            .collect();
        if let Some(last) = in_title.last() {
            sale_price = Some(last.clone());
            if in_title.len() > 1 {
                original_price = in_title.first().cloned();
            }
        }
    }

    let image_url = extract_product_image(
        document,
        &snapshot.url,
        snapshot.metadata.og_image.as_deref(),
    );

    let mut record = ProductRecord::empty(source::DOM);
    record.confidence = if sale_price.is_some() || original_price.is_some() {
        DOM_PRICED_CONFIDENCE
    } else {
        DOM_UNPRICED_CONFIDENCE
    };
    record.title = title;
    record.sale_price = sale_price;
    record.original_price = original_price;
    record.currency = currency;
    record.image_url = image_url;
    record
}

/// Two amounts ahead of a `% off` badge, returned as `(lower, higher)`.
fn find_discount_pair(content: &str) -> Option<(String, String)> {
    let caps = DISCOUNT_PAIR_RE.captures(content)?;
    let first = normalize_price(&caps[1])?;
    let second = normalize_price(&caps[2])?;
    let first_value = Decimal::from_str(&first).ok()?;
    let second_value = Decimal::from_str(&second).ok()?;
    if first_value <= second_value {
        Some((first, second))
    } else {
        Some((second, first))
    }
}

#[cfg(test)]
#[path = "dom_test.rs"]
mod tests;
