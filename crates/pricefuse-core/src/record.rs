use serde::{Deserialize, Serialize};

/// Source tags identifying which extractor produced a [`ProductRecord`].
pub mod source {
    pub const PROFILE: &str = "profile";
    pub const JSON_LD: &str = "json-ld";
    pub const DOM: &str = "dom";
    pub const HTTP: &str = "http";
    pub const LLM: &str = "llm";
    pub const URL: &str = "url";
    /// Generic proxy-fetched page for domains without a dedicated integration.
    pub const FREE_PROXY: &str = "free-proxy";
    /// Nothing has contributed yet.
    pub const NONE: &str = "none";
}

/// Normalized extraction result for one product URL.
///
/// Price fields hold canonical decimal strings (`"1234.50"`), `currency` holds
/// a three-letter uppercase code, and `image_url` is absolute. A field is
/// either `None` or canonical; extractors never store empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: Option<String>,
    pub original_price: Option<String>,
    pub sale_price: Option<String>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    /// Trust in this record, in `[0, 1]`.
    pub confidence: f64,
    /// Extractor tag, e.g. `"json-ld"`, `"dom"`, `"macys-api"`.
    pub source: String,
}

impl ProductRecord {
    /// A record with no fields set and zero confidence.
    #[must_use]
    pub fn empty(source: &str) -> Self {
        Self {
            title: None,
            original_price: None,
            sale_price: None,
            currency: None,
            image_url: None,
            confidence: 0.0,
            source: source.to_owned(),
        }
    }

    /// `true` if either the sale or the original price is known.
    #[must_use]
    pub fn has_price(&self) -> bool {
        self.sale_price.is_some() || self.original_price.is_some()
    }

    /// `true` once the record carries a title and at least one price, which is
    /// the threshold every escalation decision is measured against.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.title.is_some() && self.has_price()
    }

    /// `true` if no field carries a value.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.title.is_none()
            && !self.has_price()
            && self.currency.is_none()
            && self.image_url.is_none()
    }
}

impl Default for ProductRecord {
    fn default() -> Self {
        Self::empty(source::NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_has_no_fields() {
        let record = ProductRecord::empty(source::DOM);
        assert!(record.is_blank());
        assert!(!record.is_complete());
        assert_eq!(record.source, "dom");
        assert!(record.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn complete_requires_title_and_one_price() {
        let mut record = ProductRecord::empty(source::DOM);
        record.title = Some("Wireless Mouse".to_owned());
        assert!(!record.is_complete());
        record.original_price = Some("29.99".to_owned());
        assert!(record.is_complete());
    }

    #[test]
    fn record_serializes_with_null_fields() {
        let record = ProductRecord::empty(source::HTTP);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["title"].is_null());
        assert_eq!(json["source"], "http");
    }
}
