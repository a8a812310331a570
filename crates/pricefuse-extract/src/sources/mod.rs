//! Signal extractors. Each turns one raw source into a partial record.

pub mod dom;
pub mod http;
pub mod image;
pub mod partner;
pub mod profile;
pub mod reader;
pub mod structured;

use pricefuse_core::{source, PageSnapshot, ProductRecord, SiteProfiles};
use scraper::Html;

use crate::merge::merge;
use crate::normalize::{canonical_currency, infer_currency};

/// Confidence given to a snapshot record that found something but scored zero.
pub const SNAPSHOT_CONFIDENCE_FLOOR: f64 = 0.5;

/// Snapshot stage: site profile (or an empty anchor), then JSON-LD, then DOM
/// heuristics, folded in that order.
#[must_use]
pub fn from_snapshot(snapshot: &PageSnapshot, profiles: &SiteProfiles) -> ProductRecord {
    let (profile_record, dom_record) = {
        let document = Html::parse_document(&snapshot.html);
        (
            profile::extract_from_profile(&document, &snapshot.url, profiles),
            dom::extract_from_dom(snapshot, &document),
        )
    };

    let mut record = profile_record.unwrap_or_else(|| ProductRecord::empty(source::PROFILE));
    if let Some(json_ld) = structured::extract_from_json_ld(&snapshot.url, &snapshot.json_ld) {
        record = merge(record, &json_ld);
    }
    record = merge(record, &dom_record);

    if record.currency.is_none() {
        record.currency = snapshot
            .metadata
            .og_currency
            .as_deref()
            .and_then(canonical_currency)
            .or_else(|| {
                let og_price = snapshot.metadata.og_price.iter();
                infer_currency(og_price.chain(snapshot.price_strings.iter())).map(str::to_owned)
            });
    }

    if record.confidence == 0.0 && (record.title.is_some() || record.sale_price.is_some()) {
        record.confidence = SNAPSHOT_CONFIDENCE_FLOOR;
    }

    tracing::debug!(
        url = %snapshot.url,
        source = %record.source,
        confidence = record.confidence,
        "snapshot stage complete"
    );
    record
}
