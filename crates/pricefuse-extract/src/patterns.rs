//! Shared regexes and text trimming used by the DOM, HTTP and proxy extractors.

use std::sync::LazyLock;

use regex::Regex;

/// A currency symbol or major ISO code followed by a number.
pub(crate) static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:[$€£¥]|USD|EUR|GBP|JPY|CAD|AUD)\s?[0-9.,]+").expect("valid price regex")
});

/// `$X ... $Y ... % off`: two amounts shortly before a percent-off badge.
///
/// The gaps are lazy so the second amount is the next number after the first,
/// not the digits of the percentage itself.
pub(crate) static DISCOUNT_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$?([0-9][\d,.]*)(?:[\s\S]{0,120}?)\$?([0-9][\d,.]*)(?:[\s\S]{0,60}?)%\s*off")
        .expect("valid discount regex")
});

pub(crate) static WAS_NOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Was\s+\$?([0-9][\d,.]*)(?:[^$]{0,40})(?:Now|Today)\s*\$?([0-9][\d,.]*)")
        .expect("valid was/now regex")
});

pub(crate) static REFERENCE_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Reference Price\s*\$?([0-9][\d,.]*)").expect("valid reference regex")
});

pub(crate) static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.,]+").expect("valid number regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Headings that introduce other products' listings.
const SECONDARY_SECTION_MARKERS: [&str; 11] = [
    "best sellers",
    "customers also bought",
    "customers also viewed",
    "related items",
    "recommended for you",
    "people also bought",
    "similar items you might like",
    "sponsored products",
    "other items",
    "more deals",
    "deals our customers love best",
];

/// Markers found this early are navigation chrome, not a secondary section.
const MIN_MARKER_OFFSET: usize = 200;

/// Cuts `content` at the earliest secondary-section marker located past
/// [`MIN_MARKER_OFFSET`] bytes, so prices of other products do not bleed in.
pub(crate) fn trim_secondary_sections(content: &str) -> &str {
    // ASCII lowering keeps byte offsets aligned with `content`.
    let lowered = content.to_ascii_lowercase();
    let cutoff = SECONDARY_SECTION_MARKERS
        .iter()
        .filter_map(|marker| lowered.find(marker))
        .filter(|idx| *idx > MIN_MARKER_OFFSET)
        .min();
    match cutoff {
        Some(idx) => &content[..idx],
        None => content,
    }
}

/// Every price-like substring of `content`, in document order.
pub(crate) fn find_price_strings(content: &str) -> Vec<String> {
    PRICE_RE
        .find_iter(content)
        .map(|m| m.as_str().to_owned())
        .collect()
}

pub(crate) fn collapse_whitespace(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").into_owned()
}
