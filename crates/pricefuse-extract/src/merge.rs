//! Field-by-field fusion of two partial records.

use pricefuse_core::ProductRecord;

/// Titles that describe a block or error page rather than a product.
const BAD_TITLE_MARKERS: [&str; 5] = ["access denied", "denied", "blocked", "error", "forbidden"];

/// `true` if `title` is one of the low-information block-page titles.
#[must_use]
pub fn is_bad_title(title: &str) -> bool {
    let lowered = title.to_lowercase();
    BAD_TITLE_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Folds `secondary` into `primary`.
///
/// Every field `primary` is missing is taken from `secondary`, along with
/// `secondary`'s source tag. A block-page title in `primary` is replaced by
/// `secondary`'s title when it has one. Present, good values in `primary`
/// always win, so the result depends on argument order; confidence does not,
/// and ends up as the maximum of both records.
#[must_use]
pub fn merge(primary: ProductRecord, secondary: &ProductRecord) -> ProductRecord {
    let mut merged = primary;
    let mut adopted = false;

    let title_is_bad = merged.title.as_deref().is_some_and(is_bad_title);
    if (merged.title.is_none() || title_is_bad) && secondary.title.is_some() {
        merged.title.clone_from(&secondary.title);
        adopted = true;
    }
    for (slot, theirs) in [
        (&mut merged.original_price, &secondary.original_price),
        (&mut merged.sale_price, &secondary.sale_price),
        (&mut merged.currency, &secondary.currency),
        (&mut merged.image_url, &secondary.image_url),
    ] {
        if slot.is_none() && theirs.is_some() {
            slot.clone_from(theirs);
            adopted = true;
        }
    }

    if adopted {
        merged.source.clone_from(&secondary.source);
    }
    merged.confidence = merged.confidence.max(secondary.confidence);
    merged
}
