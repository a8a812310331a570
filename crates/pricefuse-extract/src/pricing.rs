//! Price-pair selection under ambiguity.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::normalize::normalize_price;

/// A raw candidate and its normalized value. Only lives inside [`pick_prices`].
#[derive(Debug)]
struct PriceCandidate<'a> {
    raw: &'a str,
    normalized: String,
    value: Decimal,
}

/// Chooses the `(sale, original)` pair that most plausibly represents a
/// discount among `raw_candidates`.
///
/// Candidates are normalized and deduplicated by value, then every ordered
/// pair of distinct values is scored by its discount fraction
/// `(original - sale) / original`. The largest fraction wins; ties keep the
/// first pair in ascending enumeration order. With no scorable pair the lowest
/// value is returned as the sale price, paired with the highest value when one
/// exists.
#[must_use]
pub fn pick_prices<S: AsRef<str>>(raw_candidates: &[S]) -> (Option<String>, Option<String>) {
    let mut candidates: Vec<PriceCandidate<'_>> = Vec::new();
    for raw in raw_candidates {
        let raw = raw.as_ref();
        let Some(normalized) = normalize_price(raw) else {
            continue;
        };
        if candidates.iter().any(|c| c.normalized == normalized) {
            continue;
        }
        let Ok(value) = Decimal::from_str(&normalized) else {
            continue;
        };
        candidates.push(PriceCandidate {
            raw,
            normalized,
            value,
        });
    }

    // Stable sort keeps first-seen order among equal values.
    candidates.sort_by(|a, b| a.value.cmp(&b.value));

    let Some(lowest) = candidates.first() else {
        return (None, None);
    };

    let mut best: Option<(usize, usize, Decimal)> = None;
    for (i, sale) in candidates.iter().enumerate() {
        if sale.value <= Decimal::ZERO {
            continue;
        }
        for (j, original) in candidates.iter().enumerate().skip(i + 1) {
            if original.value <= Decimal::ZERO || sale.value >= original.value {
                continue;
            }
            let discount = (original.value - sale.value) / original.value;
            if best.is_none_or(|(_, _, d)| discount > d) {
                best = Some((i, j, discount));
            }
        }
    }

    if let Some((i, j, discount)) = best {
        tracing::trace!(
            sale = candidates[i].raw,
            original = candidates[j].raw,
            %discount,
            "price pair selected"
        );
        return (
            Some(candidates[i].normalized.clone()),
            Some(candidates[j].normalized.clone()),
        );
    }

    let highest = candidates
        .last()
        .filter(|h| h.value != lowest.value)
        .map(|h| h.normalized.clone());
    (Some(lowest.normalized.clone()), highest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(sale: Option<&str>, original: Option<&str>) -> (Option<String>, Option<String>) {
        (sale.map(str::to_owned), original.map(str::to_owned))
    }

    #[test]
    fn empty_input_yields_nothing() {
        let empty: [&str; 0] = [];
        assert_eq!(pick_prices(&empty), (None, None));
        assert_eq!(pick_prices(&["free", "n/a"]), (None, None));
    }

    #[test]
    fn single_value_is_sale_only() {
        assert_eq!(pick_prices(&["$19.99"]), pair(Some("19.99"), None));
    }

    #[test]
    fn duplicates_collapse_to_one_value() {
        assert_eq!(
            pick_prices(&["$19.99", "19.99", "USD 19.99"]),
            pair(Some("19.99"), None)
        );
    }

    #[test]
    fn two_values_form_sale_and_original() {
        assert_eq!(
            pick_prices(&["$29.99", "$19.99"]),
            pair(Some("19.99"), Some("29.99"))
        );
    }

    #[test]
    fn largest_discount_fraction_wins() {
        // 9.99 → 29.99 is a 66.7% discount, beating 19.99 → 29.99 (33.3%).
        assert_eq!(
            pick_prices(&["$29.99", "$19.99", "$9.99 shipping"]),
            pair(Some("9.99"), Some("29.99"))
        );
    }

    #[test]
    fn zero_is_never_a_sale_price_in_a_pair() {
        assert_eq!(
            pick_prices(&["$0", "$3", "$5"]),
            pair(Some("3.00"), Some("5.00"))
        );
    }

    #[test]
    fn zero_prices_fall_back_to_lowest_and_highest() {
        assert_eq!(
            pick_prices(&["$0.00", "$5.00"]),
            pair(Some("0.00"), Some("5.00"))
        );
    }

    #[test]
    fn unparseable_candidates_are_ignored() {
        assert_eq!(
            pick_prices(&["1.2.3", "$50", "sold out", "$35"]),
            pair(Some("35.00"), Some("50.00"))
        );
    }
}
