//! Candidate normalization: raw price strings to canonical decimals, raw
//! currency tokens to 3-letter codes.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Symbol/token → ISO code, scanned in order; the first hit wins.
const CURRENCY_MAP: [(&str, &str); 10] = [
    ("$", "USD"),
    ("usd", "USD"),
    ("€", "EUR"),
    ("eur", "EUR"),
    ("£", "GBP"),
    ("gbp", "GBP"),
    ("¥", "JPY"),
    ("jpy", "JPY"),
    ("cad", "CAD"),
    ("aud", "AUD"),
];

/// Normalizes a raw price-like string to the canonical `"D.DD"` form.
///
/// Every character other than digits, `,` and `.` is dropped and commas are
/// treated as thousands separators. Returns `None` when nothing numeric is
/// left or the remainder is not a decimal (e.g. `"1.2.3"`). Rounding is
/// half-up to two places.
///
/// ```
/// use pricefuse_extract::normalize_price;
/// assert_eq!(normalize_price("$1,234.5").as_deref(), Some("1234.50"));
/// assert_eq!(normalize_price("free"), None);
/// ```
#[must_use]
pub fn normalize_price(raw: &str) -> Option<String> {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() || digits.matches('.').count() > 1 || !digits.contains(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let padded = match (digits.starts_with('.'), digits.ends_with('.')) {
        (true, _) => format!("0{digits}"),
        (false, true) => format!("{digits}0"),
        (false, false) => digits,
    };

    let value = Decimal::from_str(&padded).ok()?;
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Some(rounded.to_string())
}

/// Normalizes a JSON scalar (string or number) the way [`normalize_price`]
/// treats strings. Other JSON types yield `None`.
#[must_use]
pub fn normalize_price_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => normalize_price(s),
        serde_json::Value::Number(n) => normalize_price(&n.to_string()),
        _ => None,
    }
}

/// Scans candidates in order for a known currency symbol or token
/// (case-insensitive) and returns the code of the first match.
pub fn infer_currency<I, S>(candidates: I) -> Option<&'static str>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates.into_iter().find_map(|candidate| {
        let lowered = candidate.as_ref().to_lowercase();
        if lowered.is_empty() {
            return None;
        }
        CURRENCY_MAP
            .iter()
            .find(|(token, _)| lowered.contains(token))
            .map(|(_, code)| *code)
    })
}

/// Converts a raw currency token into a 3-letter code.
///
/// Tokens that already look like a code (`"usd"`, `"CHF"`) are upper-cased
/// as-is; anything else goes through [`infer_currency`].
#[must_use]
pub fn canonical_currency(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }
    infer_currency([trimmed]).map(str::to_owned)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
