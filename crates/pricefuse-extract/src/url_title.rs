//! Last-resort product title derived from the URL slug.

use std::sync::LazyLock;

use regex::Regex;

use crate::patterns::collapse_whitespace;
use crate::urls::parse_url;

/// Path segments that introduce the product slug on common storefronts.
const PRODUCT_PATH_PREFIXES: [&str; 5] = ["product", "products", "p", "dp", "ip"];

const SMALL_WORDS: [&str; 13] = [
    "and", "or", "the", "a", "an", "in", "on", "at", "to", "for", "of", "with", "by",
];

const FALLBACK_TITLE: &str = "Product";
const MIN_TITLE_CHARS: usize = 3;

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:html?|aspx|php|jsp)$").expect("valid extension regex"));

/// Pack counts, sizes, explicit color/style suffixes.
static NOISE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\b(?:\d+\s?(?:pack|pk|count|ct)|pack\s+of\s+\d+)\b",
        r"\bsize\s+\w+\b",
        r"\b(?:xxs|xs|xxl|xxxl|xl)\b",
        r"\b\d+(?:\.\d+)?\s?(?:fl oz|oz|ml|inch|in|cm|mm|lbs|lb|kg|g)\b",
        r"\b(?:colou?r|style)\s+\w+\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid url-noise regex"))
    .collect()
});

/// Title-cased words from the URL's product slug, or `"Product"` when too
/// little survives. `None` only if `url` does not parse.
#[must_use]
pub fn title_from_url(url: &str) -> Option<String> {
    let parsed = parse_url(url).ok()?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let slug = product_slug(&segments).unwrap_or_default();
    let words = clean_slug(slug);
    let title = title_case(&words);

    if title.chars().count() < MIN_TITLE_CHARS {
        Some(FALLBACK_TITLE.to_owned())
    } else {
        Some(title)
    }
}

/// The segment after a known product prefix, unless that is a bare ID, in
/// which case the descriptive segment before the prefix; otherwise the last
/// segment that reads like words.
fn product_slug<'a>(segments: &[&'a str]) -> Option<&'a str> {
    if let Some(idx) = segments
        .iter()
        .position(|s| PRODUCT_PATH_PREFIXES.contains(&s.to_ascii_lowercase().as_str()))
    {
        if let Some(next) = segments.get(idx + 1).copied().filter(|s| !is_identifier(s)) {
            return Some(next);
        }
        if let Some(prev) = idx.checked_sub(1).and_then(|i| segments.get(i).copied()) {
            return Some(prev);
        }
    }

    segments
        .iter()
        .rev()
        .find(|s| s.contains(['-', '_']) && !is_identifier(s))
        .or_else(|| segments.last())
        .copied()
}

fn clean_slug(slug: &str) -> String {
    let slug = EXTENSION_RE.replace(slug, "");
    let mut cleaned = slug.replace(['-', '_', '+'], " ").to_lowercase();
    for re in NOISE_RES.iter() {
        cleaned = re.replace_all(&cleaned, " ").into_owned();
    }
    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| !is_identifier(token))
        .collect();
    collapse_whitespace(&kept.join(" ")).trim().to_owned()
}

/// SKU-like tokens: long digit runs or long alphanumerics containing a digit.
fn is_identifier(token: &str) -> bool {
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    let alnum = token.chars().all(|c| c.is_ascii_alphanumeric());
    let all_digits = token.chars().all(|c| c.is_ascii_digit());
    (all_digits && token.len() >= 4) || (alnum && has_digit && token.len() >= 6)
}

fn title_case(words: &str) -> String {
    words
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| {
            if i > 0 && SMALL_WORDS.contains(&word) {
                return word.to_owned();
            }
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
