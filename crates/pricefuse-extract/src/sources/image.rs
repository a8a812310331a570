//! Main product image lookup over the rendered DOM.

use scraper::{ElementRef, Html, Selector};

use crate::urls::absolutize_url;

/// Product-image selectors, most specific first.
const IMAGE_SELECTORS: [&str; 14] = [
    r#"meta[property="og:image"]"#,
    r#"meta[name="og:image"]"#,
    r#"img[itemprop="image"]"#,
    "img.product-image",
    "img.product-img",
    "img#product-image",
    r#"img[data-testid*="product-image"]"#,
    r#"img[class*="ProductImage"]"#,
    r#"img[class*="product-image"]"#,
    r#"img[alt*="product"]"#,
    "div.product-media img",
    "div.product-gallery img",
    r#"div[class*="ProductImage"] img"#,
    r#"div[class*="product-image"] img"#,
];

/// Only the first images on the page are scanned in the fallback pass.
const FALLBACK_SCAN_LIMIT: usize = 20;
const MIN_IMAGE_PX: u32 = 200;
const NON_PRODUCT_PATTERNS: [&str; 5] = ["logo", "icon", "banner", "badge", "sprite"];

/// Finds the product image: Open-Graph image, then [`IMAGE_SELECTORS`], then
/// the first reasonably large, non-decorative `<img>`.
pub(crate) fn extract_product_image(
    document: &Html,
    page_url: &str,
    og_image: Option<&str>,
) -> Option<String> {
    if let Some(og) = og_image.map(str::trim).filter(|og| og.starts_with("http")) {
        return Some(og.to_owned());
    }

    for selector in IMAGE_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        let Some(el) = document.select(&sel).next() else {
            continue;
        };
        let found = if el.value().name() == "meta" {
            el.value()
                .attr("content")
                .map(str::trim)
                .filter(|c| c.starts_with("http"))
                .map(str::to_owned)
        } else {
            image_source(&el).and_then(|src| absolutize_url(page_url, src))
        };
        if let Some(url) = found {
            tracing::debug!(selector, url = %url, "product image found via selector");
            return Some(url);
        }
    }

    let Ok(img_sel) = Selector::parse("img") else {
        return None;
    };
    for img in document.select(&img_sel).take(FALLBACK_SCAN_LIMIT) {
        let Some(src) = image_source(&img) else {
            continue;
        };
        if is_small(&img) {
            continue;
        }
        let lowered = src.to_ascii_lowercase();
        if NON_PRODUCT_PATTERNS.iter().any(|p| lowered.contains(p)) {
            continue;
        }
        if let Some(url) = absolutize_url(page_url, src) {
            return Some(url);
        }
    }

    tracing::debug!(url = page_url, "no product image found");
    None
}

fn image_source<'a>(img: &ElementRef<'a>) -> Option<&'a str> {
    ["src", "data-src", "data-lazy-src"]
        .into_iter()
        .filter_map(|attr| img.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
}

/// Declared dimensions below [`MIN_IMAGE_PX`]; undeclared or unparseable
/// sizes are given the benefit of the doubt.
fn is_small(img: &ElementRef<'_>) -> bool {
    let dim = |attr: &str| {
        img.value()
            .attr(attr)
            .and_then(|v| v.trim().parse::<u32>().ok())
    };
    match (dim("width"), dim("height")) {
        (Some(w), Some(h)) => w < MIN_IMAGE_PX || h < MIN_IMAGE_PX,
        _ => false,
    }
}
