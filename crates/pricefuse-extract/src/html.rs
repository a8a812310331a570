//! DOM helpers over `scraper::Html`.
//!
//! `Html` is not `Send`; callers parse, query and drop it without holding it
//! across an `.await`.

use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose text never renders.
const INVISIBLE_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Visible text of `document`, one space between text nodes.
pub(crate) fn visible_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }
    parts.join(" ")
}

/// Parses `html` and returns its visible text.
#[cfg(test)]
pub(crate) fn strip_html(html: &str) -> String {
    visible_text(&Html::parse_document(html))
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_element_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

pub(crate) fn page_title(document: &Html) -> Option<String> {
    first_element_text(document, "title")
}

pub(crate) fn first_heading(document: &Html) -> Option<String> {
    first_element_text(document, "h1")
}

/// `content` of the first element matching `selector`, trimmed and non-empty.
pub(crate) fn attr_of_first(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// `<meta property=…>` content, with a `name=` fallback for sloppy markup.
pub(crate) fn meta_property(document: &Html, property: &str) -> Option<String> {
    attr_of_first(document, &format!(r#"meta[property="{property}"]"#), "content")
        .or_else(|| attr_of_first(document, &format!(r#"meta[name="{property}"]"#), "content"))
}

/// Raw bodies of every `<script type="application/ld+json">`.
pub(crate) fn json_ld_bodies(document: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return Vec::new();
    };
    document
        .select(&sel)
        .map(|el| el.text().collect::<String>())
        .map(|body| body.trim().to_owned())
        .filter(|body| !body.is_empty())
        .collect()
}

/// Tries `selectors` in order and returns the first match's `content`
/// attribute or, failing that, its trimmed text. Invalid selectors are skipped.
pub(crate) fn query_first<S: AsRef<str>>(document: &Html, selectors: &[S]) -> Option<String> {
    for selector in selectors {
        let Ok(sel) = Selector::parse(selector.as_ref()) else {
            tracing::debug!(selector = selector.as_ref(), "skipping invalid CSS selector");
            continue;
        };
        let Some(el) = document.select(&sel).next() else {
            continue;
        };
        if let Some(content) = el.value().attr("content") {
            return Some(content.trim().to_owned());
        }
        let text = element_text(&el);
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title> Widget | Shop </title>
        <meta property="og:title" content="Widget Deluxe">
        <meta name="og:image" content="https://cdn.example.com/w.jpg">
        <script type="application/ld+json">{"@type":"Product","name":"Widget"}</script>
        <style>.price { color: red }</style>
    </head><body>
        <h1>Widget <span>Deluxe</span></h1>
        <script>var price = "$1.00";</script>
        <p class="price">$19.99</p>
        <noscript>Enable JS</noscript>
    </body></html>"#;

    #[test]
    fn visible_text_skips_scripts_and_styles() {
        let text = strip_html(PAGE);
        assert!(text.contains("Widget Deluxe"));
        assert!(text.contains("$19.99"));
        assert!(!text.contains("$1.00"));
        assert!(!text.contains("color"));
        assert!(!text.contains("Enable JS"));
    }

    #[test]
    fn title_heading_and_meta() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(page_title(&doc).as_deref(), Some("Widget | Shop"));
        assert_eq!(first_heading(&doc).as_deref(), Some("Widget Deluxe"));
        assert_eq!(meta_property(&doc, "og:title").as_deref(), Some("Widget Deluxe"));
        assert_eq!(
            meta_property(&doc, "og:image").as_deref(),
            Some("https://cdn.example.com/w.jpg")
        );
    }

    #[test]
    fn json_ld_bodies_are_collected() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(
            json_ld_bodies(&doc),
            vec![r#"{"@type":"Product","name":"Widget"}"#.to_owned()]
        );
    }

    #[test]
    fn query_first_prefers_content_then_text() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(
            query_first(&doc, &["div.missing", "meta[property=\"og:title\"]"]).as_deref(),
            Some("Widget Deluxe")
        );
        assert_eq!(query_first(&doc, &["p.price"]).as_deref(), Some("$19.99"));
        assert_eq!(query_first(&doc, &["[[invalid", "p.price"]).as_deref(), Some("$19.99"));
        assert_eq!(query_first(&doc, &["div.missing"]), None);
    }
}
