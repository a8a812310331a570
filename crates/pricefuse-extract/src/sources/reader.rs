//! Readability proxy that renders a page to plain text on our behalf.

use crate::client::PageFetcher;
use crate::error::ExtractError;

/// Line that separates the reader's preamble (`Title:`, `URL Source:`) from the page body.
const CONTENT_MARKER: &str = "Markdown Content:";

/// Full reader response for `url`, preamble included.
///
/// # Errors
///
/// Propagates transport and non-2xx failures from [`PageFetcher::get_text`].
pub async fn fetch_reader_document(
    fetcher: &PageFetcher,
    reader_base_url: &str,
    url: &str,
) -> Result<String, ExtractError> {
    fetcher.get_text(&format!("{reader_base_url}{url}")).await
}

/// Page body as rendered by the reader, without its preamble.
///
/// # Errors
///
/// Propagates transport and non-2xx failures from [`PageFetcher::get_text`].
pub async fn fetch_reader_text(
    fetcher: &PageFetcher,
    reader_base_url: &str,
    url: &str,
) -> Result<String, ExtractError> {
    let document = fetch_reader_document(fetcher, reader_base_url, url).await?;
    Ok(reader_body(&document))
}

/// Everything after the [`CONTENT_MARKER`] line, or the whole document when
/// the marker is missing or followed by nothing.
pub(crate) fn reader_body(document: &str) -> String {
    let mut lines = document.lines();
    if lines.by_ref().any(|line| line.starts_with(CONTENT_MARKER)) {
        let body = lines.collect::<Vec<_>>().join("\n");
        let body = body.trim();
        if !body.is_empty() {
            return body.to_owned();
        }
    }
    document.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reader_preamble() {
        let doc = "Title: Lamp\nURL Source: https://x.test/lamp\n\nMarkdown Content:\nLamp\n$20.00\n";
        assert_eq!(reader_body(doc), "Lamp\n$20.00");
    }

    #[test]
    fn keeps_document_without_marker() {
        assert_eq!(reader_body("plain text $5"), "plain text $5");
        assert_eq!(reader_body("Markdown Content:\n   \n"), "Markdown Content:\n   \n");
    }
}
