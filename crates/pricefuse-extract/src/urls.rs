use reqwest::Url;

use crate::error::ExtractError;

pub(crate) fn parse_url(url: &str) -> Result<Url, ExtractError> {
    Url::parse(url).map_err(|e| ExtractError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}

/// Lower-cased host of `url` with any leading `www.` removed.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(pricefuse_core::site_profiles::bare_host)
}

/// Resolves `candidate` against the page URL. Only `http`/`https` results
/// are returned, so `data:` URIs and `javascript:` links are dropped.
pub(crate) fn absolutize_url(base_url: &str, candidate: &str) -> Option<String> {
    let candidate = candidate.trim().replace("&amp;", "&");
    if candidate.is_empty() {
        return None;
    }
    let base = Url::parse(base_url).ok()?;
    let resolved = base.join(&candidate).ok()?;
    matches!(resolved.scheme(), "http" | "https").then(|| resolved.to_string())
}

/// First non-empty value of the first query parameter among `names`.
pub(crate) fn query_param(url: &Url, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        url.query_pairs()
            .find(|(key, value)| &**key == *name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_of_strips_www() {
        assert_eq!(
            host_of("https://WWW.Macys.com/shop/product/x?ID=1").as_deref(),
            Some("macys.com")
        );
        assert_eq!(host_of("not a url"), None);
    }

    #[test]
    fn absolutize_handles_protocol_relative_and_root_relative() {
        let page = "https://shop.example.com/p/widget";
        assert_eq!(
            absolutize_url(page, "//cdn.example.com/a.jpg").as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );
        assert_eq!(
            absolutize_url(page, "/img/a.jpg").as_deref(),
            Some("https://shop.example.com/img/a.jpg")
        );
        assert_eq!(absolutize_url(page, "data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn query_param_tries_names_in_order() {
        let url = Url::parse("https://www.macys.com/shop/product/x?id=7&ID=42").unwrap();
        assert_eq!(query_param(&url, &["ID", "id"]).as_deref(), Some("42"));
        let url = Url::parse("https://www.macys.com/shop/product/x?id=7").unwrap();
        assert_eq!(query_param(&url, &["ID", "id"]).as_deref(), Some("7"));
        assert_eq!(query_param(&url, &["sku"]), None);
    }
}
