use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("page rendering failed: {0}")]
    Render(String),

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Builds [`ExtractError::UnexpectedStatus`], or [`ExtractError::RateLimited`]
    /// carrying the `Retry-After` seconds for a 429 so the retry helper backs off.
    pub(crate) fn from_response(response: &reqwest::Response, url: &str) -> Self {
        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return ExtractError::RateLimited {
                domain: crate::urls::host_of(url).unwrap_or_default(),
                retry_after_secs: retry_after_secs(response.headers()).unwrap_or(0),
            };
        }
        ExtractError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_owned(),
        }
    }
}

/// Delay-seconds form of `Retry-After`; HTTP-date values are ignored.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
