//! Direct HTTP access for the raw-HTTP, partner, reader and proxy stages.

use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;

use crate::error::ExtractError;
use crate::settings::{ExtractorSettings, HeaderSet, DEFAULT_HEADER_POOL};

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A fetched body together with its HTTP status. Non-2xx bodies are kept:
/// block pages still carry titles worth looking at.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub html: String,
}

/// Shared HTTP client plus the read-only header pool.
///
/// Safe to share across concurrent extractions; nothing here is mutated
/// after construction.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    header_pool: Vec<HeaderSet>,
}

impl PageFetcher {
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout: Duration, header_pool: Vec<HeaderSet>) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            header_pool,
        })
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the client cannot be constructed.
    pub fn from_settings(settings: &ExtractorSettings) -> Result<Self, ExtractError> {
        Self::new(settings.http_timeout, settings.header_pool.clone())
    }

    /// Random header set from the pool; the first default set when the pool is empty.
    pub(crate) fn pick_headers(&self) -> &HeaderSet {
        self.header_pool
            .choose(&mut rand::rng())
            .unwrap_or(&DEFAULT_HEADER_POOL[0])
    }

    fn browser_get(&self, client: &Client, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let headers = self.pick_headers();
        client
            .get(url)
            .header(USER_AGENT, headers.user_agent)
            .header(ACCEPT_LANGUAGE, headers.accept_language)
            .header(ACCEPT, accept)
    }

    /// GET `url` with browser-like headers, following redirects.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] on transport failure. Any HTTP status is
    /// returned as a [`FetchedPage`].
    pub async fn get_page(&self, url: &str) -> Result<FetchedPage, ExtractError> {
        let response = self.browser_get(&self.client, url, HTML_ACCEPT).send().await?;
        let status = response.status().as_u16();
        let html = response.text().await?;
        Ok(FetchedPage { status, html })
    }

    /// GET `url` through an HTTP `proxy` with its own short `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the proxy is unusable or the request
    /// fails.
    pub async fn get_page_via_proxy(
        &self,
        url: &str,
        proxy: &str,
        timeout: Duration,
    ) -> Result<FetchedPage, ExtractError> {
        let client = Client::builder()
            .proxy(reqwest::Proxy::all(proxy)?)
            .timeout(timeout)
            .build()?;
        let response = self.browser_get(&client, url, HTML_ACCEPT).send().await?;
        let status = response.status().as_u16();
        let html = response.text().await?;
        Ok(FetchedPage { status, html })
    }

    /// GET `url` expecting a 2xx plain-text body.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Http`] on transport failure.
    /// - [`ExtractError::UnexpectedStatus`] / [`ExtractError::RateLimited`] on non-2xx.
    pub async fn get_text(&self, url: &str) -> Result<String, ExtractError> {
        let response = self.browser_get(&self.client, url, "text/plain").send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::from_response(&response, url));
        }
        Ok(response.text().await?)
    }

    /// GET a JSON API endpoint on behalf of the page at `referer`.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::Http`] on transport failure.
    /// - [`ExtractError::UnexpectedStatus`] / [`ExtractError::RateLimited`] on non-2xx.
    /// - [`ExtractError::Deserialize`] if the body is not JSON.
    pub async fn get_json(
        &self,
        url: &str,
        referer: &str,
        origin: &str,
    ) -> Result<serde_json::Value, ExtractError> {
        let response = self
            .browser_get(&self.client, url, "application/json, text/plain, */*")
            .header(REFERER, referer)
            .header(ORIGIN, origin)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::from_response(&response, url));
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ExtractError::Deserialize {
            context: url.to_owned(),
            source,
        })
    }
}
