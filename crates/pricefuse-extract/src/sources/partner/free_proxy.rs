//! Generic fallback: fetch the page through a random anonymous HTTPS proxy
//! taken from a public proxy directory.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use pricefuse_core::{source, ProductRecord};
use rand::seq::IndexedRandom;
use scraper::{Html, Selector};

use super::PartnerExtractor;
use crate::client::PageFetcher;
use crate::error::ExtractError;
use crate::settings::ExtractorSettings;
use crate::sources::http::extract_from_html;

static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid row selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("valid cell selector"));

/// Column holding the directory's "Https" flag.
const HTTPS_COLUMN: usize = 6;

pub struct FreeProxyExtractor {
    fetcher: PageFetcher,
    proxy_list_url: String,
    fetch_timeout: Duration,
}

impl FreeProxyExtractor {
    #[must_use]
    pub fn new(fetcher: PageFetcher, settings: &ExtractorSettings) -> Self {
        Self {
            fetcher,
            proxy_list_url: settings.proxy_list_url.clone(),
            fetch_timeout: settings.proxy_fetch_timeout,
        }
    }

    async fn fetch_proxies(&self) -> Result<Vec<String>, ExtractError> {
        let page = self.fetcher.get_page(&self.proxy_list_url).await?;
        if page.status != 200 {
            return Err(ExtractError::UnexpectedStatus {
                status: page.status,
                url: self.proxy_list_url.clone(),
            });
        }
        Ok(parse_proxy_table(&page.html))
    }
}

#[async_trait]
impl PartnerExtractor for FreeProxyExtractor {
    fn name(&self) -> &'static str {
        "free-proxy"
    }

    fn handles(&self, _host: &str) -> bool {
        true
    }

    async fn extract(&self, url: &str) -> Result<Option<ProductRecord>, ExtractError> {
        let proxies = self.fetch_proxies().await?;
        let Some(proxy) = proxies.choose(&mut rand::rng()) else {
            tracing::warn!(list = %self.proxy_list_url, "proxy directory listed no HTTPS proxies");
            return Ok(None);
        };

        tracing::debug!(url, proxy, "fetching through anonymous proxy");
        let page = self
            .fetcher
            .get_page_via_proxy(url, proxy, self.fetch_timeout)
            .await?;
        if page.status != 200 {
            tracing::warn!(url, proxy, status = page.status, "proxied fetch returned non-200");
            return Ok(None);
        }

        Ok(Some(extract_from_html(&page.html, source::FREE_PROXY)))
    }
}

/// `http://ip:port` for every HTTPS-capable row of the directory table.
pub(crate) fn parse_proxy_table(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ROW_SELECTOR)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<String> = row
                .select(&CELL_SELECTOR)
                .map(|cell| cell.text().collect::<String>().trim().to_owned())
                .collect();
            if cells.len() <= HTTPS_COLUMN || cells[HTTPS_COLUMN] != "yes" {
                return None;
            }
            Some(format!("http://{}:{}", cells[0], cells[1]))
        })
        .collect()
}
