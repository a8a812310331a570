//! Escalation controller.
//!
//! One extraction runs these stages strictly in order, folding each partial
//! record into the running result with [`merge`]:
//!
//! 1. snapshot (site profile, JSON-LD, DOM)
//! 2. raw HTTP, when the snapshot was blocked, thin or incomplete
//! 3. domain-specific partner or anonymous-proxy fallback
//! 4. LLM, when configured and the record is still incomplete
//! 5. URL-derived title, when no usable title exists
//!
//! Stages 1-4 share one pipeline deadline on top of their own stage timeouts;
//! when it fires the partial record built so far still gets step 5. Every
//! stage absorbs its own failures and timeouts; [`ExtractionPipeline::extract`]
//! always returns a record.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use pricefuse_core::{source, PageSnapshot, ProductRecord};
use serde::Serialize;
use serde_json::json;

use crate::client::PageFetcher;
use crate::debug_dump::{write_debug_payload, DebugPayload, StageReport};
use crate::error::ExtractError;
use crate::llm::{LlmBackend, LlmFields, LlmMetadata, MAX_PROMPT_TEXT_CHARS};
use crate::merge::{is_bad_title, merge};
use crate::normalize::{infer_currency, normalize_price};
use crate::patterns::find_price_strings;
use crate::renderer::Renderer;
use crate::settings::ExtractorSettings;
use crate::sources::http::fetch_and_extract;
use crate::sources::partner::DomainRouter;
use crate::sources::reader::fetch_reader_text;
use crate::sources::from_snapshot;
use crate::url_title::title_from_url;

/// Below this many HTML bytes the rendered page is not trusted on its own.
pub const MIN_PLAUSIBLE_HTML_BYTES: usize = 2000;
pub const LLM_CONFIDENCE: f64 = 0.3;
pub const URL_TITLE_CONFIDENCE: f64 = 0.5;

/// Page text shorter than this is treated like a blocked page.
const THIN_TEXT_CHARS: usize = 200;
/// Running confidence below which the LLM gets reader text instead.
const LOW_CONFIDENCE: f64 = 0.5;
/// Reader text must be longer than this to replace the page text.
const MIN_READER_CHARS: usize = 500;
const MIN_LLM_CHUNK_CHARS: usize = 500;
const MAX_LLM_PRICE_STRINGS: usize = 20;

/// What a stage did for one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Contributed a record that was folded in.
    Merged,
    /// Ran but found nothing usable.
    Empty,
    /// Preconditions not met; did not run.
    Skipped,
    TimedOut,
    Failed(String),
}

pub struct ExtractionPipeline<R: Renderer> {
    renderer: R,
    fetcher: PageFetcher,
    router: DomainRouter,
    llm: Option<Box<dyn LlmBackend>>,
    settings: Arc<ExtractorSettings>,
}

impl<R: Renderer> ExtractionPipeline<R> {
    /// Pipeline with the built-in partner integrations and no LLM.
    #[must_use]
    pub fn new(renderer: R, fetcher: PageFetcher, settings: Arc<ExtractorSettings>) -> Self {
        let router = DomainRouter::from_settings(&fetcher, &settings);
        Self {
            renderer,
            fetcher,
            router,
            llm: None,
            settings,
        }
    }

    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the shared HTTP client cannot be built.
    pub fn from_settings(renderer: R, settings: Arc<ExtractorSettings>) -> Result<Self, ExtractError> {
        let fetcher = PageFetcher::from_settings(&settings)?;
        Ok(Self::new(renderer, fetcher, settings))
    }

    #[must_use]
    pub fn with_llm(mut self, llm: Box<dyn LlmBackend>) -> Self {
        self.llm = Some(llm);
        self
    }

    #[must_use]
    pub fn with_router(mut self, router: DomainRouter) -> Self {
        self.router = router;
        self
    }

    /// Runs every stage for `url` and returns the best record found.
    ///
    /// `page` is a caller-owned page lent to the renderer for this call only.
    pub async fn extract(&self, url: &str, page: Option<&mut R::Page>) -> ProductRecord {
        tracing::info!(url, "starting product extraction");
        let mut debug = self.settings.debug_extract.then(|| DebugPayload::new(url));

        let mut record = ProductRecord::default();
        let finished = tokio::time::timeout(
            self.settings.pipeline_timeout,
            self.run_stages(url, page, &mut record, &mut debug),
        )
        .await
        .is_ok();
        if !finished {
            tracing::warn!(
                url,
                after_secs = self.settings.pipeline_timeout.as_secs(),
                confidence = record.confidence,
                "pipeline deadline hit; keeping partial record"
            );
            report(&mut debug, StageReport::new("pipeline", StageOutcome::TimedOut));
        }

        if record.title.as_deref().is_none_or(is_bad_title) {
            if let Some(title) = title_from_url(url) {
                tracing::info!(url, title = %title, "title derived from URL");
                if record.is_blank() {
                    record.source = source::URL.to_owned();
                }
                record.title = Some(title);
                record.confidence = record.confidence.max(URL_TITLE_CONFIDENCE);
                report(&mut debug, StageReport::new("url", StageOutcome::Merged).with_record(&record));
            }
        }

        tracing::info!(
            url,
            source = %record.source,
            confidence = record.confidence,
            title = ?record.title,
            sale_price = ?record.sale_price,
            original_price = ?record.original_price,
            "extraction finished"
        );

        if let Some(mut payload) = debug {
            payload.final_product = Some(record.clone());
            match write_debug_payload(&self.settings.debug_dir, &payload).await {
                Ok(path) => tracing::debug!(path = %path.display(), "debug payload written"),
                Err(e) => tracing::warn!(url, error = %e, "failed to write debug payload"),
            }
        }

        record
    }

    async fn render_snapshot(&self, url: &str, page: Option<&mut R::Page>) -> PageSnapshot {
        match self.renderer.render(url, page).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(url, error = %e, "rendering failed");
                PageSnapshot::failed(url, &e.to_string())
            }
        }
    }

    /// Stages 1-4. `record` is updated after every stage so the caller still
    /// holds the best partial result if the pipeline deadline cancels this.
    async fn run_stages(
        &self,
        url: &str,
        page: Option<&mut R::Page>,
        record: &mut ProductRecord,
        debug: &mut Option<DebugPayload>,
    ) {
        let snapshot = self.render_snapshot(url, page).await;
        *record = from_snapshot(&snapshot, &self.settings.site_profiles);
        report(
            debug,
            StageReport::new("snapshot", StageOutcome::Merged)
                .with_record(record)
                .with_detail(json!({
                    "metadata": snapshot.metadata,
                    "price_strings": snapshot.price_strings,
                    "json_ld_count": snapshot.json_ld.len(),
                })),
        );

        // HTTP
        if needs_http_fallback(&snapshot, record) {
            let fetched = bounded(
                self.settings.http_stage_timeout,
                fetch_and_extract(&self.fetcher, url),
            )
            .await;
            let outcome = match fetched {
                Some(fetched) if fetched.is_blank() => StageOutcome::Empty,
                Some(fetched) => {
                    fold(record, &fetched);
                    StageOutcome::Merged
                }
                None => StageOutcome::TimedOut,
            };
            log_stage(url, "http", &outcome, record);
            report(debug, StageReport::new("http", outcome));
        } else {
            report(debug, StageReport::new("http", StageOutcome::Skipped));
        }

        // Domain-specific
        let outcome = match self.router.route(url) {
            None => StageOutcome::Skipped,
            Some(partner) => {
                match bounded(self.settings.domain_stage_timeout, partner.extract(url)).await {
                    Some(Ok(Some(found))) => {
                        fold(record, &found);
                        StageOutcome::Merged
                    }
                    Some(Ok(None)) => StageOutcome::Empty,
                    Some(Err(e)) => StageOutcome::Failed(format!("{}: {e}", partner.name())),
                    None => StageOutcome::TimedOut,
                }
            }
        };
        log_stage(url, "domain", &outcome, record);
        report(debug, StageReport::new("domain", outcome));

        // LLM
        match self.llm.as_deref().filter(|_| !record.is_complete()) {
            Some(llm) => {
                tracing::info!(url, confidence = record.confidence, "record incomplete; invoking LLM");
                let outcome = match bounded(
                    self.settings.llm_stage_timeout,
                    self.llm_record(llm, &snapshot, record),
                )
                .await
                {
                    Some(Some(found)) => {
                        fold(record, &found);
                        StageOutcome::Merged
                    }
                    Some(None) => StageOutcome::Empty,
                    None => StageOutcome::TimedOut,
                };
                log_stage(url, "llm", &outcome, record);
                report(debug, StageReport::new("llm", outcome));
            }
            None => report(debug, StageReport::new("llm", StageOutcome::Skipped)),
        }
    }

    async fn llm_record(
        &self,
        llm: &dyn LlmBackend,
        snapshot: &PageSnapshot,
        current: &ProductRecord,
    ) -> Option<ProductRecord> {
        let total_chars = snapshot.text.chars().count();
        let mut text: String = snapshot.text.chars().take(llm_chunk_len(total_chars)).collect();
        let mut price_strings = snapshot.price_strings.clone();

        let thin = snapshot.is_blocked() || total_chars < THIN_TEXT_CHARS;
        if thin || current.confidence < LOW_CONFIDENCE {
            match fetch_reader_text(&self.fetcher, &self.settings.reader_base_url, &snapshot.url).await {
                Ok(reader) if reader.chars().count() > MIN_READER_CHARS => {
                    tracing::info!(url = %snapshot.url, chars = reader.len(), "using reader text for LLM");
                    price_strings.extend(find_price_strings(&reader));
                    text = reader.chars().take(MAX_PROMPT_TEXT_CHARS).collect();
                }
                Ok(_) => tracing::debug!(url = %snapshot.url, "reader text too short; keeping page text"),
                Err(e) => tracing::warn!(url = %snapshot.url, error = %e, "reader fetch failed"),
            }
        }

        price_strings.truncate(MAX_LLM_PRICE_STRINGS);
        let metadata = LlmMetadata {
            title: current.title.clone(),
            currency: current.currency.clone(),
            price_strings,
            url: snapshot.url.clone(),
            blocked: thin,
            og_price: snapshot.metadata.og_price.clone(),
            og_currency: snapshot.metadata.og_currency.clone(),
        };
        let screenshot = snapshot.screenshot.as_deref().filter(|_| !thin);

        llm.extract(&text, &metadata, screenshot)
            .await
            .map(|fields| record_from_llm(&fields))
    }
}

/// `true` when the rendered page alone is not trusted.
pub(crate) fn needs_http_fallback(snapshot: &PageSnapshot, record: &ProductRecord) -> bool {
    snapshot.is_blocked() || snapshot.html.len() < MIN_PLAUSIBLE_HTML_BYTES || !record.is_complete()
}

/// Characters of page text offered to the LLM: a quarter of the page,
/// clamped to `[500, 4000]`; zero for an empty page.
pub(crate) fn llm_chunk_len(total_chars: usize) -> usize {
    if total_chars == 0 {
        return 0;
    }
    (total_chars / 4).clamp(MIN_LLM_CHUNK_CHARS, MAX_PROMPT_TEXT_CHARS)
}

pub(crate) fn record_from_llm(fields: &LlmFields) -> ProductRecord {
    let mut record = ProductRecord::empty(source::LLM);
    record.title.clone_from(&fields.product_title);
    record.original_price = fields.original_price.as_deref().and_then(normalize_price);
    record.sale_price = fields.sale_price.as_deref().and_then(normalize_price);
    record.currency = infer_currency(fields.original_price.iter().chain(fields.sale_price.iter()))
        .map(str::to_owned);
    record.confidence = LLM_CONFIDENCE;
    record
}

fn fold(record: &mut ProductRecord, found: &ProductRecord) {
    *record = merge(std::mem::take(record), found);
}

/// Runs `stage` under `limit`; `None` on expiry.
async fn bounded<T>(limit: Duration, stage: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(limit, stage).await.ok()
}

fn report(debug: &mut Option<DebugPayload>, stage: StageReport) {
    if let Some(payload) = debug {
        payload.stages.push(stage);
    }
}

fn log_stage(url: &str, stage: &str, outcome: &StageOutcome, record: &ProductRecord) {
    match outcome {
        StageOutcome::TimedOut => tracing::warn!(url, stage, "stage timed out; skipping"),
        StageOutcome::Failed(reason) => tracing::warn!(url, stage, reason = %reason, "stage failed"),
        _ => tracing::debug!(
            url,
            stage,
            outcome = ?outcome,
            source = %record.source,
            confidence = record.confidence,
            "stage finished"
        ),
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
