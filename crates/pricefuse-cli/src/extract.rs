use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::{json, Value};

use pricefuse_core::{load_site_profiles, AppConfig, ProductRecord, SiteProfiles};
use pricefuse_extract::{
    infer_currency, normalize_price, ExtractionPipeline, ExtractorSettings, HttpRenderer,
    OpenAiClient, PageFetcher,
};

/// Runs every URL through the pipeline, at most
/// `config.max_concurrent_extractions` at a time. Output order matches input order.
pub(crate) async fn run_extract(
    config: &AppConfig,
    urls: Vec<String>,
) -> anyhow::Result<Vec<ProductRecord>> {
    let settings = Arc::new(ExtractorSettings::from_config(config, site_profiles(config)));
    let fetcher = PageFetcher::from_settings(&settings)?;

    let mut pipeline = ExtractionPipeline::from_settings(HttpRenderer::new(fetcher), Arc::clone(&settings))?;
    if let Some(llm) = OpenAiClient::from_config(config)? {
        tracing::info!(model = %config.llm_model, "LLM stage enabled");
        pipeline = pipeline.with_llm(Box::new(llm));
    }

    let max_concurrent = config.max_concurrent_extractions.max(1);
    tracing::info!(urls = urls.len(), max_concurrent, "starting extraction");

    let pipeline = &pipeline;
    let records: Vec<ProductRecord> = stream::iter(urls)
        .map(|url| async move { pipeline.extract(&url, None).await })
        .buffered(max_concurrent)
        .collect()
        .await;

    let priced = records.iter().filter(|r| r.has_price()).count();
    tracing::info!(total = records.len(), priced, "extraction finished");
    Ok(records)
}

fn site_profiles(config: &AppConfig) -> SiteProfiles {
    match load_site_profiles(&config.site_profiles_path) {
        Ok(profiles) => {
            tracing::info!(
                path = %config.site_profiles_path.display(),
                count = profiles.len(),
                "loaded site profiles"
            );
            profiles
        }
        Err(e) if e.is_missing_file() => {
            tracing::info!(
                path = %config.site_profiles_path.display(),
                "no site profiles file; profile stage disabled"
            );
            SiteProfiles::default()
        }
        Err(e) => {
            tracing::warn!(
                path = %config.site_profiles_path.display(),
                error = %e,
                "ignoring invalid site profiles"
            );
            SiteProfiles::default()
        }
    }
}

/// One JSON object per raw string: the canonical amount (or `null`) and the
/// currency its symbol or code implies.
pub(crate) fn normalize_all(raw: &[String]) -> Vec<Value> {
    raw.iter()
        .map(|r| {
            json!({
                "raw": r,
                "price": normalize_price(r),
                "currency": infer_currency([r.as_str()]),
            })
        })
        .collect()
}
