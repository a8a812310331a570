//! Multi-source product data extraction and fusion.
//!
//! Independent signal extractors (JSON-LD, DOM heuristics, raw HTTP, partner
//! APIs, reader proxy, LLM) each produce a partial [`ProductRecord`]; the
//! [`ExtractionPipeline`] escalates through them and folds the results with
//! [`merge`] until the record is usable.
//!
//! [`ProductRecord`]: pricefuse_core::ProductRecord

pub mod client;
pub mod debug_dump;
pub mod error;
pub(crate) mod html;
pub mod lease;
pub mod llm;
pub mod merge;
pub mod normalize;
pub(crate) mod patterns;
pub mod pipeline;
pub mod pricing;
pub(crate) mod rate_limit;
pub mod renderer;
pub mod settings;
pub mod sources;
pub mod url_title;
pub(crate) mod urls;

pub use client::{FetchedPage, PageFetcher};
pub use error::ExtractError;
pub use lease::{PageLease, PagePool};
pub use llm::{LlmBackend, LlmFields, LlmMetadata, OpenAiClient};
pub use merge::{is_bad_title, merge};
pub use normalize::{canonical_currency, infer_currency, normalize_price};
pub use pipeline::{ExtractionPipeline, StageOutcome};
pub use pricing::pick_prices;
pub use renderer::{HttpRenderer, Renderer};
pub use settings::{ExtractorSettings, HeaderSet, DEFAULT_HEADER_POOL};
pub use sources::partner::{DomainRouter, PartnerExtractor};
pub use sources::structured::extract_from_json_ld;
pub use url_title::title_from_url;
