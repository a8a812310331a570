//! Optional JSON dump of every stage of one extraction, for diagnostics.

use std::path::{Path, PathBuf};

use pricefuse_core::ProductRecord;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::ExtractError;
use crate::pipeline::StageOutcome;

/// Hex characters of the URL hash kept in the file name.
const KEY_HEX_CHARS: usize = 16;

/// What one stage did, with the record it contributed if any.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    pub outcome: StageOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ProductRecord>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

impl StageReport {
    #[must_use]
    pub fn new(stage: &'static str, outcome: StageOutcome) -> Self {
        Self {
            stage,
            outcome,
            record: None,
            detail: Value::Null,
        }
    }

    #[must_use]
    pub fn with_record(mut self, record: &ProductRecord) -> Self {
        self.record = Some(record.clone());
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugPayload {
    pub url: String,
    pub stages: Vec<StageReport>,
    pub final_product: Option<ProductRecord>,
}

impl DebugPayload {
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            stages: Vec::new(),
            final_product: None,
        }
    }
}

/// Stable file stem for `url`: `extract-` plus a SHA-256 hex prefix.
#[must_use]
pub fn dump_key(url: &str) -> String {
    let hash = Sha256::digest(url.as_bytes());
    let hex: String = hash.iter().map(|b| format!("{b:02x}")).collect();
    format!("extract-{}", &hex[..KEY_HEX_CHARS])
}

/// Writes `payload` as pretty JSON into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`ExtractError::Io`] if the directory or file cannot be written and
/// [`ExtractError::Deserialize`] if the payload cannot be serialized.
pub async fn write_debug_payload(dir: &Path, payload: &DebugPayload) -> Result<PathBuf, ExtractError> {
    let body = serde_json::to_vec_pretty(payload).map_err(|source| ExtractError::Deserialize {
        context: format!("debug payload for {}", payload.url),
        source,
    })?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("{}.json", dump_key(&payload.url)));
    tokio::fs::write(&path, body).await?;
    Ok(path)
}
