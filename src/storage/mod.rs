//! Persistence layer.
//!
//! Writes the outcome of a pipeline run to the output directory:
//! `summaries.json` with everything the run produced, and
//! `annotations.md` with the final asset description.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

use crate::extract::ExtractedFields;
use crate::types::{AssetDescriptor, ValuationSummary};

pub const SUMMARY_FILE: &str = "summaries.json";
pub const ANNOTATIONS_FILE: &str = "annotations.md";

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub ocr_text: String,
    pub description: String,
    pub fields: ExtractedFields,
    pub asset: AssetDescriptor,
    pub valuation: ValuationSummary,
    /// Rendered valuation sections; empty when there was no valuation.
    pub valuation_text: String,
    pub sample_block: String,
}

impl RunRecord {
    pub fn new(
        ocr_text: String,
        description: String,
        fields: ExtractedFields,
        asset: AssetDescriptor,
        valuation: ValuationSummary,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            ocr_text,
            description,
            fields,
            asset,
            valuation,
            valuation_text: String::new(),
            sample_block: String::new(),
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))
}

/// Write `summaries.json` into `dir`, creating it if needed.
pub fn save_summary(record: &RunRecord, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(record)
        .context("Failed to serialise run record")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), run_id = %record.run_id, "Summary saved");
    Ok(path)
}

/// Load a previously written `summaries.json`.
/// Returns None if the file doesn't exist.
pub fn load_summary(dir: &Path) -> Result<Option<RunRecord>> {
    let path = dir.join(SUMMARY_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let record = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(record))
}

/// Write `annotations.md` into `dir`, creating it if needed.
pub fn save_annotations(markdown: &str, dir: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join(ANNOTATIONS_FILE);
    fs::write(&path, markdown)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), bytes = markdown.len(), "Annotations saved");
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
