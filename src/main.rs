//! APPRAISER: collateral valuation pipeline.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! reads the asset description (and optional OCR text), runs the
//! marketplace valuation and writes the results to the output directory.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use appraiser::config::AppConfig;
use appraiser::engine::{JitterDelay, Valuator};
use appraiser::extract::{clean_ocr, extract_fields};
use appraiser::report::{format_sample_block, render_annotations, render_valuation_section};
use appraiser::search::web::SearchPageFetcher;
use appraiser::storage::{self, RunRecord};
use appraiser::types::AssetCategory;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("APPRAISER_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let cfg = AppConfig::load(&config_path)?;

    init_logging();
    info!(config = %config_path, "APPRAISER starting up");

    // -- Inputs ----------------------------------------------------------

    let description = fs::read_to_string(&cfg.pipeline.description_file).with_context(|| {
        format!("Failed to read description file: {}", cfg.pipeline.description_file)
    })?;

    let raw_ocr = match &cfg.pipeline.ocr_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read OCR file: {path}"))?,
        None => String::new(),
    };
    let ocr_text = clean_ocr(&raw_ocr);

    let category = match &cfg.pipeline.category {
        Some(label) => AssetCategory::from_label(label),
        None => AssetCategory::detect(&format!("{raw_ocr}\n{description}")),
    };

    let fields = extract_fields(&description);
    if fields.make.is_empty() && fields.model.is_empty() {
        warn!("Description has no make or model; queries will be unspecific");
    }
    let asset = fields.to_descriptor(category);
    info!(asset = %asset, vin = %fields.vin, "Asset identified");

    // -- Valuation -------------------------------------------------------

    let valuator = Valuator::new(
        Box::new(SearchPageFetcher::new(&cfg.search)?),
        Box::new(JitterDelay::from_config(&cfg.politeness)),
        cfg.valuation.clone(),
    )?;
    let summary = valuator.estimate(&asset).await;

    let currencies = &cfg.valuation.currencies;
    let section = render_valuation_section(&summary, currencies);
    if section.is_none() {
        warn!("No admissible prices found; valuation section omitted");
    }

    // -- Outputs ---------------------------------------------------------

    let out_dir = Path::new(&cfg.pipeline.output_dir);

    let mut record = RunRecord::new(ocr_text, description, fields, asset, summary);
    record.valuation_text = section.clone().unwrap_or_default();
    if section.is_some() {
        record.sample_block = format_sample_block(&record.valuation.samples, currencies);
    }
    storage::save_summary(&record, out_dir)?;

    let annotations = render_annotations(
        &cfg.pipeline.object_label,
        &record.description,
        section.as_deref(),
    );
    storage::save_annotations(&annotations, out_dir)?;

    info!(
        run_id = %record.run_id,
        output_dir = %out_dir.display(),
        summary = %record.valuation,
        "Pipeline complete"
    );
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("appraiser=info"));

    if std::env::var("APPRAISER_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
