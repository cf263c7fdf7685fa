//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section falls back to the built-in defaults, so a partial (or
//! empty) file is valid. The valuation policy is validated after parsing.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::types::{AppraiserError, AssetCategory};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub valuation: ValuationPolicy,
    pub search: SearchConfig,
    pub politeness: PolitenessConfig,
    pub pipeline: PipelineConfig,
}

// ---------------------------------------------------------------------------
// Valuation policy
// ---------------------------------------------------------------------------

/// Code and symbol that mark amounts in one currency.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CurrencyMarkers {
    pub code: String,
    pub symbol: String,
}

impl CurrencyMarkers {
    pub fn new(code: &str, symbol: &str) -> Self {
        Self {
            code: code.to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// Whether either marker occurs in `text`.
    pub fn appears_in(&self, text: &str) -> bool {
        text.contains(&self.code) || text.contains(&self.symbol)
    }
}

/// The reference currency, the alternate one, and the fixed rate between them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CurrencyPair {
    pub reference: CurrencyMarkers,
    pub alternate: CurrencyMarkers,
    /// Alternate-currency units per reference unit.
    pub rate: f64,
}

impl Default for CurrencyPair {
    fn default() -> Self {
        Self {
            reference: CurrencyMarkers::new("EUR", "€"),
            alternate: CurrencyMarkers::new("HUF", "Ft"),
            rate: 390.0,
        }
    }
}

impl CurrencyPair {
    /// Alternate amount → reference units, rounded to the nearest unit.
    pub fn to_reference(&self, alternate_amount: u64) -> u64 {
        (alternate_amount as f64 / self.rate).round() as u64
    }

    /// Reference amount → alternate units, truncated.
    pub fn to_alternate(&self, reference_amount: u64) -> u64 {
        (reference_amount as f64 * self.rate) as u64
    }
}

/// Inclusive price range an observation must fall in to be admitted.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PriceBand {
    pub min: u64,
    pub max: u64,
}

impl Default for PriceBand {
    fn default() -> Self {
        Self {
            min: 5_000,
            max: 200_000,
        }
    }
}

impl PriceBand {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: u64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Tunables for price extraction and aggregation.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ValuationPolicy {
    pub currencies: CurrencyPair,
    /// Raw amounts below this (in source units) are never prices.
    pub noise_floor: u64,
    /// Admissible band for categories without an override.
    pub band: PriceBand,
    /// Per-category overrides keyed by `car`, `truck`, `train`, `machine`.
    pub category_bands: HashMap<String, PriceBand>,
    pub sample_cap: usize,
    /// Neighbouring fragments on each side included in a context string.
    pub context_radius: usize,
    pub context_chars: usize,
}

impl Default for ValuationPolicy {
    fn default() -> Self {
        Self {
            currencies: CurrencyPair::default(),
            noise_floor: 1_000,
            band: PriceBand::default(),
            category_bands: HashMap::new(),
            sample_cap: 5,
            context_radius: 2,
            context_chars: 200,
        }
    }
}

impl ValuationPolicy {
    /// The admissible band for a given asset category.
    pub fn band_for(&self, category: AssetCategory) -> PriceBand {
        self.category_bands
            .get(category.key())
            .copied()
            .unwrap_or(self.band)
    }

    pub fn validate(&self) -> Result<(), AppraiserError> {
        let rate = self.currencies.rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(AppraiserError::Policy(format!(
                "conversion rate must be positive, got {rate}"
            )));
        }
        let pair = &self.currencies;
        for marker in [
            &pair.reference.code,
            &pair.reference.symbol,
            &pair.alternate.code,
            &pair.alternate.symbol,
        ] {
            if marker.trim().is_empty() {
                return Err(AppraiserError::Policy("currency markers must not be empty".into()));
            }
        }
        if self.sample_cap == 0 {
            return Err(AppraiserError::Policy("sample_cap must be at least 1".into()));
        }
        if self.context_chars == 0 {
            return Err(AppraiserError::Policy("context_chars must be at least 1".into()));
        }
        if self.band.min > self.band.max {
            return Err(AppraiserError::Policy(format!(
                "band min {} exceeds max {}",
                self.band.min, self.band.max
            )));
        }
        for (key, band) in &self.category_bands {
            if !matches!(key.as_str(), "car" | "truck" | "train" | "machine") {
                return Err(AppraiserError::Config(format!(
                    "unknown category in category_bands: {key}"
                )));
            }
            if band.min > band.max {
                return Err(AppraiserError::Policy(format!(
                    "{key} band min {} exceeds max {}",
                    band.min, band.max
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Prefix the URL-encoded query is appended to.
    pub endpoint: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.google.com/search?q=".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/123.0 Safari/537.36"
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolitenessConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1_000,
            max_delay_ms: 2_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PipelineConfig {
    /// Structured markdown description of the asset.
    pub description_file: String,
    /// Raw OCR text, cleaned and used for category detection.
    pub ocr_file: Option<String>,
    /// Forces the asset category instead of detecting it.
    pub category: Option<String>,
    pub output_dir: String,
    pub object_label: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            description_file: "inputs/description.md".to_string(),
            ocr_file: None,
            category: None,
            output_dir: "outputs".to_string(),
            object_label: "Collateral_Object_001".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)
            .context("Failed to parse configuration")?;
        config.valuation.validate()?;
        if config.politeness.min_delay_ms > config.politeness.max_delay_ms {
            return Err(AppraiserError::Config(format!(
                "politeness min_delay_ms {} exceeds max_delay_ms {}",
                config.politeness.min_delay_ms, config.politeness.max_delay_ms
            ))
            .into());
        }
        Ok(config)
    }
}
