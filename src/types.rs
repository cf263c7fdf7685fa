//! Shared types for the APPRAISER engine.
//!
//! These types form the data model used across all modules: the asset
//! being valued, the price observations scraped for it, and the summary
//! handed to the report consumer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// Broad asset class. Drives which marketplaces are searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Car,
    Truck,
    Train,
    /// Machines and anything not covered by the other variants.
    Machine,
}

impl AssetCategory {
    /// Parse a free-form category label. Unknown labels fall back to `Machine`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "car" | "vehicle" => AssetCategory::Car,
            "truck" | "lorry" => AssetCategory::Truck,
            "train" | "locomotive" => AssetCategory::Train,
            _ => AssetCategory::Machine,
        }
    }

    /// Guess the category from free text (OCR output or a description).
    ///
    /// Anything mentioning "machine" is a machine; everything else is
    /// assumed to be a car.
    pub fn detect(text: &str) -> Self {
        if text.to_lowercase().contains("machine") {
            AssetCategory::Machine
        } else {
            AssetCategory::Car
        }
    }

    /// Lowercase key used in configuration tables.
    pub fn key(&self) -> &'static str {
        match self {
            AssetCategory::Car => "car",
            AssetCategory::Truck => "truck",
            AssetCategory::Train => "train",
            AssetCategory::Machine => "machine",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The item being valued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub category: AssetCategory,
    pub make: String,
    pub model: String,
    /// Four-digit year of manufacture, when known.
    pub year: Option<String>,
    /// Mileage including its unit. Not used for searching.
    pub mileage: Option<String>,
}

impl AssetDescriptor {
    pub fn new(category: AssetCategory, make: &str, model: &str) -> Self {
        Self {
            category,
            make: make.to_string(),
            model: model.to_string(),
            year: None,
            mileage: None,
        }
    }

    pub fn with_year(mut self, year: &str) -> Self {
        self.year = Some(year.to_string());
        self
    }

    pub fn with_mileage(mut self, mileage: &str) -> Self {
        self.mileage = Some(mileage.to_string());
        self
    }
}

impl fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {}",
            self.category,
            self.make,
            self.model,
            self.year.as_deref().unwrap_or("-"),
        )
    }
}

// ---------------------------------------------------------------------------
// Observations
// ---------------------------------------------------------------------------

/// Which of the two recognised currencies a price was quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyTag {
    Reference,
    Alternate,
}

/// One extracted price candidate, already normalised to the reference currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Price in whole reference-currency units.
    pub price: u64,
    /// Currency the amount was quoted in on the page.
    pub currency: CurrencyTag,
    /// Surrounding page text, at most 200 characters.
    pub context: String,
}

// ---------------------------------------------------------------------------
// Valuation output
// ---------------------------------------------------------------------------

/// Summary statistic over all admitted observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Floor of the mean price.
    pub estimated_average: u64,
    /// (min, max) of admitted prices.
    pub price_range: (u64, u64),
    /// Number of admitted observations.
    pub listings: usize,
    /// Average expressed in the alternate currency (truncated).
    pub approx_alternate: u64,
}

/// Outcome of a single search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    Fetched { observations: usize },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReport {
    pub query: String,
    pub outcome: QueryOutcome,
}

impl QueryReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, QueryOutcome::Failed { .. })
    }
}

/// Everything one estimation run produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValuationSummary {
    /// `None` when no query produced an admissible price.
    pub result: Option<ValuationResult>,
    /// Cheapest observations, ascending by price.
    pub samples: Vec<PriceObservation>,
    /// Per-query outcomes in the order the queries were issued.
    pub queries: Vec<QueryReport>,
}

impl ValuationSummary {
    pub fn failed_queries(&self) -> usize {
        self.queries.iter().filter(|q| q.is_failure()).count()
    }

    pub fn succeeded_queries(&self) -> usize {
        self.queries.len() - self.failed_queries()
    }
}

impl fmt::Display for ValuationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Some(r) => write!(
                f,
                "avg {} | range {}–{} | {} listings | {}/{} queries ok",
                r.estimated_average,
                r.price_range.0,
                r.price_range.1,
                r.listings,
                self.succeeded_queries(),
                self.queries.len(),
            ),
            None => write!(
                f,
                "no valuation | {}/{} queries ok",
                self.succeeded_queries(),
                self.queries.len(),
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Construction-time errors for the valuation engine.
#[derive(Debug, thiserror::Error)]
pub enum AppraiserError {
    #[error("Invalid currency pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid valuation policy: {0}")]
    Policy(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
