//! Labelled-field extraction from a structured asset description.
//!
//! Each field has one label-anchored, case-insensitive pattern. A missing
//! label yields an empty string; nothing here can fail.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::types::{AssetCategory, AssetDescriptor};

static RE_MAKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Make\s*[:\-]\s*([A-Z][A-Za-z0-9\- ]{2,})").unwrap()
});
static RE_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Model\s*[:\-]\s*([A-Za-z0-9\- ]{2,})").unwrap()
});
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Year of Manufacture\s*[:\-]\s*(\d{4})").unwrap()
});
static RE_MILEAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Mileage\s*[:\-]\s*([\d,.]+)\s*km").unwrap()
});
static RE_VIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VIN\s*[:\-]\s*([A-Z0-9]{5,})").unwrap()
});

/// Fields pulled from a description. Absent fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub make: String,
    pub model: String,
    pub year: String,
    pub mileage: String,
    pub vin: String,
}

impl ExtractedFields {
    /// Build the valuation input. Empty year and mileage become `None`.
    pub fn to_descriptor(&self, category: AssetCategory) -> AssetDescriptor {
        AssetDescriptor {
            category,
            make: self.make.clone(),
            model: self.model.clone(),
            year: non_empty(&self.year),
            mileage: non_empty(&self.mileage).map(|m| format!("{m} km")),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// First capture group of `re` in `text`, trimmed.
fn grab(re: &Regex, text: &str) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Extract make, model, year, mileage and VIN from structured text.
pub fn extract_fields(text: &str) -> ExtractedFields {
    ExtractedFields {
        make: grab(&RE_MAKE, text),
        model: grab(&RE_MODEL, text),
        year: grab(&RE_YEAR, text),
        mileage: grab(&RE_MILEAGE, text),
        vin: grab(&RE_VIN, text),
    }
}
