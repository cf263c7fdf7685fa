//! Search keyword generation.
//!
//! Each asset category maps to a fixed list of query templates, most of
//! them restricted to a single marketplace domain.

use crate::types::{AssetCategory, AssetDescriptor};

// ---------------------------------------------------------------------------
// Marketplace targets
// ---------------------------------------------------------------------------

enum QuerySuffix {
    Site(&'static str),
    Phrase(&'static str),
}

const CAR_TARGETS: &[QuerySuffix] = &[
    QuerySuffix::Site("mobile.de"),
    QuerySuffix::Site("autoscout24.com"),
    QuerySuffix::Site("hasznaltauto.hu"),
];

const TRUCK_TARGETS: &[QuerySuffix] = &[
    QuerySuffix::Site("trucks.autoscout24.com"),
    QuerySuffix::Site("kleyntrucks.com"),
];

const TRAIN_TARGETS: &[QuerySuffix] = &[QuerySuffix::Phrase("locomotive for sale")];

const MACHINE_TARGETS: &[QuerySuffix] = &[QuerySuffix::Phrase("used for sale Europe")];

fn targets_for(category: AssetCategory) -> &'static [QuerySuffix] {
    match category {
        AssetCategory::Car => CAR_TARGETS,
        AssetCategory::Truck => TRUCK_TARGETS,
        AssetCategory::Train => TRAIN_TARGETS,
        AssetCategory::Machine => MACHINE_TARGETS,
    }
}

/// `"{make} {model} {year}"` with surrounding whitespace trimmed.
fn base_phrase(make: &str, model: &str, year: &str) -> String {
    format!("{make} {model} {year}").trim().to_string()
}

/// Build the ordered search queries for an asset.
///
/// Mileage is carried on the descriptor but does not affect the queries.
pub fn build_queries(asset: &AssetDescriptor) -> Vec<String> {
    let base = base_phrase(
        &asset.make,
        &asset.model,
        asset.year.as_deref().unwrap_or(""),
    );

    targets_for(asset.category)
        .iter()
        .map(|suffix| match suffix {
            QuerySuffix::Site(domain) => format!("{base} site:{domain}"),
            QuerySuffix::Phrase(phrase) => format!("{base} {phrase}"),
        })
        .collect()
}
