//! OCR text cleanup.
//!
//! Raw OCR output from dashboard and registration photos is mostly noise.
//! Only lines that look like identification data (brands, VIN-like
//! tokens, dates, mileage, weights, service records) are kept.

use regex::Regex;
use std::sync::LazyLock;

static KEEP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bBMW\b",
        r"\bMercedes\b",
        r"\bDAF\b",
        r"\bVIN\b|[A-Z0-9]{6,}",
        r"\b\d{4}[./]\d{2}[./]\d{2}\b",
        r"\b\d{1,3}[.,]?\d{0,3}\s?km\b",
        r"\b\d{3,5}\s?kg\b",
        r"\bl/100km\b",
        r"\bService\b|\bSzerviz",
        r"\bNV\d{5}\b",
    ]
    .iter()
    .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
    .collect()
});

static DROP_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"^[A-Z]\.\d{1,3}:", r"^[A-Z0-9]{1,3}=\S+$"]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});

fn is_informative(line: &str) -> bool {
    KEEP_PATTERNS.iter().any(|re| re.is_match(line))
}

fn is_noise(line: &str) -> bool {
    DROP_PATTERNS.iter().any(|re| re.is_match(line))
}

/// Keep only informative OCR lines, trimmed, newline-joined.
pub fn clean_ocr(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() >= 4)
        .filter(|line| !line.to_lowercase().starts_with("no text"))
        .filter(|line| !is_noise(line))
        .filter(|line| is_informative(line))
        .collect::<Vec<_>>()
        .join("\n")
}
