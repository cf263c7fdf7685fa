//! Price extraction from scraped page text.
//!
//! Scans visible text fragments for currency-tagged numbers, normalises
//! them to the reference currency and keeps those inside the admissible
//! band. A marker may precede or follow the number, and a whole fragment
//! counts as alternate-currency as soon as it mentions an alternate marker
//! anywhere. Outliers are left for the band filter and the aggregate.

use regex::Regex;
use scraper::Html;

use crate::config::{CurrencyPair, PriceBand, ValuationPolicy};
use crate::types::{AppraiserError, CurrencyTag, PriceObservation};

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

// ---------------------------------------------------------------------------
// Fragment sources
// ---------------------------------------------------------------------------

/// Visible text nodes of an HTML document in document order, trimmed,
/// empty nodes dropped.
pub fn html_fragments(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()));
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Non-empty trimmed lines of plain text.
pub fn text_fragments(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// `<marker> <number>` or `<number> <marker>` for any of the four markers.
fn currency_pattern(currencies: &CurrencyPair) -> Result<Regex, regex::Error> {
    let markers = [
        &currencies.reference.code,
        &currencies.reference.symbol,
        &currencies.alternate.code,
        &currencies.alternate.symbol,
    ]
    .iter()
    .map(|m| regex::escape(m))
    .collect::<Vec<_>>()
    .join("|");

    Regex::new(&format!(
        r"(?:{markers})\s*([\d.,]+)|(\d[\d\s.,]*)\s*(?:{markers})"
    ))
}

/// Strip thousands separators and whitespace, then parse.
fn parse_amount(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.' && *c != ',')
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone)]
pub struct PriceExtractor {
    pattern: Regex,
    currencies: CurrencyPair,
    noise_floor: u64,
    band: PriceBand,
    context_radius: usize,
    context_chars: usize,
}

impl PriceExtractor {
    /// Build an extractor using the policy's default band.
    pub fn new(policy: &ValuationPolicy) -> Result<Self, AppraiserError> {
        policy.validate()?;
        Ok(Self {
            pattern: currency_pattern(&policy.currencies)?,
            currencies: policy.currencies.clone(),
            noise_floor: policy.noise_floor,
            band: policy.band,
            context_radius: policy.context_radius,
            context_chars: policy.context_chars,
        })
    }

    /// Same extractor with a different admissible band.
    pub fn with_band(&self, band: PriceBand) -> Self {
        Self {
            band,
            ..self.clone()
        }
    }

    pub fn band(&self) -> PriceBand {
        self.band
    }

    /// Extract from an HTML page.
    pub fn extract_html(&self, html: &str) -> Vec<PriceObservation> {
        self.extract(html_fragments(html).as_slice())
    }

    /// Extract from plain text, one fragment per line.
    pub fn extract_text(&self, text: &str) -> Vec<PriceObservation> {
        self.extract(text_fragments(text).as_slice())
    }

    /// Extract observations from text fragments in document order.
    ///
    /// The result keeps encounter order and is identical for identical input.
    pub fn extract<S: AsRef<str>>(&self, fragments: &[S]) -> Vec<PriceObservation> {
        let texts: Vec<String> = fragments
            .iter()
            .map(|f| html_escape::decode_html_entities(f.as_ref()).into_owned())
            .collect();

        let mut observations = Vec::new();
        for (idx, text) in texts.iter().enumerate() {
            for caps in self.pattern.captures_iter(text) {
                let Some(raw) = caps.get(1).or_else(|| caps.get(2)) else {
                    continue;
                };
                let Some(amount) = parse_amount(raw.as_str()) else {
                    continue;
                };
                if amount < self.noise_floor {
                    continue;
                }

                let currency = if self.currencies.alternate.appears_in(text) {
                    CurrencyTag::Alternate
                } else {
                    CurrencyTag::Reference
                };
                let price = match currency {
                    CurrencyTag::Alternate => self.currencies.to_reference(amount),
                    CurrencyTag::Reference => amount,
                };
                if !self.band.contains(price) {
                    continue;
                }

                observations.push(PriceObservation {
                    price,
                    currency,
                    context: self.context_around(&texts, idx),
                });
            }
        }
        observations
    }

    /// Fragment `idx` with its neighbours, space-joined and length-capped.
    fn context_around(&self, texts: &[String], idx: usize) -> String {
        let start = idx.saturating_sub(self.context_radius);
        let end = (idx + self.context_radius + 1).min(texts.len());
        texts[start..end]
            .join(" ")
            .chars()
            .take(self.context_chars)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
