//! Markdown rendering of valuation output.
//!
//! Produces the "Determined Values" and "Market Comparison Samples"
//! sections that the report generator splices into the final asset
//! description. When there is no valuation, nothing is rendered and the
//! consumer leaves the sections out.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::CurrencyPair;
use crate::types::{PriceObservation, ValuationSummary};

static RE_UNPRINTABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s,.-]").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Characters of context shown per sample line.
const SAMPLE_CONTEXT_CHARS: usize = 100;

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Context reduced to words, spaces and basic punctuation, single-spaced,
/// at most 100 characters.
fn tidy_context(context: &str) -> String {
    let stripped = RE_UNPRINTABLE.replace_all(context, "");
    let collapsed = RE_WHITESPACE.replace_all(&stripped, " ");
    collapsed.trim().chars().take(SAMPLE_CONTEXT_CHARS).collect()
}

/// One markdown bullet per sample; empty string for no samples.
pub fn format_sample_block(samples: &[PriceObservation], currencies: &CurrencyPair) -> String {
    samples
        .iter()
        .map(|s| {
            format!(
                "- {}... ; **{} {}** (~{} {})",
                tidy_context(&s.context),
                group_thousands(s.price),
                currencies.reference.code,
                group_thousands(currencies.to_alternate(s.price)),
                currencies.alternate.code,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The valuation sections, or `None` when there is nothing to report.
pub fn render_valuation_section(
    summary: &ValuationSummary,
    currencies: &CurrencyPair,
) -> Option<String> {
    let result = summary.result.as_ref().filter(|r| r.listings > 0)?;
    let reference = &currencies.reference.code;

    let values = format!(
        "- **Market Value:** {} {reference} (~{} {})\n\
         - **Price Range:** {} – {} {reference}\n\
         - **Analyzed Listings:** {}\n",
        group_thousands(result.estimated_average),
        group_thousands(result.approx_alternate),
        currencies.alternate.code,
        group_thousands(result.price_range.0),
        group_thousands(result.price_range.1),
        result.listings,
    );

    Some(format!(
        "### Determined Values\n{values}\n### Market Comparison Samples\n{}",
        format_sample_block(&summary.samples, currencies)
    ))
}

/// Final annotations document for one asset.
pub fn render_annotations(label: &str, description: &str, valuation: Option<&str>) -> String {
    let mut doc = format!("## {label}\n\n{}\n", description.trim_end());
    if let Some(section) = valuation {
        doc.push('\n');
        doc.push_str(section);
        doc.push('\n');
    }
    doc
}
