//! Valuation aggregator.
//!
//! Runs every search query for an asset one after another, extracts
//! prices from each returned page and reduces all admitted observations
//! into a single summary. A failed query is logged, recorded and
//! skipped; it never aborts the run. When nothing usable is found the
//! summary simply has no result.

use tracing::{debug, info, warn};

use super::politeness::DelayPolicy;
use crate::config::{CurrencyPair, ValuationPolicy};
use crate::extract::PriceExtractor;
use crate::search::keywords::build_queries;
use crate::search::PageFetcher;
use crate::types::{
    AppraiserError, AssetDescriptor, PriceObservation, QueryOutcome, QueryReport,
    ValuationResult, ValuationSummary,
};

// ---------------------------------------------------------------------------
// Reduction
// ---------------------------------------------------------------------------

/// Reduce admitted observations to a result and the cheapest samples.
///
/// Average is the floor of the mean. Samples are stably sorted by price,
/// so equal prices keep their encounter order.
pub fn summarize(
    observations: Vec<PriceObservation>,
    sample_cap: usize,
    currencies: &CurrencyPair,
) -> (Option<ValuationResult>, Vec<PriceObservation>) {
    if observations.is_empty() {
        return (None, Vec::new());
    }

    let mut prices: Vec<u64> = observations.iter().map(|o| o.price).collect();
    prices.sort_unstable();

    let listings = prices.len();
    let sum: u128 = prices.iter().map(|&p| u128::from(p)).sum();
    let estimated_average = (sum / listings as u128) as u64;

    let result = ValuationResult {
        estimated_average,
        price_range: (prices[0], prices[listings - 1]),
        listings,
        approx_alternate: currencies.to_alternate(estimated_average),
    };

    let mut samples = observations;
    samples.sort_by_key(|o| o.price);
    samples.truncate(sample_cap);

    (Some(result), samples)
}

// ---------------------------------------------------------------------------
// Valuator
// ---------------------------------------------------------------------------

pub struct Valuator {
    fetcher: Box<dyn PageFetcher>,
    delay: Box<dyn DelayPolicy>,
    extractor: PriceExtractor,
    policy: ValuationPolicy,
}

impl Valuator {
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        delay: Box<dyn DelayPolicy>,
        policy: ValuationPolicy,
    ) -> Result<Self, AppraiserError> {
        let extractor = PriceExtractor::new(&policy)?;
        Ok(Self {
            fetcher,
            delay,
            extractor,
            policy,
        })
    }

    pub fn policy(&self) -> &ValuationPolicy {
        &self.policy
    }

    /// Estimate the market value of an asset.
    ///
    /// Never fails: fetch errors are recorded per query in the summary.
    pub async fn estimate(&self, asset: &AssetDescriptor) -> ValuationSummary {
        let queries = build_queries(asset);
        let band = self.policy.band_for(asset.category);
        let extractor = self.extractor.with_band(band);

        info!(
            asset = %asset,
            queries = queries.len(),
            band_min = band.min,
            band_max = band.max,
            "Starting valuation"
        );

        let mut observations = Vec::new();
        let mut reports = Vec::with_capacity(queries.len());

        for (i, query) in queries.iter().enumerate() {
            if i > 0 {
                let pause = self.delay.next_delay();
                if !pause.is_zero() {
                    debug!(pause_ms = pause.as_millis() as u64, "Pausing between queries");
                    tokio::time::sleep(pause).await;
                }
            }

            let outcome = match self.fetcher.fetch(query).await {
                Ok(page) => {
                    let found = extractor.extract_html(&page);
                    debug!(query = %query, observations = found.len(), "Query processed");
                    let count = found.len();
                    observations.extend(found);
                    QueryOutcome::Fetched { observations: count }
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "Search failed, skipping query");
                    QueryOutcome::Failed {
                        reason: format!("{e:#}"),
                    }
                }
            };
            reports.push(QueryReport {
                query: query.clone(),
                outcome,
            });
        }

        let (result, samples) = summarize(
            observations,
            self.policy.sample_cap,
            &self.policy.currencies,
        );

        let summary = ValuationSummary {
            result,
            samples,
            queries: reports,
        };
        info!(
            asset = %asset,
            failed_queries = summary.failed_queries(),
            summary = %summary,
            "Valuation complete"
        );
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceBand;
    use crate::engine::politeness::FixedDelay;
    use crate::search::MockPageFetcher;
    use crate::types::{AssetCategory, CurrencyTag};
    use anyhow::anyhow;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn obs(price: u64, context: &str) -> PriceObservation {
        PriceObservation {
            price,
            currency: CurrencyTag::Reference,
            context: context.to_string(),
        }
    }

    fn bmw() -> AssetDescriptor {
        AssetDescriptor::new(AssetCategory::Car, "BMW", "X5").with_year("2021")
    }

    fn valuator(fetcher: MockPageFetcher) -> Valuator {
        Valuator::new(
            Box::new(fetcher),
            Box::new(FixedDelay::none()),
            ValuationPolicy::default(),
        )
        .unwrap()
    }

    /// Counts how often the valuator asks for a pause.
    struct CountingDelay(Arc<AtomicUsize>);

    impl DelayPolicy for CountingDelay {
        fn next_delay(&self) -> Duration {
            self.0.fetch_add(1, Ordering::SeqCst);
            Duration::ZERO
        }
    }

    // -- summarize -------------------------------------------------------

    #[test]
    fn test_summarize_empty() {
        let (result, samples) = summarize(Vec::new(), 5, &CurrencyPair::default());
        assert!(result.is_none());
        assert!(samples.is_empty());
    }

    #[test]
    fn test_summarize_floor_average_and_range() {
        let input = vec![obs(30_001, "c"), obs(10_000, "a"), obs(20_000, "b")];
        let (result, samples) = summarize(input, 5, &CurrencyPair::default());
        let r = result.unwrap();
        assert_eq!(r.estimated_average, 20_000); // 60001 / 3
        assert_eq!(r.price_range, (10_000, 30_001));
        assert_eq!(r.listings, 3);
        assert_eq!(r.approx_alternate, 7_800_000);
        assert_eq!(samples.iter().map(|s| s.price).collect::<Vec<_>>(), vec![10_000, 20_000, 30_001]);
    }

    #[test]
    fn test_summarize_single_observation() {
        let (result, _) = summarize(vec![obs(15_000, "x")], 5, &CurrencyPair::default());
        let r = result.unwrap();
        assert_eq!(r.estimated_average, 15_000);
        assert_eq!(r.price_range, (15_000, 15_000));
        assert_eq!(r.listings, 1);
    }

    #[test]
    fn test_summarize_sample_cap_and_order() {
        let input: Vec<_> = [90, 10, 80, 20, 70, 30, 60, 40]
            .iter()
            .map(|k| obs(k * 1_000, "ctx"))
            .collect();
        let (result, samples) = summarize(input, 5, &CurrencyPair::default());
        assert_eq!(result.unwrap().listings, 8);
        assert_eq!(
            samples.iter().map(|s| s.price).collect::<Vec<_>>(),
            vec![10_000, 20_000, 30_000, 40_000, 60_000]
        );
    }

    #[test]
    fn test_summarize_ties_keep_encounter_order() {
        let input = vec![obs(12_000, "first"), obs(9_000, "cheap"), obs(12_000, "second")];
        let (_, samples) = summarize(input, 5, &CurrencyPair::default());
        let contexts: Vec<_> = samples.iter().map(|s| s.context.as_str()).collect();
        assert_eq!(contexts, vec!["cheap", "first", "second"]);
    }

    #[test]
    fn test_summarize_large_sums_do_not_overflow() {
        let input = vec![obs(u64::MAX, "a"), obs(u64::MAX, "b")];
        let (result, _) = summarize(input, 5, &CurrencyPair::default());
        assert_eq!(result.unwrap().estimated_average, u64::MAX);
    }

    // -- estimate --------------------------------------------------------

    #[tokio::test]
    async fn test_estimate_combines_all_queries() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(3).returning(|query| {
            if query.ends_with("site:mobile.de") {
                Ok("<div>BMW X5</div><div>€ 45.900</div><div>€ 52.000</div>".to_string())
            } else if query.ends_with("site:autoscout24.com") {
                Ok("<p>49.500 EUR</p>".to_string())
            } else {
                Ok("<p>Ár: 18.000.000 Ft</p>".to_string())
            }
        });

        let summary = valuator(fetcher).estimate(&bmw()).await;
        let r = summary.result.clone().unwrap();
        // 45900 + 52000 + 49500 + round(18000000 / 390) = 46154
        assert_eq!(r.listings, 4);
        assert_eq!(r.price_range, (45_900, 52_000));
        assert_eq!(r.estimated_average, (45_900 + 52_000 + 49_500 + 46_154) / 4);
        assert_eq!(summary.samples.len(), 4);
        assert_eq!(summary.samples[1].price, 46_154);
        assert_eq!(summary.samples[1].currency, CurrencyTag::Alternate);
        assert_eq!(summary.failed_queries(), 0);
    }

    #[tokio::test]
    async fn test_estimate_queries_in_order() {
        let mut seq = Sequence::new();
        let mut fetcher = MockPageFetcher::new();
        for q in [
            "BMW X5 2021 site:mobile.de",
            "BMW X5 2021 site:autoscout24.com",
            "BMW X5 2021 site:hasznaltauto.hu",
        ] {
            fetcher
                .expect_fetch()
                .with(eq(q))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(String::new()));
        }

        let summary = valuator(fetcher).estimate(&bmw()).await;
        let issued: Vec<_> = summary.queries.iter().map(|q| q.query.as_str()).collect();
        assert_eq!(
            issued,
            vec![
                "BMW X5 2021 site:mobile.de",
                "BMW X5 2021 site:autoscout24.com",
                "BMW X5 2021 site:hasznaltauto.hu",
            ]
        );
    }

    #[tokio::test]
    async fn test_estimate_all_fetches_fail() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(3)
            .returning(|_| Err(anyhow!("HTTP 429 Too Many Requests")));

        let summary = valuator(fetcher).estimate(&bmw()).await;
        assert!(summary.result.is_none());
        assert!(summary.samples.is_empty());
        assert_eq!(summary.failed_queries(), 3);
        assert!(matches!(
            &summary.queries[0].outcome,
            QueryOutcome::Failed { reason } if reason.contains("429")
        ));
    }

    #[tokio::test]
    async fn test_estimate_partial_failure_continues() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(3).returning(|query| {
            if query.ends_with("site:autoscout24.com") {
                Ok("<span>€ 30.000</span>".to_string())
            } else {
                Err(anyhow!("timed out"))
            }
        });

        let summary = valuator(fetcher).estimate(&bmw()).await;
        assert_eq!(summary.result.as_ref().unwrap().listings, 1);
        assert_eq!(summary.failed_queries(), 2);
        assert_eq!(
            summary.queries[1].outcome,
            QueryOutcome::Fetched { observations: 1 }
        );
    }

    #[tokio::test]
    async fn test_estimate_no_prices_on_pages() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok("<p>No results. € 12</p>".to_string()));

        let asset = AssetDescriptor::new(AssetCategory::Machine, "Haas", "VF-2");
        let summary = valuator(fetcher).estimate(&asset).await;
        assert!(summary.result.is_none());
        assert!(summary.samples.is_empty());
        assert_eq!(summary.failed_queries(), 0);
    }

    #[tokio::test]
    async fn test_estimate_pauses_between_queries_only() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(3).returning(|_| Ok(String::new()));

        let pauses = Arc::new(AtomicUsize::new(0));
        let valuator = Valuator::new(
            Box::new(fetcher),
            Box::new(CountingDelay(pauses.clone())),
            ValuationPolicy::default(),
        )
        .unwrap();
        valuator.estimate(&bmw()).await;
        assert_eq!(pauses.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_estimate_uses_category_band() {
        let mut policy = ValuationPolicy::default();
        policy
            .category_bands
            .insert("truck".to_string(), PriceBand::new(5_000, 600_000));

        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(2)
            .returning(|_| Ok("<p>€ 350.000</p>".to_string()));

        let valuator =
            Valuator::new(Box::new(fetcher), Box::new(FixedDelay::none()), policy).unwrap();
        let truck = AssetDescriptor::new(AssetCategory::Truck, "DAF", "XF").with_year("2020");
        let summary = valuator.estimate(&truck).await;
        assert_eq!(summary.result.unwrap().estimated_average, 350_000);
    }

    #[tokio::test]
    async fn test_estimate_sample_cap_respected() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(3).returning(|_| {
            Ok("<ul><li>€ 11.000</li><li>€ 9.000</li><li>€ 13.000</li></ul>".to_string())
        });

        let summary = valuator(fetcher).estimate(&bmw()).await;
        assert_eq!(summary.result.unwrap().listings, 9);
        assert_eq!(summary.samples.len(), 5);
        assert!(summary.samples.windows(2).all(|w| w[0].price <= w[1].price));
        assert_eq!(summary.samples[0].price, 9_000);
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let mut policy = ValuationPolicy::default();
        policy.sample_cap = 0;
        let result = Valuator::new(
            Box::new(MockPageFetcher::new()),
            Box::new(FixedDelay::none()),
            policy,
        );
        assert!(result.is_err());
    }
}
