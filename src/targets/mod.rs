//! Target generation: interval segmentation and per-ticker orchestration

pub mod generator;
pub mod outliers;

pub use generator::{PeriodExtrema, TargetGenerator};
pub use outliers::OutlierFilter;

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::data::{EarningsEvent, EnrichedEvent, PriceObservation};

/// Run the target generator over every ticker in the market table
///
/// Tickers are processed independently in sorted order and their enriched
/// rows concatenated; per-ticker relative order is preserved. A ticker
/// with no earnings data contributes zero rows.
pub fn enrich_all_tickers(
    prices: &[PriceObservation],
    events: &[EarningsEvent],
    generator: &TargetGenerator,
) -> Vec<EnrichedEvent> {
    let mut prices_by_ticker: BTreeMap<&str, Vec<PriceObservation>> = BTreeMap::new();
    for p in prices {
        prices_by_ticker.entry(&p.ticker).or_default().push(p.clone());
    }

    let mut events_by_ticker: BTreeMap<&str, Vec<EarningsEvent>> = BTreeMap::new();
    for e in events {
        events_by_ticker.entry(&e.ticker).or_default().push(e.clone());
    }

    info!("Calculating targets for {} tickers", prices_by_ticker.len());

    let mut enriched = Vec::new();
    for (ticker, ticker_prices) in &prices_by_ticker {
        let Some(ticker_events) = events_by_ticker.get(ticker) else {
            debug!("No earnings data for {}, skipping", ticker);
            continue;
        };

        enriched.extend(generator.enrich_ticker(ticker_prices, ticker_events));
    }

    let distinct_tickers = enriched
        .iter()
        .map(|r| r.ticker.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    info!(
        "Generated {} enriched rows across {} distinct tickers",
        enriched.len(),
        distinct_tickers
    );

    enriched
}

/// Count the distinct tickers represented in an enriched table
pub fn distinct_ticker_count(rows: &[EnrichedEvent]) -> usize {
    rows.iter()
        .map(|r| r.ticker.as_str())
        .collect::<std::collections::BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, n).unwrap()
    }

    fn price(ticker: &str, n: u32, close: f64) -> PriceObservation {
        PriceObservation {
            ticker: ticker.to_string(),
            date: day(n),
            adj_close: close,
            volume: 50_000.0,
        }
    }

    fn event(ticker: &str, n: u32) -> EarningsEvent {
        EarningsEvent {
            ticker: ticker.to_string(),
            event_date: day(n),
            eps_estimate: Some(0.5),
            reported_eps: Some(0.6),
            surprise_pct: Some(20.0),
        }
    }

    #[test]
    fn test_ticker_without_earnings_contributes_no_rows() {
        let mut prices = Vec::new();
        for n in 1..=8 {
            prices.push(price("AAA", n, 100.0 + n as f64));
            prices.push(price("BBB", n, 50.0 + n as f64));
        }
        // Only AAA has earnings data.
        let events = vec![event("AAA", 2), event("AAA", 6)];

        let rows = enrich_all_tickers(&prices, &events, &TargetGenerator::new());

        assert!(rows.iter().all(|r| r.ticker == "AAA"));
        assert_eq!(distinct_ticker_count(&rows), 1);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rows_concatenate_across_tickers() {
        let mut prices = Vec::new();
        for n in 1..=8 {
            prices.push(price("AAA", n, 10.0 + n as f64));
            prices.push(price("BBB", n, 20.0 + n as f64));
        }
        let events = vec![
            event("AAA", 1),
            event("AAA", 5),
            event("BBB", 2),
            event("BBB", 7),
        ];

        let rows = enrich_all_tickers(&prices, &events, &TargetGenerator::new());
        assert_eq!(rows.len(), 4);
        assert_eq!(distinct_ticker_count(&rows), 2);

        // Each ticker's first boundary got computed extrema.
        let aaa = rows.iter().find(|r| r.ticker == "AAA").unwrap();
        assert!(aaa.has_targets());
        let bbb = rows.iter().find(|r| r.ticker == "BBB").unwrap();
        assert!(bbb.has_targets());
    }
}
