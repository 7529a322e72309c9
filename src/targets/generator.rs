//! Inter-earnings interval segmentation and extremum targets
//!
//! For one ticker, partitions the price history at earnings dates that
//! carry a surprise figure and computes the max/min adjusted close inside
//! each interval. Extrema are collected into an explicit boundary-date map
//! and joined back onto the event rows by lookup, so nothing is mutated in
//! place.

use std::collections::BTreeMap;
use std::ops::Bound::Excluded;

use chrono::NaiveDate;

use crate::data::{EarningsEvent, EnrichedEvent, PriceObservation};

/// Max/min adjusted close over one inter-earnings interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodExtrema {
    pub max_price: f64,
    pub min_price: f64,
}

/// Target generator for a single ticker's price and earnings series
///
/// Pure: the same inputs always produce the same output.
///
/// # Example
///
/// ```rust,ignore
/// let generator = TargetGenerator::new();
/// let enriched = generator.enrich_ticker(&prices, &events);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetGenerator;

impl TargetGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Join one ticker's earnings events against its price series and
    /// annotate each event row with the forward price extrema
    ///
    /// Emits one row per earnings event whose date joins a trading day.
    /// The last valid boundary (and any event excluded from segmentation)
    /// keeps its row with `None` extrema. Two events on the same date
    /// collapse to one row keeping the later-appearing event's attributes.
    pub fn enrich_ticker(
        &self,
        prices: &[PriceObservation],
        events: &[EarningsEvent],
    ) -> Vec<EnrichedEvent> {
        if prices.is_empty() || events.is_empty() {
            return Vec::new();
        }

        let price_by_date: BTreeMap<NaiveDate, &PriceObservation> =
            prices.iter().map(|p| (p.date, p)).collect();

        // Duplicate event dates are undefined upstream; a later entry
        // overwrites an earlier one, keeping the last occurrence.
        let event_by_date: BTreeMap<NaiveDate, &EarningsEvent> =
            events.iter().map(|e| (e.event_date, e)).collect();

        // Boundary dates: events with a surprise figure that landed on a
        // trading day. Dates outside the price series never joined a row
        // in the first place and cannot anchor an interval.
        let boundaries: Vec<NaiveDate> = event_by_date
            .iter()
            .filter(|(date, event)| event.has_surprise() && price_by_date.contains_key(*date))
            .map(|(date, _)| *date)
            .collect();

        let extrema = self.segment_extrema(&price_by_date, &boundaries);

        event_by_date
            .values()
            .filter_map(|event| {
                let bar = price_by_date.get(&event.event_date)?;
                let period = extrema.get(&event.event_date);
                Some(EnrichedEvent {
                    ticker: event.ticker.clone(),
                    date: event.event_date,
                    adj_close: bar.adj_close,
                    volume: bar.volume,
                    eps_estimate: event.eps_estimate,
                    reported_eps: event.reported_eps,
                    surprise_pct: event.surprise_pct,
                    period_max_price: period.map(|p| p.max_price),
                    period_min_price: period.map(|p| p.min_price),
                })
            })
            .collect()
    }

    /// Compute the extremum map over consecutive boundary pairs
    ///
    /// For boundaries d_0 < d_1 < ... < d_n, the entry for d_i holds the
    /// max/min adjusted close over trading days strictly inside
    /// (d_i, d_{i+1}). The final boundary gets no entry, and neither does
    /// a pair with no trading days between them.
    fn segment_extrema(
        &self,
        price_by_date: &BTreeMap<NaiveDate, &PriceObservation>,
        boundaries: &[NaiveDate],
    ) -> BTreeMap<NaiveDate, PeriodExtrema> {
        let mut extrema = BTreeMap::new();

        for pair in boundaries.windows(2) {
            let (start, end) = (pair[0], pair[1]);

            let mut period: Option<PeriodExtrema> = None;
            for (_, bar) in price_by_date.range((Excluded(start), Excluded(end))) {
                period = Some(match period {
                    None => PeriodExtrema {
                        max_price: bar.adj_close,
                        min_price: bar.adj_close,
                    },
                    Some(p) => PeriodExtrema {
                        max_price: p.max_price.max(bar.adj_close),
                        min_price: p.min_price.min(bar.adj_close),
                    },
                });
            }

            if let Some(p) = period {
                extrema.insert(start, p);
            }
        }

        extrema
    }
}
