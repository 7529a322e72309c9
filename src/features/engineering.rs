//! Feature engineering for the earnings-event model
//!
//! Builds the training matrix from enriched event rows plus each ticker's
//! daily price history: event-day price and EPS fields, moving averages,
//! RSI, and lagged daily returns. Targets are the period extrema
//! normalized to percent of the event-day close.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::{Dataset, EnrichedEvent, PriceObservation, TargetColumn};
use crate::features::technical::{moving_average, returns, rsi};

/// Feature engineering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Windows for moving averages over adjusted close
    pub ma_windows: Vec<usize>,
    /// Period for RSI
    pub rsi_period: usize,
    /// Number of lagged daily returns to include
    pub lag_days: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_windows: vec![5, 10, 20],
            rsi_period: 14,
            lag_days: 7,
        }
    }
}

/// Feature engineer that turns enriched events into an ML dataset
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    /// Create a feature engineer with default configuration
    pub fn new() -> Self {
        Self {
            config: FeatureConfig::default(),
        }
    }

    /// Create a feature engineer with custom configuration
    pub fn with_config(config: FeatureConfig) -> Self {
        Self { config }
    }

    /// Feature names in matrix column order
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![
            "adj_close".to_string(),
            "volume".to_string(),
            "eps_estimate".to_string(),
            "reported_eps".to_string(),
            "surprise_pct".to_string(),
        ];

        for window in &self.config.ma_windows {
            names.push(format!("ma_{}", window));
        }

        names.push("rsi".to_string());

        for lag in 1..=self.config.lag_days {
            names.push(format!("return_lag_{}", lag));
        }

        names
    }

    /// Build the dataset for the configured targets
    ///
    /// Rows without computed targets, or whose indicator history is too
    /// short to fill every feature, are skipped rather than imputed.
    pub fn build_dataset(
        &self,
        prices: &[PriceObservation],
        rows: &[EnrichedEvent],
        targets: &[TargetColumn],
    ) -> Dataset {
        let feature_names = self.feature_names();
        let target_names: Vec<String> = targets.iter().map(|t| t.pct_name().to_string()).collect();
        let mut dataset = Dataset::new(feature_names, target_names);

        let history = TickerHistory::build(prices, &self.config);

        for row in rows {
            let Some(target_values) = self.target_values(row, targets) else {
                continue;
            };
            let Some(features) = history.features_at(&row.ticker, row.date, row) else {
                continue;
            };

            dataset.add_sample(features, target_values, row.ticker.clone(), row.date);
        }

        info!(
            "Built dataset with {} samples and {} features",
            dataset.len(),
            dataset.num_features()
        );

        dataset
    }

    fn target_values(&self, row: &EnrichedEvent, targets: &[TargetColumn]) -> Option<Vec<f64>> {
        targets.iter().map(|t| t.value_pct(row)).collect()
    }
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-ticker indicator series, computed once and indexed by date
struct TickerHistory {
    config: FeatureConfig,
    by_ticker: BTreeMap<String, TickerSeries>,
}

struct TickerSeries {
    index_by_date: HashMap<NaiveDate, usize>,
    mas: Vec<Vec<f64>>,
    rsi: Vec<f64>,
    returns: Vec<f64>,
}

impl TickerHistory {
    fn build(prices: &[PriceObservation], config: &FeatureConfig) -> Self {
        let mut grouped: BTreeMap<String, Vec<&PriceObservation>> = BTreeMap::new();
        for p in prices {
            grouped.entry(p.ticker.clone()).or_default().push(p);
        }

        let mut by_ticker = BTreeMap::new();
        for (ticker, mut bars) in grouped {
            bars.sort_by_key(|p| p.date);
            let closes: Vec<f64> = bars.iter().map(|p| p.adj_close).collect();

            let series = TickerSeries {
                index_by_date: bars
                    .iter()
                    .enumerate()
                    .map(|(i, p)| (p.date, i))
                    .collect(),
                mas: config
                    .ma_windows
                    .iter()
                    .map(|w| moving_average(&closes, *w))
                    .collect(),
                rsi: rsi(&closes, config.rsi_period),
                returns: returns(&closes),
            };
            by_ticker.insert(ticker, series);
        }

        Self {
            config: config.clone(),
            by_ticker,
        }
    }

    /// Assemble the feature vector for one event row, or `None` if any
    /// feature is unavailable at that date
    fn features_at(&self, ticker: &str, date: NaiveDate, row: &EnrichedEvent) -> Option<Vec<f64>> {
        let series = self.by_ticker.get(ticker)?;
        let idx = *series.index_by_date.get(&date)?;

        let mut features = vec![
            row.adj_close,
            row.volume,
            row.eps_estimate?,
            row.reported_eps?,
            row.surprise_pct?,
        ];

        for ma in &series.mas {
            features.push(ma[idx]);
        }
        features.push(series.rsi[idx]);

        for lag in 1..=self.config.lag_days {
            if idx < lag {
                return None;
            }
            features.push(series.returns[idx - lag]);
        }

        if features.iter().any(|f| f.is_nan() || f.is_infinite()) {
            return None;
        }

        Some(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, n).unwrap()
    }

    fn make_prices(n: usize) -> Vec<PriceObservation> {
        (0..n)
            .map(|i| PriceObservation {
                ticker: "TEST".to_string(),
                date: day(i as u32 + 1),
                adj_close: 100.0 + (i as f64 * 0.3).sin() * 10.0,
                volume: 1_000_000.0 + i as f64 * 100.0,
            })
            .collect()
    }

    fn make_event(n: u32, close: f64) -> EnrichedEvent {
        EnrichedEvent {
            ticker: "TEST".to_string(),
            date: day(n),
            adj_close: close,
            volume: 1_000_000.0,
            eps_estimate: Some(1.5),
            reported_eps: Some(1.7),
            surprise_pct: Some(13.3),
            period_max_price: Some(close * 1.1),
            period_min_price: Some(close * 0.95),
        }
    }

    #[test]
    fn test_build_dataset_shape() {
        let prices = make_prices(30);
        let row = make_event(28, prices[27].adj_close);
        let targets = [TargetColumn::PeriodMaxPrice, TargetColumn::PeriodMinPrice];

        let engineer = FeatureEngineer::new();
        let dataset = engineer.build_dataset(&prices, &[row], &targets);

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.num_features(), engineer.feature_names().len());
        assert_eq!(dataset.num_targets(), 2);
        assert!(dataset.features[0].iter().all(|f| f.is_finite()));
        assert!((dataset.targets[0][0] - 10.0).abs() < 1e-9);
        assert!((dataset.targets[0][1] - (-5.0)).abs() < 1e-9);
    }

    #[test]
    fn test_rows_without_targets_skipped() {
        let prices = make_prices(30);
        let mut row = make_event(28, prices[27].adj_close);
        row.period_max_price = None;
        row.period_min_price = None;

        let dataset = FeatureEngineer::new().build_dataset(
            &prices,
            &[row],
            &[TargetColumn::PeriodMaxPrice, TargetColumn::PeriodMinPrice],
        );
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_short_history_skipped() {
        // An event on day 5 cannot fill a 20-day moving average.
        let prices = make_prices(30);
        let row = make_event(5, prices[4].adj_close);

        let dataset = FeatureEngineer::new().build_dataset(
            &prices,
            &[row],
            &[TargetColumn::PeriodMaxPrice],
        );
        assert!(dataset.is_empty());
    }
}
