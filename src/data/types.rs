//! Data types for stock market and earnings-surprise data
//!
//! This module defines the core data structures used throughout the project.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily price observation for one ticker
///
/// Loaded once per run and never mutated; keyed by (ticker, date) with
/// dates unique per ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceObservation {
    /// Stock symbol (e.g., "AAPL")
    #[serde(rename = "Ticker")]
    pub ticker: String,
    /// Trading day
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    /// Adjusted closing price
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    /// Trading volume
    #[serde(rename = "Volume")]
    pub volume: f64,
}

/// A scheduled corporate earnings announcement
///
/// EPS fields are optional: upcoming events carry an estimate but no
/// reported value, and rows without a surprise figure are excluded from
/// target-interval boundaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsEvent {
    /// Stock symbol
    #[serde(rename = "Symbol")]
    pub ticker: String,
    /// Announcement date (calendar date, no intraday component)
    #[serde(rename = "Event Start Date")]
    pub event_date: NaiveDate,
    /// Analyst consensus EPS estimate
    #[serde(rename = "EPS Estimate")]
    pub eps_estimate: Option<f64>,
    /// Actually reported EPS
    #[serde(rename = "Reported EPS")]
    pub reported_eps: Option<f64>,
    /// Surprise percentage (reported vs. estimate)
    #[serde(rename = "Surprise (%)")]
    pub surprise_pct: Option<f64>,
}

impl EarningsEvent {
    /// Whether this event can serve as a target-interval boundary
    pub fn has_surprise(&self) -> bool {
        self.surprise_pct.is_some()
    }
}

/// An earnings event joined with its event-day price row and annotated
/// with the price extrema realized before the next earnings event
///
/// `period_max_price` / `period_min_price` are the max/min adjusted close
/// strictly between this event's date and the next boundary date for the
/// same ticker. `None` means no computable target (terminal event, or no
/// trading days in the interval) — never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedEvent {
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Adj Close")]
    pub adj_close: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    #[serde(rename = "EPS Estimate")]
    pub eps_estimate: Option<f64>,
    #[serde(rename = "Reported EPS")]
    pub reported_eps: Option<f64>,
    #[serde(rename = "Surprise (%)")]
    pub surprise_pct: Option<f64>,
    pub period_max_price: Option<f64>,
    pub period_min_price: Option<f64>,
}

impl EnrichedEvent {
    /// Whether both extremum targets were computed for this row
    pub fn has_targets(&self) -> bool {
        self.period_max_price.is_some() && self.period_min_price.is_some()
    }

    /// Period max as percent above the event-day close
    pub fn max_price_pct(&self) -> Option<f64> {
        self.period_max_price
            .map(|p| p / self.adj_close * 100.0 - 100.0)
    }

    /// Period min as percent relative to the event-day close
    pub fn min_price_pct(&self) -> Option<f64> {
        self.period_min_price
            .map(|p| p / self.adj_close * 100.0 - 100.0)
    }
}

/// Target columns derived by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetColumn {
    #[serde(rename = "period_max_price")]
    PeriodMaxPrice,
    #[serde(rename = "period_min_price")]
    PeriodMinPrice,
}

impl TargetColumn {
    /// Column name as it appears in the processed CSV
    pub fn name(&self) -> &'static str {
        match self {
            TargetColumn::PeriodMaxPrice => "period_max_price",
            TargetColumn::PeriodMinPrice => "period_min_price",
        }
    }

    /// Column name of the percent-normalized variant used for training
    pub fn pct_name(&self) -> &'static str {
        match self {
            TargetColumn::PeriodMaxPrice => "period_max_price_pct",
            TargetColumn::PeriodMinPrice => "period_min_price_pct",
        }
    }

    /// Read this column's raw value from an enriched row
    pub fn value(&self, row: &EnrichedEvent) -> Option<f64> {
        match self {
            TargetColumn::PeriodMaxPrice => row.period_max_price,
            TargetColumn::PeriodMinPrice => row.period_min_price,
        }
    }

    /// Read this column's value normalized to percent of event-day close
    pub fn value_pct(&self, row: &EnrichedEvent) -> Option<f64> {
        match self {
            TargetColumn::PeriodMaxPrice => row.max_price_pct(),
            TargetColumn::PeriodMinPrice => row.min_price_pct(),
        }
    }
}

/// Dataset for machine learning
///
/// Feature matrix plus one target column per configured target. Rows stay
/// aligned with the (ticker, date) keys so predictions can be joined back
/// onto the enriched table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature names
    pub feature_names: Vec<String>,
    /// Feature matrix (rows = samples, cols = features)
    pub features: Vec<Vec<f64>>,
    /// Target names
    pub target_names: Vec<String>,
    /// Target matrix (rows = samples, cols = targets)
    pub targets: Vec<Vec<f64>>,
    /// Ticker for each sample
    pub tickers: Vec<String>,
    /// Event date for each sample
    pub dates: Vec<NaiveDate>,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new(feature_names: Vec<String>, target_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            target_names,
            targets: Vec::new(),
            tickers: Vec::new(),
            dates: Vec::new(),
        }
    }

    /// Add a sample to the dataset
    pub fn add_sample(
        &mut self,
        features: Vec<f64>,
        targets: Vec<f64>,
        ticker: String,
        date: NaiveDate,
    ) {
        self.features.push(features);
        self.targets.push(targets);
        self.tickers.push(ticker);
        self.dates.push(date);
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Check if the dataset is empty
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get the number of features
    pub fn num_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Get the number of targets
    pub fn num_targets(&self) -> usize {
        self.target_names.len()
    }

    /// Extract a single target column as a vector
    pub fn target_column(&self, idx: usize) -> Vec<f64> {
        self.targets.iter().map(|row| row[idx]).collect()
    }

    /// Split into train (date < cutoff) and test (date >= cutoff) sets
    pub fn split_at_date(&self, cutoff: NaiveDate) -> (Dataset, Dataset) {
        let mut train = Dataset::new(self.feature_names.clone(), self.target_names.clone());
        let mut test = Dataset::new(self.feature_names.clone(), self.target_names.clone());

        for i in 0..self.len() {
            let dest = if self.dates[i] < cutoff {
                &mut train
            } else {
                &mut test
            };
            dest.add_sample(
                self.features[i].clone(),
                self.targets[i].clone(),
                self.tickers[i].clone(),
                self.dates[i],
            );
        }

        (train, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn enriched(close: f64, max: Option<f64>, min: Option<f64>) -> EnrichedEvent {
        EnrichedEvent {
            ticker: "AAPL".to_string(),
            date: date("2024-01-05"),
            adj_close: close,
            volume: 1_000_000.0,
            eps_estimate: Some(1.2),
            reported_eps: Some(1.4),
            surprise_pct: Some(16.7),
            period_max_price: max,
            period_min_price: min,
        }
    }

    #[test]
    fn test_pct_normalization() {
        let row = enriched(100.0, Some(112.0), Some(92.0));
        assert!((row.max_price_pct().unwrap() - 12.0).abs() < 1e-10);
        assert!((row.min_price_pct().unwrap() - (-8.0)).abs() < 1e-10);
    }

    #[test]
    fn test_missing_targets_stay_missing() {
        let row = enriched(100.0, None, None);
        assert!(!row.has_targets());
        assert!(row.max_price_pct().is_none());
        assert!(TargetColumn::PeriodMaxPrice.value(&row).is_none());
    }

    #[test]
    fn test_dataset_split_at_date() {
        let mut dataset = Dataset::new(
            vec!["f1".to_string()],
            vec!["period_max_price_pct".to_string()],
        );
        dataset.add_sample(vec![1.0], vec![5.0], "A".to_string(), date("2024-01-02"));
        dataset.add_sample(vec![2.0], vec![6.0], "A".to_string(), date("2024-03-02"));
        dataset.add_sample(vec![3.0], vec![7.0], "B".to_string(), date("2024-06-02"));

        let (train, test) = dataset.split_at_date(date("2024-03-02"));
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 2);
        assert_eq!(test.target_column(0), vec![6.0, 7.0]);
    }
}
