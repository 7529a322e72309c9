//! Configuration management
//!
//! Loads the run configuration from a TOML file. The config object is
//! passed explicitly to each pipeline stage; there is no process-wide
//! ambient state.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::TargetColumn;
use crate::features::FeatureConfig;
use crate::models::GbmParams;

/// Data locations and date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Market data CSV (Ticker, Date, Adj Close, Volume)
    pub market_file: String,
    /// Directory of earnings CSV files
    pub eps_dir: String,
    /// Optional liquidity allow-list CSV with a Ticker column
    pub selected_tickers_file: Option<String>,
    /// Where the enriched table is written/read
    pub processed_file: String,
    /// Where predictions are written/read
    pub predictions_file: String,
    /// Optional JSON file for the evaluation report
    pub report_file: Option<String>,
    /// First date of the study window
    pub start_date: NaiveDate,
    /// Last date of the study window
    pub end_date: NaiveDate,
    /// Temporal split: train before, test at/after
    pub cutoff_date: NaiveDate,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            market_file: "data/market_data/2019-01-01 to 2024-03-01.csv".to_string(),
            eps_dir: "data/eps_data".to_string(),
            selected_tickers_file: Some("data/market_data/selected_tickers.csv".to_string()),
            processed_file: "data/processed_data/data_clean.csv".to_string(),
            predictions_file: "data/experiment/data_with_predictions.csv".to_string(),
            report_file: Some("data/experiment/evaluation_report.json".to_string()),
            start_date: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            cutoff_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        }
    }
}

/// Target columns and outlier bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target columns derived by the generator
    pub columns: Vec<TargetColumn>,
    /// Strict (lower, upper) bound applied to each target column
    pub outlier_threshold: (f64, f64),
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            columns: vec![TargetColumn::PeriodMaxPrice, TargetColumn::PeriodMinPrice],
            outlier_threshold: (0.0, 10_000.0),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub data: DataConfig,
    pub targets: TargetConfig,
    pub features: FeatureConfig,
    pub model: GbmParams,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration from a file, or fall back to the defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Create a default configuration file
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        Config::default().save(path)
    }
}
