//! Gradient boosting on inter-earnings price extrema
//!
//! This library prepares historical stock market and earnings-surprise
//! data, derives supervised-learning targets (the max/min adjusted close
//! between consecutive earnings events), trains a gradient-boosted
//! regression model per target, and evaluates directional and magnitude
//! accuracy.
//!
//! # Modules
//!
//! - [`data`] - Market/earnings data structures and CSV I/O
//! - [`targets`] - Interval segmentation, extremum targets, outlier filter
//! - [`features`] - Technical indicators and feature engineering
//! - [`models`] - Gradient Boosting Machine wrappers
//! - [`evaluation`] - Error metrics, sign analysis, thresholding
//! - [`config`] - Explicit TOML run configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use earnings_gbm::config::Config;
//! use earnings_gbm::data::DataLoader;
//! use earnings_gbm::features::FeatureEngineer;
//! use earnings_gbm::models::TargetModelSet;
//! use earnings_gbm::targets::{enrich_all_tickers, OutlierFilter, TargetGenerator};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml")?;
//!
//!     // 1. Load pre-downloaded data
//!     let prices = DataLoader::load_market(&config.data.market_file)?;
//!     let events = DataLoader::load_earnings_dir(&config.data.eps_dir)?;
//!
//!     // 2. Generate inter-earnings extremum targets
//!     let enriched = enrich_all_tickers(&prices, &events, &TargetGenerator::new());
//!     let (lower, upper) = config.targets.outlier_threshold;
//!     let clean = OutlierFilter::new(config.targets.columns.clone(), lower, upper)
//!         .apply(enriched);
//!
//!     // 3. Build features and train
//!     let engineer = FeatureEngineer::with_config(config.features.clone());
//!     let dataset = engineer.build_dataset(&prices, &clean, &config.targets.columns);
//!     let (train, test) = dataset.split_at_date(config.data.cutoff_date);
//!
//!     let mut models = TargetModelSet::new(config.model.clone());
//!     models.fit(&train)?;
//!     for (target, metrics) in models.evaluate(&test)? {
//!         println!("{}: RMSE {:.4}", target, metrics.rmse.unwrap_or(f64::NAN));
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod data;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod targets;

// Re-export commonly used items at the crate level
pub use config::Config;
pub use data::{Dataset, EarningsEvent, EnrichedEvent, PriceObservation, TargetColumn};
pub use features::{FeatureConfig, FeatureEngineer};
pub use models::{GbmParams, GbmRegressor, ModelError, ModelMetrics, TargetModelSet};
pub use targets::{enrich_all_tickers, OutlierFilter, TargetGenerator};
