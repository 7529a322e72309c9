//! Technical indicators and feature engineering

pub mod engineering;
pub mod technical;

pub use engineering::{FeatureConfig, FeatureEngineer};
