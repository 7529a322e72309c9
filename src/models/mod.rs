//! Gradient Boosting Machine models

pub mod gbm;

pub use gbm::{GbmParams, GbmRegressor, ModelError, ModelMetrics, TargetModelSet};
