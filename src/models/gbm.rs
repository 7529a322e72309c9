//! Gradient Boosting Machine implementation
//!
//! Least-squares gradient boosting over smartcore regression trees:
//! each stage fits a shallow tree to the current residuals and is added
//! with a shrinkage factor. One regressor is trained per target column,
//! since the tree models have no multi-output loss.

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};
use thiserror::Error;
use tracing::info;

use crate::data::Dataset;

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model not trained")]
    NotTrained,
}

/// GBM hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: u16,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 6,
            learning_rate: 0.03,
            min_samples_split: 2,
            min_samples_leaf: 20,
        }
    }
}

/// Model evaluation metrics for one target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Mean squared error
    pub mse: Option<f64>,
    /// Root mean squared error
    pub rmse: Option<f64>,
    /// Mean absolute error
    pub mae: Option<f64>,
    /// Mean absolute percentage error
    pub mape: Option<f64>,
    /// R-squared score
    pub r2: Option<f64>,
    /// Directional accuracy (% of correct sign predictions)
    pub directional_accuracy: Option<f64>,
}

impl ModelMetrics {
    fn empty() -> Self {
        Self {
            mse: None,
            rmse: None,
            mae: None,
            mape: None,
            r2: None,
            directional_accuracy: None,
        }
    }

    /// Calculate regression metrics
    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Self {
        let n = y_true.len();
        if n == 0 || n != y_pred.len() {
            return Self::empty();
        }

        let mse_val: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n as f64;

        let mae_val: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n as f64;

        let mape_pairs: Vec<(f64, f64)> = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, _)| **t != 0.0)
            .map(|(t, p)| (*t, *p))
            .collect();
        let mape_val = if mape_pairs.is_empty() {
            None
        } else {
            Some(
                mape_pairs
                    .iter()
                    .map(|(t, p)| ((t - p) / t).abs())
                    .sum::<f64>()
                    / mape_pairs.len() as f64,
            )
        };

        let mean_true: f64 = y_true.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let r2_val = if ss_tot != 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        let mut correct_direction = 0;
        let mut total_direction = 0;
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            if *t != 0.0 {
                total_direction += 1;
                if t * p > 0.0 {
                    correct_direction += 1;
                }
            }
        }
        let dir_acc = if total_direction > 0 {
            Some(correct_direction as f64 / total_direction as f64 * 100.0)
        } else {
            None
        };

        Self {
            mse: Some(mse_val),
            rmse: Some(mse_val.sqrt()),
            mae: Some(mae_val),
            mape: mape_val,
            r2: Some(r2_val),
            directional_accuracy: dir_acc,
        }
    }
}

/// Gradient Boosting Regressor for a single target
///
/// Stagewise additive model: starts from the target mean and repeatedly
/// fits a depth-limited regression tree to the residuals, shrunk by the
/// learning rate.
#[derive(Debug)]
pub struct GbmRegressor {
    params: GbmParams,
    base_prediction: f64,
    trees: Vec<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>>,
    feature_names: Vec<String>,
}

impl GbmRegressor {
    /// Create a new GBM regressor with default parameters
    pub fn new() -> Self {
        Self::with_params(GbmParams::default())
    }

    /// Create a new GBM regressor with custom parameters
    pub fn with_params(params: GbmParams) -> Self {
        Self {
            params,
            base_prediction: 0.0,
            trees: Vec::new(),
            feature_names: Vec::new(),
        }
    }

    fn tree_params(&self) -> DecisionTreeRegressorParameters {
        DecisionTreeRegressorParameters::default()
            .with_max_depth(self.params.max_depth)
            .with_min_samples_split(self.params.min_samples_split)
            .with_min_samples_leaf(self.params.min_samples_leaf)
    }

    /// Train the model on a feature matrix and one target vector
    pub fn fit(
        &mut self,
        feature_names: &[String],
        features: &[Vec<f64>],
        targets: &[f64],
    ) -> Result<(), ModelError> {
        if features.is_empty() {
            return Err(ModelError::InvalidData("Empty training set".to_string()));
        }
        if features.len() != targets.len() {
            return Err(ModelError::InvalidData(
                "Feature and target lengths differ".to_string(),
            ));
        }

        let x = DenseMatrix::from_2d_vec(&features.to_vec()).map_err(|e| {
            ModelError::InvalidData(format!("Failed to create feature matrix: {:?}", e))
        })?;

        info!(
            "Training GBM regressor with {} samples and {} features",
            features.len(),
            feature_names.len()
        );

        self.base_prediction = targets.iter().sum::<f64>() / targets.len() as f64;
        self.trees.clear();

        let mut residuals: Vec<f64> = targets.iter().map(|t| t - self.base_prediction).collect();

        for _ in 0..self.params.n_estimators {
            let tree = DecisionTreeRegressor::fit(&x, &residuals, self.tree_params())
                .map_err(|e| ModelError::TrainingFailed(format!("{:?}", e)))?;
            let stage_pred = tree
                .predict(&x)
                .map_err(|e| ModelError::TrainingFailed(format!("{:?}", e)))?;

            for (r, p) in residuals.iter_mut().zip(stage_pred.iter()) {
                *r -= self.params.learning_rate * p;
            }
            self.trees.push(tree);
        }

        self.feature_names = feature_names.to_vec();

        Ok(())
    }

    /// Make predictions on new data
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotTrained);
        }

        let x = DenseMatrix::from_2d_vec(&features.to_vec()).map_err(|e| {
            ModelError::PredictionFailed(format!("Failed to create feature matrix: {:?}", e))
        })?;

        let mut predictions = vec![self.base_prediction; features.len()];
        for tree in &self.trees {
            let stage_pred = tree
                .predict(&x)
                .map_err(|e| ModelError::PredictionFailed(format!("{:?}", e)))?;
            for (total, p) in predictions.iter_mut().zip(stage_pred.iter()) {
                *total += self.params.learning_rate * p;
            }
        }

        Ok(predictions)
    }

    /// Get model parameters
    pub fn params(&self) -> &GbmParams {
        &self.params
    }

    /// Check if the model is trained
    pub fn is_trained(&self) -> bool {
        !self.trees.is_empty()
    }
}

impl Default for GbmRegressor {
    fn default() -> Self {
        Self::new()
    }
}

/// One trained regressor per target column of a dataset
#[derive(Debug)]
pub struct TargetModelSet {
    params: GbmParams,
    target_names: Vec<String>,
    models: Vec<GbmRegressor>,
}

impl TargetModelSet {
    pub fn new(params: GbmParams) -> Self {
        Self {
            params,
            target_names: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Train one regressor per target on the dataset
    pub fn fit(&mut self, dataset: &Dataset) -> Result<(), ModelError> {
        if dataset.is_empty() {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }

        self.target_names = dataset.target_names.clone();
        self.models.clear();

        for (idx, name) in dataset.target_names.iter().enumerate() {
            info!("Training model for target '{}'", name);
            let mut model = GbmRegressor::with_params(self.params.clone());
            model.fit(
                &dataset.feature_names,
                &dataset.features,
                &dataset.target_column(idx),
            )?;
            self.models.push(model);
        }

        Ok(())
    }

    /// Predict every target for a dataset; result is indexed
    /// [target][sample]
    pub fn predict(&self, dataset: &Dataset) -> Result<Vec<Vec<f64>>, ModelError> {
        if self.models.is_empty() {
            return Err(ModelError::NotTrained);
        }

        self.models
            .iter()
            .map(|m| m.predict(&dataset.features))
            .collect()
    }

    /// Evaluate each target's model on a dataset
    pub fn evaluate(&self, dataset: &Dataset) -> Result<Vec<(String, ModelMetrics)>, ModelError> {
        let predictions = self.predict(dataset)?;

        Ok(self
            .target_names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let metrics =
                    ModelMetrics::regression(&dataset.target_column(idx), &predictions[idx]);
                (name.clone(), metrics)
            })
            .collect())
    }

    /// Target names this set was trained on
    pub fn target_names(&self) -> &[String] {
        &self.target_names
    }
}
