//! Prediction evaluation: error metrics, sign analysis, and thresholding
//!
//! Mirrors how the trained models are judged for trading use: besides
//! RMSE/MAE/MAPE/R², the directional checks ask whether the predicted
//! extremum is on the right side of zero and whether it stays
//! conservative (a predicted high that the market actually reached, a
//! predicted low the market never broke).

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{Reader, Writer};
use serde::Serialize;
use tracing::info;

use crate::data::Dataset;
use crate::models::ModelMetrics;

/// Actual and predicted target values for one evaluated sample
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub ticker: String,
    pub date: NaiveDate,
    /// Actual value per target
    pub actuals: Vec<f64>,
    /// Predicted value per target
    pub predicted: Vec<f64>,
}

/// Predictions for every sample of a dataset, joined with actuals
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    pub target_names: Vec<String>,
    pub rows: Vec<PredictionRow>,
}

impl PredictionTable {
    /// Join model predictions (indexed [target][sample]) back onto the
    /// dataset's sample keys
    pub fn from_predictions(dataset: &Dataset, predictions: &[Vec<f64>]) -> Self {
        let rows = (0..dataset.len())
            .map(|i| PredictionRow {
                ticker: dataset.tickers[i].clone(),
                date: dataset.dates[i],
                actuals: dataset.targets[i].clone(),
                predicted: predictions.iter().map(|p| p[i]).collect(),
            })
            .collect();

        Self {
            target_names: dataset.target_names.clone(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Actual and predicted vectors for one target column
    pub fn column(&self, target_idx: usize) -> (Vec<f64>, Vec<f64>) {
        let actual = self.rows.iter().map(|r| r.actuals[target_idx]).collect();
        let predicted = self.rows.iter().map(|r| r.predicted[target_idx]).collect();
        (actual, predicted)
    }

    /// Split into train (date < cutoff) and test (date >= cutoff) tables
    pub fn split_at_date(&self, cutoff: NaiveDate) -> (PredictionTable, PredictionTable) {
        let (train, test): (Vec<PredictionRow>, Vec<PredictionRow>) = self
            .rows
            .iter()
            .cloned()
            .partition(|r| r.date < cutoff);

        (
            PredictionTable {
                target_names: self.target_names.clone(),
                rows: train,
            },
            PredictionTable {
                target_names: self.target_names.clone(),
                rows: test,
            },
        )
    }

    /// Save predictions as a delimited file with one actual and one
    /// `Predictions_`-prefixed column per target
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
        }

        let file = File::create(&path)
            .with_context(|| format!("Failed to create file: {:?}", path.as_ref()))?;
        let mut writer = Writer::from_writer(file);

        let mut header = vec!["Ticker".to_string(), "Date".to_string()];
        header.extend(self.target_names.iter().cloned());
        header.extend(self.target_names.iter().map(|t| format!("Predictions_{}", t)));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.ticker.clone(), row.date.to_string()];
            record.extend(row.actuals.iter().map(|v| v.to_string()));
            record.extend(row.predicted.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
        writer.flush()?;

        info!("Saved {} prediction rows to {:?}", self.rows.len(), path.as_ref());
        Ok(())
    }

    /// Load a predictions file written by [`save_csv`](Self::save_csv)
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open predictions file: {:?}", path.as_ref()))?;
        let mut reader = Reader::from_reader(file);

        let headers = reader.headers()?.clone();
        let target_names: Vec<String> = headers
            .iter()
            .skip(2)
            .take_while(|h| !h.starts_with("Predictions_"))
            .map(|h| h.to_string())
            .collect();
        if target_names.is_empty() {
            bail!("Predictions file has no target columns: {:?}", path.as_ref());
        }
        let n_targets = target_names.len();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.context("Failed to read prediction row")?;
            let ticker = record[0].to_string();
            let date: NaiveDate = record[1]
                .parse()
                .with_context(|| format!("Malformed date in predictions file: {}", &record[1]))?;

            let parse = |s: &str| -> Result<f64> {
                s.parse::<f64>()
                    .with_context(|| format!("Malformed value in predictions file: {}", s))
            };

            let actuals: Vec<f64> = (0..n_targets)
                .map(|i| parse(&record[2 + i]))
                .collect::<Result<_>>()?;
            let predicted: Vec<f64> = (0..n_targets)
                .map(|i| parse(&record[2 + n_targets + i]))
                .collect::<Result<_>>()?;

            rows.push(PredictionRow {
                ticker,
                date,
                actuals,
                predicted,
            });
        }

        Ok(Self { target_names, rows })
    }
}

/// Percentage of samples where prediction and actual share a sign
pub fn correct_sign_pct(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| *a * *p > 0.0)
        .count();
    correct as f64 / actual.len() as f64 * 100.0
}

/// Percentage of samples where the prediction is positive, shares the
/// actual's sign, and undershoots it — a predicted sell level the market
/// actually reached
pub fn sellable_and_profitable_pct(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sellable = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| *a * *p > 0.0 && **p > 0.0 && *a - *p > 0.0)
        .count();
    sellable as f64 / actual.len() as f64 * 100.0
}

/// Percentage of predicted highs that stay below the realized high, so
/// the predicted level can actually be sold at
pub fn safe_max_price_pct(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let safe = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| p < a)
        .count();
    safe as f64 / actual.len() as f64 * 100.0
}

/// Percentage of predicted lows sitting below 0.9x the realized low, so
/// the predicted stop level is unlikely to be hit
pub fn safe_min_price_pct(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let safe = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| **p < *a * 0.9)
        .count();
    safe as f64 / actual.len() as f64 * 100.0
}

/// One row of the threshold analysis table
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdRow {
    /// Minimum predicted value to include a sample
    pub threshold: f64,
    /// Samples above the threshold with the correct sign
    pub n_correct_sign: usize,
    pub correct_sign_pct: f64,
    pub sellable_and_profitable_pct: f64,
}

/// Filter samples by rising prediction thresholds and report how sign
/// accuracy changes with conviction
pub fn threshold_analysis(
    actual: &[f64],
    predicted: &[f64],
    thresholds: &[f64],
) -> Vec<ThresholdRow> {
    thresholds
        .iter()
        .map(|&threshold| {
            let filtered: Vec<(f64, f64)> = actual
                .iter()
                .zip(predicted.iter())
                .filter(|(_, p)| **p > threshold)
                .map(|(a, p)| (*a, *p))
                .collect();

            let (f_actual, f_pred): (Vec<f64>, Vec<f64>) = filtered.into_iter().unzip();
            let n_correct_sign = f_actual
                .iter()
                .zip(f_pred.iter())
                .filter(|(a, p)| *a * *p > 0.0)
                .count();

            ThresholdRow {
                threshold,
                n_correct_sign,
                correct_sign_pct: correct_sign_pct(&f_actual, &f_pred),
                sellable_and_profitable_pct: sellable_and_profitable_pct(&f_actual, &f_pred),
            }
        })
        .collect()
}

/// Metrics for every target of one dataset slice (train or test)
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset_name: String,
    pub per_target: Vec<(String, ModelMetrics)>,
    /// Correct-sign pct of the max-price target, when present
    pub correct_sign_max: Option<f64>,
    pub safe_max_pct: Option<f64>,
    pub safe_min_pct: Option<f64>,
    pub thresholds: Vec<ThresholdRow>,
}

/// Evaluate one slice of the prediction table
pub fn evaluate_table(table: &PredictionTable, dataset_name: &str) -> DatasetReport {
    let per_target = table
        .target_names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let (actual, predicted) = table.column(idx);
            (name.clone(), ModelMetrics::regression(&actual, &predicted))
        })
        .collect();

    let max_idx = table
        .target_names
        .iter()
        .position(|n| n.contains("max_price"));
    let min_idx = table
        .target_names
        .iter()
        .position(|n| n.contains("min_price"));

    let mut correct_sign_max = None;
    let mut safe_max_pct = None;
    let mut thresholds = Vec::new();
    if let Some(idx) = max_idx {
        let (actual, predicted) = table.column(idx);
        correct_sign_max = Some(correct_sign_pct(&actual, &predicted));
        safe_max_pct = Some(safe_max_price_pct(&actual, &predicted));
        let steps: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();
        thresholds = threshold_analysis(&actual, &predicted, &steps);
    }

    let safe_min_pct = min_idx.map(|idx| {
        let (actual, predicted) = table.column(idx);
        safe_min_price_pct(&actual, &predicted)
    });

    DatasetReport {
        dataset_name: dataset_name.to_string(),
        per_target,
        correct_sign_max,
        safe_max_pct,
        safe_min_pct,
        thresholds,
    }
}

/// Save evaluation reports as pretty-printed JSON
pub fn save_reports<P: AsRef<Path>>(reports: &[DatasetReport], path: P) -> Result<()> {
    if let Some(dir) = path.as_ref().parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory: {:?}", dir))?;
    }

    let file = File::create(&path)
        .with_context(|| format!("Failed to create report file: {:?}", path.as_ref()))?;
    serde_json::to_writer_pretty(file, reports)
        .with_context(|| format!("Failed to write report file: {:?}", path.as_ref()))?;

    info!("Saved evaluation report to {:?}", path.as_ref());
    Ok(())
}

/// Print a dataset report in tabular form
pub fn print_report(report: &DatasetReport) {
    println!("on data: {}", report.dataset_name);
    for (target, metrics) in &report.per_target {
        println!("  {}:", target);
        println!("    RMSE: {:.4}", metrics.rmse.unwrap_or(f64::NAN));
        println!("    MAE:  {:.4}", metrics.mae.unwrap_or(f64::NAN));
        println!("    MAPE: {:.4}", metrics.mape.unwrap_or(f64::NAN));
        println!("    R2:   {:.4}", metrics.r2.unwrap_or(f64::NAN));
    }
    if let Some(pct) = report.correct_sign_max {
        println!("  Correct max price sign pct: {:.4}%", pct);
    }
    if let Some(pct) = report.safe_max_pct {
        println!("  Safe max price pct: {:.4}%", pct);
    }
    if let Some(pct) = report.safe_min_pct {
        println!("  Safe min price pct: {:.4}%", pct);
    }

    if !report.thresholds.is_empty() {
        println!(
            "  {:>10} {:>15} {:>18} {:>14}",
            "Threshold", "n_correct_sign", "Correct sign pct", "Sellable pct"
        );
        for row in &report.thresholds {
            println!(
                "  {:>10.1} {:>15} {:>18.2} {:>14.2}",
                row.threshold,
                row.n_correct_sign,
                row.correct_sign_pct,
                row.sellable_and_profitable_pct
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> PredictionTable {
        PredictionTable {
            target_names: vec![
                "period_max_price_pct".to_string(),
                "period_min_price_pct".to_string(),
            ],
            rows: vec![
                PredictionRow {
                    ticker: "A".to_string(),
                    date: "2024-01-10".parse().unwrap(),
                    actuals: vec![12.0, -8.0],
                    predicted: vec![9.0, -10.0],
                },
                PredictionRow {
                    ticker: "A".to_string(),
                    date: "2024-04-10".parse().unwrap(),
                    actuals: vec![-3.0, -15.0],
                    predicted: vec![2.0, -12.0],
                },
                PredictionRow {
                    ticker: "B".to_string(),
                    date: "2024-04-12".parse().unwrap(),
                    actuals: vec![25.0, -2.0],
                    predicted: vec![18.0, -1.0],
                },
            ],
        }
    }

    #[test]
    fn test_correct_sign_pct() {
        let (actual, predicted) = table().column(0);
        // Rows 1 and 3 share signs; row 2 does not.
        assert!((correct_sign_pct(&actual, &predicted) - 66.66666).abs() < 1e-3);
    }

    #[test]
    fn test_safe_max_price_pct() {
        let (actual, predicted) = table().column(0);
        // Predictions 9 < 12 and 18 < 25 are reachable; 2 > -3 is not.
        assert!((safe_max_price_pct(&actual, &predicted) - 66.66666).abs() < 1e-3);
    }

    #[test]
    fn test_safe_min_price_pct() {
        let actual = vec![-10.0, -10.0];
        let predicted = vec![-9.5, -8.0];
        // Safe needs pred < actual * 0.9 = -9.0; only -9.5 qualifies.
        assert!((safe_min_price_pct(&actual, &predicted) - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_sellable_and_profitable() {
        let (actual, predicted) = table().column(0);
        // Rows 1 and 3: same sign, positive prediction, actual above it.
        assert!((sellable_and_profitable_pct(&actual, &predicted) - 66.66666).abs() < 1e-3);
    }

    #[test]
    fn test_threshold_analysis_monotone_filter() {
        let (actual, predicted) = table().column(0);
        let rows = threshold_analysis(&actual, &predicted, &[0.0, 10.0]);

        assert_eq!(rows.len(), 2);
        // Above 0: predictions 9, 2, 18 (two correct signs).
        assert_eq!(rows[0].n_correct_sign, 2);
        // Above 10: only prediction 18.
        assert_eq!(rows[1].n_correct_sign, 1);
        assert!((rows[1].correct_sign_pct - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_slice_analysis() {
        assert_eq!(correct_sign_pct(&[], &[]), 0.0);
        assert_eq!(safe_max_price_pct(&[], &[]), 0.0);
    }

    #[test]
    fn test_split_at_date() {
        let (train, test) = table().split_at_date("2024-03-01".parse().unwrap());
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let table = table();
        let dir = tempdir().unwrap();
        let path = dir.path().join("data_with_predictions.csv");

        table.save_csv(&path).unwrap();
        let loaded = PredictionTable::load_csv(&path).unwrap();

        assert_eq!(loaded, table);
    }

    #[test]
    fn test_save_reports_writes_json() {
        let report = evaluate_table(&table(), "Test");
        let dir = tempdir().unwrap();
        let path = dir.path().join("evaluation_report.json");

        save_reports(&[report], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed[0]["dataset_name"], "Test");
        assert!(parsed[0]["per_target"].is_array());
    }

    #[test]
    fn test_evaluate_table_reports_every_target() {
        let report = evaluate_table(&table(), "Test");
        assert_eq!(report.per_target.len(), 2);
        assert!(report.correct_sign_max.is_some());
        assert!(report.safe_min_pct.is_some());
        assert_eq!(report.thresholds.len(), 10);
    }
}
