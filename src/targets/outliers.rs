//! Range-based outlier filtering on target columns

use tracing::info;

use crate::data::{EnrichedEvent, TargetColumn};

/// Drops enriched rows whose target values fall outside a strict range
///
/// A row survives only if every configured target column holds a value
/// strictly inside (lower, upper). A missing value never satisfies a
/// strict inequality, so rows without computed targets are dropped here.
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    targets: Vec<TargetColumn>,
    lower_bound: f64,
    upper_bound: f64,
}

impl OutlierFilter {
    pub fn new(targets: Vec<TargetColumn>, lower_bound: f64, upper_bound: f64) -> Self {
        Self {
            targets,
            lower_bound,
            upper_bound,
        }
    }

    /// Whether a single row passes every target bound
    pub fn retain(&self, row: &EnrichedEvent) -> bool {
        self.targets.iter().all(|target| {
            target
                .value(row)
                .map(|v| v > self.lower_bound && v < self.upper_bound)
                .unwrap_or(false)
        })
    }

    /// Filter an enriched table, keeping rows inside the bounds
    pub fn apply(&self, rows: Vec<EnrichedEvent>) -> Vec<EnrichedEvent> {
        let before = rows.len();
        let kept: Vec<EnrichedEvent> = rows.into_iter().filter(|r| self.retain(r)).collect();
        info!(
            "Dropped {} outlier rows ({} -> {})",
            before - kept.len(),
            before,
            kept.len()
        );
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(max: Option<f64>, min: Option<f64>) -> EnrichedEvent {
        EnrichedEvent {
            ticker: "T".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            adj_close: 100.0,
            volume: 10_000.0,
            eps_estimate: None,
            reported_eps: None,
            surprise_pct: Some(1.0),
            period_max_price: max,
            period_min_price: min,
        }
    }

    fn filter() -> OutlierFilter {
        OutlierFilter::new(
            vec![TargetColumn::PeriodMaxPrice, TargetColumn::PeriodMinPrice],
            0.0,
            1000.0,
        )
    }

    #[test]
    fn test_row_inside_bounds_kept() {
        assert!(filter().retain(&row(Some(120.0), Some(80.0))));
    }

    #[test]
    fn test_bounds_are_strict() {
        let f = filter();
        assert!(!f.retain(&row(Some(1000.0), Some(80.0))));
        assert!(!f.retain(&row(Some(120.0), Some(0.0))));
    }

    #[test]
    fn test_missing_value_drops_row() {
        let f = filter();
        assert!(!f.retain(&row(None, None)));
        assert!(!f.retain(&row(Some(120.0), None)));
    }

    #[test]
    fn test_apply_filters_table() {
        let rows = vec![
            row(Some(120.0), Some(80.0)),
            row(None, None),
            row(Some(2000.0), Some(80.0)),
        ];
        let kept = filter().apply(rows);
        assert_eq!(kept.len(), 1);
    }
}
