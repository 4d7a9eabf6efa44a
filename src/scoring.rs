//! Score normalization
//!
//! Maps a raw metric bundle and a chosen primary metric to a single
//! comparable score in [0, 1]. Quality metrics already live in [0, 1] and
//! pass through; error metrics are mapped by `1 / (1 + error)`, which is 1
//! at zero error and strictly decreasing toward 0 as error grows, with no
//! assumption about the error's scale.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};
use crate::training::MetricBundle;

/// Metric used to derive the leaderboard score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryMetric {
    Accuracy,
    Precision,
    Recall,
    F1,
    Mae,
    Mse,
    Rmse,
}

impl PrimaryMetric {
    /// Whether larger raw values mean a better model.
    pub fn higher_is_better(&self) -> bool {
        matches!(
            self,
            PrimaryMetric::Accuracy
                | PrimaryMetric::Precision
                | PrimaryMetric::Recall
                | PrimaryMetric::F1
        )
    }

    fn extract(&self, metrics: &MetricBundle) -> Option<f64> {
        match self {
            PrimaryMetric::Accuracy => metrics.accuracy,
            PrimaryMetric::Precision => metrics.precision,
            PrimaryMetric::Recall => metrics.recall,
            PrimaryMetric::F1 => metrics.f1,
            PrimaryMetric::Mae => metrics.mae,
            PrimaryMetric::Mse => metrics.mse,
            PrimaryMetric::Rmse => metrics.rmse,
        }
    }
}

impl fmt::Display for PrimaryMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimaryMetric::Accuracy => "accuracy",
            PrimaryMetric::Precision => "precision",
            PrimaryMetric::Recall => "recall",
            PrimaryMetric::F1 => "f1",
            PrimaryMetric::Mae => "mae",
            PrimaryMetric::Mse => "mse",
            PrimaryMetric::Rmse => "rmse",
        };
        f.write_str(name)
    }
}

impl FromStr for PrimaryMetric {
    type Err = ArenaError;

    /// Parse a metric name. Unknown names are an error, never a default.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "accuracy" => Ok(PrimaryMetric::Accuracy),
            "precision" => Ok(PrimaryMetric::Precision),
            "recall" => Ok(PrimaryMetric::Recall),
            "f1" | "f1_score" => Ok(PrimaryMetric::F1),
            "mae" => Ok(PrimaryMetric::Mae),
            "mse" => Ok(PrimaryMetric::Mse),
            "rmse" => Ok(PrimaryMetric::Rmse),
            other => Err(ArenaError::UnknownMetric(other.to_string())),
        }
    }
}

/// Convert a metric bundle into a normalized score in [0, 1].
pub fn compute_score(metrics: &MetricBundle, metric: PrimaryMetric) -> Result<f64> {
    let value = metric.extract(metrics).ok_or_else(|| {
        ArenaError::UnknownMetric(format!(
            "{} was not computed for this problem type",
            metric
        ))
    })?;

    if metric.higher_is_better() {
        Ok(value.clamp(0.0, 1.0))
    } else {
        Ok(1.0 / (1.0 + value.max(0.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regression_metrics(mae: f64) -> MetricBundle {
        MetricBundle {
            mae: Some(mae),
            ..Default::default()
        }
    }

    #[test]
    fn test_quality_metric_passes_through() {
        let metrics = MetricBundle {
            f1: Some(0.84),
            ..Default::default()
        };
        let score = compute_score(&metrics, PrimaryMetric::F1).unwrap();
        assert!((score - 0.84).abs() < 1e-12);
    }

    #[test]
    fn test_zero_error_is_perfect_score() {
        let score = compute_score(&regression_metrics(0.0), PrimaryMetric::Mae).unwrap();
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_score_strictly_decreases_with_error() {
        let errors = [0.0, 0.1, 1.0, 10.0, 1000.0, 1e9];
        let scores: Vec<f64> = errors
            .iter()
            .map(|&e| compute_score(&regression_metrics(e), PrimaryMetric::Mae).unwrap())
            .collect();

        for pair in scores.windows(2) {
            assert!(pair[0] > pair[1], "score must decrease: {:?}", scores);
        }
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_missing_metric_is_an_error() {
        // Regression metrics asked for a classification score.
        let result = compute_score(&regression_metrics(0.5), PrimaryMetric::Accuracy);
        assert!(matches!(result, Err(ArenaError::UnknownMetric(_))));
    }

    #[test]
    fn test_unknown_metric_name_is_an_error() {
        let result = "magic".parse::<PrimaryMetric>();
        assert!(matches!(result, Err(ArenaError::UnknownMetric(_))));
    }

    #[test]
    fn test_f1_score_alias() {
        assert_eq!("f1_score".parse::<PrimaryMetric>().unwrap(), PrimaryMetric::F1);
    }
}
