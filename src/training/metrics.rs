//! Evaluation metrics

use std::time::Duration;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::dataset::ProblemType;

/// Computed metric values. Classification fills accuracy/precision/recall/
/// f1; regression fills mae/mse/rmse/r2. Precision, recall and f1 treat
/// label 1 as the positive class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricBundle {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub mae: Option<f64>,
    pub mse: Option<f64>,
    pub rmse: Option<f64>,
    pub r2: Option<f64>,
}

impl MetricBundle {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, problem_type: ProblemType) -> Self {
        match problem_type {
            ProblemType::Classification => Self::compute_classification(y_true, y_pred),
            ProblemType::Regression => Self::compute_regression(y_true, y_pred),
        }
    }

    pub fn compute_classification(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| (*t - *p).abs() < 0.5)
            .count();
        let accuracy = correct as f64 / n;

        let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            let t_pos = *t > 0.5;
            let p_pos = *p > 0.5;
            match (t_pos, p_pos) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            accuracy: Some(accuracy),
            precision: Some(precision),
            recall: Some(recall),
            f1: Some(f1),
            ..Default::default()
        }
    }

    pub fn compute_regression(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let n = y_true.len() as f64;
        let errors: Vec<f64> = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(t, p)| t - p)
            .collect();

        let mse = errors.iter().map(|e| e * e).sum::<f64>() / n;
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.iter().map(|e| e.powi(2)).sum();
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else {
            0.0
        };

        Self {
            mae: Some(mae),
            mse: Some(mse),
            rmse: Some(mse.sqrt()),
            r2: Some(r2),
            ..Default::default()
        }
    }
}

/// Transient result of evaluating a trained model on one partition. Folded
/// into a submission's score and metrics, never stored on its own.
#[derive(Debug, Clone)]
pub struct ModelEvaluation {
    pub metrics: MetricBundle,
    pub predictions: Vec<f64>,
    pub actual: Vec<f64>,
    pub training_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classification_metrics_known_values() {
        let y_true = array![1.0, 0.0, 1.0, 1.0, 0.0, 0.0];
        let y_pred = array![1.0, 0.0, 0.0, 1.0, 1.0, 0.0];
        let m = MetricBundle::compute_classification(&y_true, &y_pred);

        // tp=2, fp=1, fn=1, tn=2
        assert!((m.accuracy.unwrap() - 4.0 / 6.0).abs() < 1e-12);
        assert!((m.precision.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert!(m.mae.is_none());
    }

    #[test]
    fn test_regression_metrics_known_values() {
        let y_true = array![1.0, 2.0, 3.0];
        let y_pred = array![1.0, 2.0, 4.0];
        let m = MetricBundle::compute_regression(&y_true, &y_pred);

        assert!((m.mae.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.mse.unwrap() - 1.0 / 3.0).abs() < 1e-12);
        assert!((m.rmse.unwrap() - (1.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!(m.accuracy.is_none());
    }

    #[test]
    fn test_perfect_predictions() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        let m = MetricBundle::compute_classification(&y, &y);
        assert_eq!(m.accuracy, Some(1.0));
        assert_eq!(m.f1, Some(1.0));
    }

    #[test]
    fn test_degenerate_precision_recall() {
        // Model never predicts the positive class.
        let y_true = array![1.0, 1.0];
        let y_pred = array![0.0, 0.0];
        let m = MetricBundle::compute_classification(&y_true, &y_pred);
        assert_eq!(m.precision, Some(0.0));
        assert_eq!(m.recall, Some(0.0));
        assert_eq!(m.f1, Some(0.0));
    }
}
