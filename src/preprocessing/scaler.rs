//! Feature scaling

use serde::{Deserialize, Serialize};

use crate::dataset::DataPoint;
use crate::error::{ArenaError, Result};

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalerKind {
    /// Min-max scaling: (x - min) / (max - min)
    MinMax,
    /// Standard scaling (z-score): (x - mean) / std
    Standard,
}

/// Per-feature fitted parameters.
///
/// `scale == 0.0` marks a degenerate feature (constant or non-finite range);
/// such features are mapped to 0 rather than dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureParams {
    center: f64,
    scale: f64,
}

/// Unfitted scaler
#[derive(Debug, Clone, Copy)]
pub struct Scaler {
    kind: ScalerKind,
}

/// Scaler with parameters fitted on a training partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedScaler {
    kind: ScalerKind,
    params: Vec<FeatureParams>,
}

impl Scaler {
    pub fn new(kind: ScalerKind) -> Self {
        Self { kind }
    }

    /// Compute per-feature parameters over the training rows.
    pub fn fit(&self, train: &[DataPoint]) -> Result<FittedScaler> {
        if train.is_empty() {
            return Err(ArenaError::InsufficientData(
                "cannot fit a scaler on an empty training partition".to_string(),
            ));
        }
        let width = train[0].features.len();

        let params = (0..width)
            .map(|col| {
                let values: Vec<f64> = train.iter().map(|p| p.features[col]).collect();
                match self.kind {
                    ScalerKind::MinMax => minmax_params(&values),
                    ScalerKind::Standard => standard_params(&values),
                }
            })
            .collect();

        Ok(FittedScaler {
            kind: self.kind,
            params,
        })
    }
}

impl FittedScaler {
    /// Apply the fitted parameters, producing new rows.
    pub fn apply(&self, rows: &[DataPoint]) -> Vec<DataPoint> {
        rows.iter()
            .map(|point| {
                let features = point
                    .features
                    .iter()
                    .zip(&self.params)
                    .map(|(&v, p)| {
                        if p.scale == 0.0 {
                            0.0
                        } else {
                            (v - p.center) / p.scale
                        }
                    })
                    .collect();
                point.with_features(features)
            })
            .collect()
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }
}

fn minmax_params(values: &[f64]) -> FeatureParams {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range == 0.0 {
        FeatureParams {
            center: 0.0,
            scale: 0.0,
        }
    } else {
        FeatureParams {
            center: min,
            scale: range,
        }
    }
}

fn standard_params(values: &[f64]) -> FeatureParams {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if !std.is_finite() || std == 0.0 {
        FeatureParams {
            center: 0.0,
            scale: 0.0,
        }
    } else {
        FeatureParams {
            center: mean,
            scale: std,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label;

    fn rows(columns: &[Vec<f64>]) -> Vec<DataPoint> {
        let n = columns[0].len();
        (0..n)
            .map(|i| {
                DataPoint::new(
                    columns.iter().map(|c| c[i]).collect(),
                    Label::Numeric(0.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_minmax_scales_to_unit_interval() {
        let train = rows(&[vec![1.0, 2.0, 3.0, 4.0, 5.0]]);
        let fitted = Scaler::new(ScalerKind::MinMax).fit(&train).unwrap();
        let scaled = fitted.apply(&train);

        assert!((scaled[0].features[0] - 0.0).abs() < 1e-12);
        assert!((scaled[4].features[0] - 1.0).abs() < 1e-12);
        assert!((scaled[2].features[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_standard_centers_train() {
        let train = rows(&[vec![2.0, 4.0, 6.0, 8.0]]);
        let fitted = Scaler::new(ScalerKind::Standard).fit(&train).unwrap();
        let scaled = fitted.apply(&train);

        let mean: f64 =
            scaled.iter().map(|p| p.features[0]).sum::<f64>() / scaled.len() as f64;
        assert!(mean.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_feature_maps_to_zero() {
        let train = rows(&[vec![7.0, 7.0, 7.0], vec![1.0, 2.0, 3.0]]);
        let fitted = Scaler::new(ScalerKind::MinMax).fit(&train).unwrap();
        let scaled = fitted.apply(&train);

        assert!(scaled.iter().all(|p| p.features[0] == 0.0));
        assert!((scaled[2].features[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_train_rejected() {
        let result = Scaler::new(ScalerKind::Standard).fit(&[]);
        assert!(matches!(result, Err(ArenaError::InsufficientData(_))));
    }
}
