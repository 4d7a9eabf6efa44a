//! Categorical feature encoding

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dataset::DataPoint;
use crate::error::{ArenaError, Result};

/// Label encoder for selected feature columns.
///
/// Codes are assigned in first-occurrence order over the training partition.
/// Values that never appeared in training map to the reserved default code 0.
#[derive(Debug, Clone)]
pub struct Encoder {
    columns: Vec<usize>,
}

/// Encoder with value→code maps fitted on a training partition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedEncoder {
    columns: Vec<usize>,
    codes: HashMap<usize, HashMap<String, usize>>,
}

impl Encoder {
    pub fn new(columns: Vec<usize>) -> Self {
        Self { columns }
    }

    /// Build value→code maps from the training rows.
    pub fn fit(&self, train: &[DataPoint]) -> Result<FittedEncoder> {
        if train.is_empty() {
            return Err(ArenaError::InsufficientData(
                "cannot fit an encoder on an empty training partition".to_string(),
            ));
        }
        let width = train[0].features.len();
        if let Some(&bad) = self.columns.iter().find(|&&c| c >= width) {
            return Err(ArenaError::Configuration(format!(
                "encoded feature index {} out of range for {} features",
                bad, width
            )));
        }

        let mut codes: HashMap<usize, HashMap<String, usize>> = HashMap::new();
        for &col in &self.columns {
            let map = codes.entry(col).or_default();
            for point in train {
                let key = value_key(point.features[col]);
                let next = map.len();
                map.entry(key).or_insert(next);
            }
        }

        Ok(FittedEncoder {
            columns: self.columns.clone(),
            codes,
        })
    }
}

impl FittedEncoder {
    /// Apply the fitted maps, producing new rows.
    pub fn apply(&self, rows: &[DataPoint]) -> Vec<DataPoint> {
        rows.iter()
            .map(|point| {
                let features = point
                    .features
                    .iter()
                    .enumerate()
                    .map(|(i, &v)| match self.codes.get(&i) {
                        Some(map) => *map.get(&value_key(v)).unwrap_or(&0) as f64,
                        None => v,
                    })
                    .collect();
                point.with_features(features)
            })
            .collect()
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

fn value_key(value: f64) -> String {
    format!("{}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label;

    fn point(features: Vec<f64>) -> DataPoint {
        DataPoint::new(features, Label::Numeric(0.0))
    }

    #[test]
    fn test_first_occurrence_order() {
        let train = vec![
            point(vec![30.0, 1.0]),
            point(vec![10.0, 2.0]),
            point(vec![30.0, 3.0]),
            point(vec![20.0, 4.0]),
        ];
        let fitted = Encoder::new(vec![0]).fit(&train).unwrap();
        let encoded = fitted.apply(&train);

        // 30.0 seen first -> 0, 10.0 -> 1, 20.0 -> 2.
        assert_eq!(encoded[0].features[0], 0.0);
        assert_eq!(encoded[1].features[0], 1.0);
        assert_eq!(encoded[2].features[0], 0.0);
        assert_eq!(encoded[3].features[0], 2.0);
        // Unencoded column untouched.
        assert_eq!(encoded[3].features[1], 4.0);
    }

    #[test]
    fn test_unseen_value_maps_to_default_code() {
        let train = vec![point(vec![1.0]), point(vec![2.0])];
        let fitted = Encoder::new(vec![0]).fit(&train).unwrap();

        let validation = vec![point(vec![99.0])];
        let encoded = fitted.apply(&validation);
        assert_eq!(encoded[0].features[0], 0.0);
    }

    #[test]
    fn test_out_of_range_column_rejected() {
        let train = vec![point(vec![1.0])];
        let result = Encoder::new(vec![3]).fit(&train);
        assert!(matches!(result, Err(ArenaError::Configuration(_))));
    }
}
