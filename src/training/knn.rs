//! K-nearest neighbors

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ArenaError, Result};

/// Neighbor aggregation: majority vote for classification, mean for
/// regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnnTask {
    Classify,
    Regress,
}

/// K-nearest neighbors model. Fitting stores the training set; prediction
/// scans it per query row, parallelized over queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnModel {
    pub n_neighbors: usize,
    task: KnnTask,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnModel {
    pub fn new(n_neighbors: usize, task: KnnTask) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            task,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(ArenaError::ShapeMismatch {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self
            .x_train
            .as_ref()
            .ok_or_else(|| ArenaError::InsufficientData("model not fitted".to_string()))?;
        let y_train = self.y_train.as_ref().unwrap();
        let k = self.n_neighbors.min(x_train.nrows());
        let task = self.task;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let query = x.row(i);
                let mut distances: Vec<(f64, f64)> = (0..x_train.nrows())
                    .map(|j| {
                        let d = query
                            .iter()
                            .zip(x_train.row(j).iter())
                            .map(|(a, b)| (a - b).powi(2))
                            .sum::<f64>();
                        (d, y_train[j])
                    })
                    .collect();
                distances.sort_by(|a, b| a.0.total_cmp(&b.0));
                aggregate(&distances[..k], task)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

fn aggregate(neighbors: &[(f64, f64)], task: KnnTask) -> f64 {
    match task {
        KnnTask::Regress => {
            neighbors.iter().map(|(_, y)| y).sum::<f64>() / neighbors.len() as f64
        }
        KnnTask::Classify => {
            // Majority vote over the label values; first-seen wins ties so
            // the result is deterministic.
            let mut votes: Vec<(f64, usize)> = Vec::new();
            for &(_, y) in neighbors {
                match votes.iter_mut().find(|(label, _)| *label == y) {
                    Some((_, count)) => *count += 1,
                    None => votes.push((y, 1)),
                }
            }
            let mut best = (0.0, 0usize);
            for &(label, count) in &votes {
                if count > best.1 {
                    best = (label, count);
                }
            }
            best.0
        }
    }
}
