//! Seeded synthetic dataset generation
//!
//! Produces small classification/regression datasets for demo problems and
//! tests. Generation is fully driven by an explicit seed so a problem built
//! from the same config always carries the same data.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::{DataPoint, Dataset, Label, ProblemType};
use crate::error::{ArenaError, Result};

/// Configuration for a generated dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub rows: usize,
    pub features: usize,
    /// Amount of label noise in [0, 1]
    pub noise: f64,
    pub seed: u64,
    pub problem_type: ProblemType,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            rows: 200,
            features: 4,
            noise: 0.1,
            seed: 42,
            problem_type: ProblemType::Classification,
        }
    }
}

/// Generate a dataset according to `config`.
///
/// Classification labels come from a logistic rule over a weighted feature
/// sum; regression labels from a polynomial rule. Both get additive noise
/// scaled by `config.noise`.
pub fn generate(config: &SyntheticConfig) -> Result<Dataset> {
    if config.rows == 0 || config.features == 0 {
        return Err(ArenaError::Configuration(
            "synthetic dataset needs at least one row and one feature".to_string(),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| ArenaError::Configuration(e.to_string()))?;

    let mut data = Vec::with_capacity(config.rows);
    for _ in 0..config.rows {
        let features: Vec<f64> = (0..config.features).map(|_| normal.sample(&mut rng)).collect();
        let label = match config.problem_type {
            ProblemType::Classification => classification_label(&features, config.noise, &mut rng),
            ProblemType::Regression => regression_label(&features, config.noise, &mut rng),
        };
        data.push(DataPoint::new(features, label));
    }

    let feature_names = (0..config.features).map(|i| format!("feature_{}", i)).collect();
    let classes = match config.problem_type {
        ProblemType::Classification => Some(vec!["negative".to_string(), "positive".to_string()]),
        ProblemType::Regression => None,
    };

    Dataset::new(data, feature_names, "target", classes, config.problem_type)
}

fn classification_label(features: &[f64], noise: f64, rng: &mut ChaCha8Rng) -> Label {
    let score: f64 = features
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i + 1) as f64 * 0.1)
        .sum();
    let probability = 1.0 / (1.0 + (-score).exp());
    let jitter = (rng.gen::<f64>() - 0.5) * noise;
    let p = (probability + jitter).clamp(0.0, 1.0);
    Label::Numeric(if p > 0.5 { 1.0 } else { 0.0 })
}

fn regression_label(features: &[f64], noise: f64, rng: &mut ChaCha8Rng) -> Label {
    let score: f64 = features
        .iter()
        .enumerate()
        .map(|(i, v)| v * (i + 1) as f64 * 0.5)
        .sum();
    let jitter = (rng.gen::<f64>() - 0.5) * noise * 10.0;
    Label::Numeric(score + jitter)
}
