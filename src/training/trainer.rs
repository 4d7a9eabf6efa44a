//! Uniform train/evaluate facade over the model zoo
//!
//! Wraps the concrete models behind a single `train -> TrainedModel ->
//! predict` contract so the submission pipeline does not care which family
//! it is running. Model choice is always explicit; there is no fallback
//! model for an unknown or disallowed type.

use std::time::{Duration, Instant};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{DataPoint, Dataset, ProblemType};
use crate::error::{ArenaError, Result};

use super::knn::{KnnModel, KnnTask};
use super::linear::{LinearRegression, LogisticRegression};
use super::metrics::{MetricBundle, ModelEvaluation};
use super::neural::{MlpConfig, MlpNetwork, OutputKind};
use super::params::{ModelParams, ModelType, ProgressFn};

/// A model produced by [`ModelTrainer::train`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    Logistic(LogisticRegression),
    Linear(LinearRegression),
    Neural(MlpNetwork),
    Knn(KnnModel),
}

impl TrainedModel {
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::Logistic(m) => m.predict(x),
            TrainedModel::Linear(m) => m.predict(x),
            TrainedModel::Neural(m) => m.predict(x),
            TrainedModel::Knn(m) => m.predict(x),
        }
    }
}

/// Trains one model family with one set of hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainer {
    pub model_type: ModelType,
    pub params: ModelParams,
}

impl ModelTrainer {
    pub fn new(model_type: ModelType, params: ModelParams) -> Self {
        Self { model_type, params }
    }

    /// Train on the given matrix. `progress` is optional instrumentation:
    /// iterative models invoke it at epoch boundaries, closed-form models
    /// never do, and training completes identically either way.
    /// `time_limit` bounds wall-clock training time; exceeding it aborts
    /// with [`ArenaError::TrainingTimeout`] and leaves no partial state.
    pub fn train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        problem_type: ProblemType,
        progress: Option<&mut ProgressFn<'_>>,
        time_limit: Option<Duration>,
    ) -> Result<TrainedModel> {
        if x.nrows() == 0 {
            return Err(ArenaError::InsufficientData(
                "training partition is empty".to_string(),
            ));
        }
        let deadline = time_limit.map(|limit| (Instant::now(), limit));

        let model = match self.model_type {
            ModelType::LogisticRegression => {
                if problem_type != ProblemType::Classification {
                    return Err(ArenaError::Configuration(
                        "logistic regression requires a classification problem".to_string(),
                    ));
                }
                let mut model = LogisticRegression::new(
                    self.params.learning_rate.unwrap_or(0.1),
                    self.params.epochs.unwrap_or(300),
                    self.params.l2.unwrap_or(0.0),
                );
                model.fit(x, y, progress, deadline)?;
                TrainedModel::Logistic(model)
            }
            ModelType::LinearRegression => {
                if problem_type != ProblemType::Regression {
                    return Err(ArenaError::Configuration(
                        "linear regression requires a regression problem".to_string(),
                    ));
                }
                let mut model = LinearRegression::new(self.params.l2.unwrap_or(0.0));
                model.fit(x, y)?;
                TrainedModel::Linear(model)
            }
            ModelType::NeuralNetwork => {
                let config = MlpConfig {
                    hidden_layers: self.params.hidden_layers.clone().unwrap_or_else(|| vec![16]),
                    learning_rate: self.params.learning_rate.unwrap_or(0.01),
                    epochs: self.params.epochs.unwrap_or(200),
                    random_seed: self.params.random_seed,
                    ..MlpConfig::default()
                };
                let output = match problem_type {
                    ProblemType::Classification => OutputKind::Binary,
                    ProblemType::Regression => OutputKind::Continuous,
                };
                let mut model = MlpNetwork::new(config, output);
                model.fit(x, y, progress, deadline)?;
                TrainedModel::Neural(model)
            }
            ModelType::Knn => {
                let task = match problem_type {
                    ProblemType::Classification => KnnTask::Classify,
                    ProblemType::Regression => KnnTask::Regress,
                };
                let mut model = KnnModel::new(self.params.n_neighbors.unwrap_or(5), task);
                model.fit(x, y)?;
                TrainedModel::Knn(model)
            }
        };

        debug!(model = %self.model_type, rows = x.nrows(), "model trained");
        Ok(model)
    }
}

/// Evaluate a trained model against a labeled partition.
pub fn evaluate(
    model: &TrainedModel,
    x: &Array2<f64>,
    y: &Array1<f64>,
    problem_type: ProblemType,
    training_time: Duration,
) -> Result<ModelEvaluation> {
    if x.nrows() == 0 {
        return Err(ArenaError::InsufficientData(
            "evaluation partition is empty".to_string(),
        ));
    }
    let predictions = model.predict(x)?;
    let metrics = MetricBundle::compute(y, &predictions, problem_type);
    Ok(ModelEvaluation {
        metrics,
        predictions: predictions.to_vec(),
        actual: y.to_vec(),
        training_time,
    })
}

/// Build the design matrix and label vector for a partition.
pub fn design_matrix(rows: &[DataPoint], dataset: &Dataset) -> Result<(Array2<f64>, Array1<f64>)> {
    let n = rows.len();
    let width = rows.first().map_or(0, |p| p.features.len());

    let mut x = Array2::zeros((n, width));
    let mut y = Array1::zeros(n);
    for (i, point) in rows.iter().enumerate() {
        for (j, &v) in point.features.iter().enumerate() {
            x[[i, j]] = v;
        }
        y[i] = dataset.numeric_label(&point.label)?;
    }
    Ok((x, y))
}

pub(crate) fn check_deadline(deadline: Option<(Instant, Duration)>) -> Result<()> {
    if let Some((started, limit)) = deadline {
        if started.elapsed() > limit {
            return Err(ArenaError::TrainingTimeout { limit });
        }
    }
    Ok(())
}
