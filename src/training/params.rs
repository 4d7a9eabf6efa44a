//! Model selection and hyperparameters

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArenaError;

/// Trainable model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LogisticRegression,
    LinearRegression,
    NeuralNetwork,
    Knn,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelType::LogisticRegression => "logistic_regression",
            ModelType::LinearRegression => "linear_regression",
            ModelType::NeuralNetwork => "neural_network",
            ModelType::Knn => "knn",
        };
        f.write_str(name)
    }
}

impl FromStr for ModelType {
    type Err = ArenaError;

    /// Parse a model name. Unrecognized names are an error, never a default
    /// substitute.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logistic_regression" => Ok(ModelType::LogisticRegression),
            "linear_regression" => Ok(ModelType::LinearRegression),
            "neural_network" => Ok(ModelType::NeuralNetwork),
            "knn" => Ok(ModelType::Knn),
            other => Err(ArenaError::UnknownModel(other.to_string())),
        }
    }
}

/// Hyperparameters for a training run.
///
/// Every field is optional; each model reads the fields it understands and
/// falls back to its documented default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParams {
    /// Gradient step size (logistic regression, neural network)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_rate: Option<f64>,
    /// Iteration budget (logistic regression, neural network)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epochs: Option<usize>,
    /// L2 regularization strength (logistic and linear regression)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2: Option<f64>,
    /// Hidden layer widths (neural network)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_layers: Option<Vec<usize>>,
    /// Neighbor count (k-NN)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_neighbors: Option<usize>,
    /// Seed for weight initialization and shuffling. Defaults to a fixed
    /// seed so repeated training of the same configuration is reproducible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<u64>,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            learning_rate: None,
            epochs: None,
            l2: None,
            hidden_layers: None,
            n_neighbors: None,
            random_seed: Some(42),
        }
    }
}

impl ModelParams {
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = Some(lr);
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = Some(epochs);
        self
    }

    pub fn with_hidden_layers(mut self, layers: Vec<usize>) -> Self {
        self.hidden_layers = Some(layers);
        self
    }

    pub fn with_n_neighbors(mut self, k: usize) -> Self {
        self.n_neighbors = Some(k);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }
}

/// Progress report emitted at epoch boundaries during iterative training
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub epoch: usize,
    pub total_epochs: usize,
    pub loss: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
}

/// Optional observer for [`TrainingProgress`] events
pub type ProgressFn<'a> = dyn FnMut(&TrainingProgress) + 'a;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_round_trip() {
        for model in [
            ModelType::LogisticRegression,
            ModelType::LinearRegression,
            ModelType::NeuralNetwork,
            ModelType::Knn,
        ] {
            assert_eq!(model.to_string().parse::<ModelType>().unwrap(), model);
        }
    }

    #[test]
    fn test_unknown_model_is_an_error() {
        let result = "decision_forest_9000".parse::<ModelType>();
        assert!(matches!(result, Err(ArenaError::UnknownModel(_))));
    }

    #[test]
    fn test_params_serde_skips_unset_fields() {
        let json = serde_json::to_string(&ModelParams::default()).unwrap();
        assert_eq!(json, r#"{"random_seed":42}"#);
    }
}
