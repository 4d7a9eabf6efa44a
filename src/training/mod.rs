//! Model training and evaluation
//!
//! Four small model families behind a uniform train/evaluate contract:
//! logistic regression, linear regression, a feed-forward network and k-NN.

pub mod knn;
pub mod linear;
mod metrics;
mod neural;
mod params;
mod trainer;

pub use knn::{KnnModel, KnnTask};
pub use linear::{LinearRegression, LogisticRegression};
pub use metrics::{MetricBundle, ModelEvaluation};
pub use neural::{MlpConfig, MlpNetwork, OutputKind};
pub use params::{ModelParams, ModelType, ProgressFn, TrainingProgress};
pub use trainer::{design_matrix, evaluate, ModelTrainer, TrainedModel};
