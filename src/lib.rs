//! mlarena - In-memory machine learning competition engine
//!
//! This crate implements the evaluation and submission pipeline of a
//! data-science competition: a problem freezes a dataset partition once,
//! each submission selects features, fits preprocessing on the training
//! partition, trains a small model and is scored on the validation
//! partition, and a rank-stable leaderboard orders all submissions.
//!
//! # Modules
//!
//! - [`dataset`] - Dataset value objects, seeded splitting, synthetic data
//! - [`preprocessing`] - Scaling and encoding, fitted on train only
//! - [`training`] - Model training and evaluation (logistic/linear
//!   regression, feed-forward network, k-NN)
//! - [`scoring`] - Normalization of raw metrics into a [0, 1] score
//! - [`competition`] - Problems, submissions and leaderboards
//!
//! # Example
//!
//! ```
//! use mlarena::prelude::*;
//! use chrono::{Duration, Utc};
//!
//! let dataset = mlarena::dataset::synthetic::generate(&SyntheticConfig::default()).unwrap();
//! let problem = CompetitionProblem::new(
//!     "weekly-1",
//!     "Cluster challenge",
//!     "Classify the synthetic clusters",
//!     dataset,
//!     SplitOptions::default().with_seed(42).stratified(),
//!     PrimaryMetric::Accuracy,
//!     ProblemConstraints::default(),
//!     Utc::now() - Duration::hours(1),
//!     Utc::now() + Duration::days(7),
//! )
//! .unwrap();
//!
//! let mut registry = ProblemRegistry::new();
//! registry.register(problem).unwrap();
//! let mut manager = SubmissionManager::new(registry);
//!
//! let submission = manager
//!     .create_submission(SubmissionRequest {
//!         problem_id: "weekly-1".into(),
//!         user_id: "u1".into(),
//!         username: "alice".into(),
//!         selected_features: vec![0, 1, 2, 3],
//!         model_type: ModelType::Knn,
//!         parameters: ModelParams::default(),
//!         preprocessing: PreprocessConfig::normalize(),
//!         team_id: None,
//!     })
//!     .unwrap();
//! assert!((0.0..=1.0).contains(&submission.score));
//! ```

pub mod competition;
pub mod dataset;
pub mod error;
pub mod preprocessing;
pub mod scoring;
pub mod training;

pub use error::{ArenaError, Result};

/// Re-export of commonly used types
pub mod prelude {
    pub use crate::competition::{
        CompetitionProblem, CompetitionSubmission, LeaderboardUpdate, LeaderboardView,
        ProblemConstraints, ProblemRegistry, SubmissionManager, SubmissionRequest,
    };
    pub use crate::dataset::synthetic::SyntheticConfig;
    pub use crate::dataset::{
        DataPoint, DataSplit, Dataset, DatasetSplitter, Label, ProblemType, SplitOptions,
    };
    pub use crate::error::{ArenaError, Result};
    pub use crate::preprocessing::{PreprocessConfig, PreprocessMethod};
    pub use crate::scoring::{compute_score, PrimaryMetric};
    pub use crate::training::{
        MetricBundle, ModelParams, ModelTrainer, ModelType, TrainedModel, TrainingProgress,
    };
}
