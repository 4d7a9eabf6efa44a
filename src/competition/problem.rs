//! Competition problems and their registry

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{DataSplit, Dataset, DatasetSplitter, SplitIndices, SplitOptions};
use crate::error::{ArenaError, Result};
use crate::scoring::PrimaryMetric;
use crate::training::ModelType;

/// Per-problem submission constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemConstraints {
    pub max_features: usize,
    pub max_training_time: Duration,
    pub max_submissions: usize,
    /// Models players may submit. Empty means every model is allowed.
    pub allowed_models: Vec<ModelType>,
}

impl Default for ProblemConstraints {
    fn default() -> Self {
        Self {
            max_features: 32,
            max_training_time: Duration::from_secs(60),
            max_submissions: 10,
            allowed_models: Vec::new(),
        }
    }
}

/// An immutable-after-creation competition problem.
///
/// The train/validation/test partition is decided once at creation time and
/// reused identically for every submission, so scores stay comparable across
/// submissions. Only the participation counters mutate afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionProblem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub dataset: Dataset,
    pub split_options: SplitOptions,
    pub split: SplitIndices,
    pub primary_metric: PrimaryMetric,
    pub constraints: ProblemConstraints,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub participant_count: usize,
    pub submission_count: usize,
}

impl CompetitionProblem {
    /// Create a problem and freeze its data partition.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        dataset: Dataset,
        split_options: SplitOptions,
        primary_metric: PrimaryMetric,
        constraints: ProblemConstraints,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<Self> {
        if end_time <= start_time {
            return Err(ArenaError::Configuration(
                "problem end time must be after its start time".to_string(),
            ));
        }
        let split = DatasetSplitter::new(split_options.clone())
            .split_indices(&dataset.data, dataset.problem_type)?;

        Ok(Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            dataset,
            split_options,
            split,
            primary_metric,
            constraints,
            start_time,
            end_time,
            participant_count: 0,
            submission_count: 0,
        })
    }

    /// Whether the activity window `[start_time, end_time)` contains `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now && now < self.end_time
    }

    /// Materialize the frozen partition into owned rows.
    pub fn materialize_split(&self) -> DataSplit {
        let gather = |idx: &[usize]| idx.iter().map(|&i| self.dataset.data[i].clone()).collect();
        DataSplit {
            train: gather(&self.split.train),
            validation: gather(&self.split.validation),
            test: gather(&self.split.test),
        }
    }
}

/// In-memory problem registry. An explicit service object: each instance
/// owns its own map, so tests and callers get isolated lifecycles.
#[derive(Debug, Default)]
pub struct ProblemRegistry {
    problems: HashMap<String, CompetitionProblem>,
}

impl ProblemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, problem: CompetitionProblem) -> Result<()> {
        if self.problems.contains_key(&problem.id) {
            return Err(ArenaError::Configuration(format!(
                "problem {} is already registered",
                problem.id
            )));
        }
        info!(problem = %problem.id, title = %problem.title, "problem registered");
        self.problems.insert(problem.id.clone(), problem);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&CompetitionProblem> {
        self.problems
            .get(id)
            .ok_or_else(|| ArenaError::ProblemNotFound { id: id.to_string() })
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Result<&mut CompetitionProblem> {
        self.problems
            .get_mut(id)
            .ok_or_else(|| ArenaError::ProblemNotFound { id: id.to_string() })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.problems.keys().map(String::as_str)
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<&CompetitionProblem> {
        self.problems
            .values()
            .filter(|p| p.is_active_at(now))
            .collect()
    }

    /// Time left in the activity window; zero once the problem has closed.
    pub fn remaining_time(&self, id: &str, now: DateTime<Utc>) -> Result<Duration> {
        let problem = self.get(id)?;
        Ok((problem.end_time - now).to_std().unwrap_or(Duration::ZERO))
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::{self, SyntheticConfig};
    use chrono::TimeZone;

    fn sample_problem(id: &str) -> CompetitionProblem {
        let dataset = synthetic::generate(&SyntheticConfig {
            rows: 60,
            ..SyntheticConfig::default()
        })
        .unwrap();
        CompetitionProblem::new(
            id,
            "Sample",
            "A sample problem",
            dataset,
            SplitOptions::default().with_seed(1),
            PrimaryMetric::Accuracy,
            ProblemConstraints::default(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_split_is_frozen_at_creation() {
        let problem = sample_problem("p1");
        let first = problem.materialize_split();
        let second = problem.materialize_split();
        assert_eq!(first.train, second.train);
        assert_eq!(first.test, second.test);
        assert_eq!(
            first.train.len() + first.validation.len() + first.test.len(),
            60
        );
    }

    #[test]
    fn test_activity_window_is_half_open() {
        let problem = sample_problem("p1");
        assert!(problem.is_active_at(problem.start_time));
        assert!(!problem.is_active_at(problem.end_time));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let dataset = synthetic::generate(&SyntheticConfig::default()).unwrap();
        let result = CompetitionProblem::new(
            "p1",
            "Bad",
            "",
            dataset,
            SplitOptions::default(),
            PrimaryMetric::Accuracy,
            ProblemConstraints::default(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(matches!(result, Err(ArenaError::Configuration(_))));
    }

    #[test]
    fn test_registry_lookup_and_duplicates() {
        let mut registry = ProblemRegistry::new();
        registry.register(sample_problem("p1")).unwrap();

        assert!(registry.get("p1").is_ok());
        assert!(matches!(
            registry.get("missing"),
            Err(ArenaError::ProblemNotFound { .. })
        ));
        assert!(matches!(
            registry.register(sample_problem("p1")),
            Err(ArenaError::Configuration(_))
        ));
    }

    #[test]
    fn test_remaining_time() {
        let mut registry = ProblemRegistry::new();
        registry.register(sample_problem("p1")).unwrap();

        let mid = Utc.with_ymd_and_hms(2024, 1, 7, 0, 0, 0).unwrap();
        let remaining = registry.remaining_time("p1", mid).unwrap();
        assert_eq!(remaining, Duration::from_secs(24 * 3600));

        let after = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert_eq!(registry.remaining_time("p1", after).unwrap(), Duration::ZERO);
    }
}
