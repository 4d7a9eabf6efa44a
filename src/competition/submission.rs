//! Submission pipeline
//!
//! `create_submission` runs the whole evaluation sequence for one attempt:
//! validate the request against the problem's constraints, materialize the
//! problem's frozen data partition, select features, fit preprocessing on
//! the training partition, train the model under the problem's time budget,
//! evaluate on the validation partition, normalize the score, then append
//! the submission and recompute the leaderboard as one atomic logical step.
//! Nothing is recorded for a failed attempt.
//!
//! The score shown on the leaderboard is always the validation score. The
//! test partition is reserved for the private evaluation pass
//! ([`SubmissionManager::evaluate_private`]), which re-runs a stored
//! configuration and overwrites `private_score`. Because stored parameters
//! default to a fixed random seed, re-running the private pass for any model
//! family reproduces the same score.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::leaderboard::{LeaderboardManager, LeaderboardView};
use super::problem::{CompetitionProblem, ProblemRegistry};
use crate::error::{ArenaError, Result};
use crate::preprocessing::{preprocess_split, PreprocessConfig};
use crate::training::{
    design_matrix, evaluate, MetricBundle, ModelParams, ModelTrainer, ModelType, ProgressFn,
};

/// A user's request to submit one attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub problem_id: String,
    pub user_id: String,
    pub username: String,
    pub selected_features: Vec<usize>,
    pub model_type: ModelType,
    pub parameters: ModelParams,
    pub preprocessing: PreprocessConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// A stored submission. `score` is the validation score; `private_score`
/// and `rank` are the only fields mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionSubmission {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub problem_id: String,
    pub predictions: Vec<f64>,
    pub selected_features: Vec<usize>,
    pub model_type: ModelType,
    pub parameters: ModelParams,
    pub preprocessing: PreprocessConfig,
    pub submitted_at: DateTime<Utc>,
    pub score: f64,
    pub metrics: MetricBundle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

/// Leaderboard change notification delivered to registered listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardUpdate {
    pub problem_id: String,
}

/// Aggregate submission statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionStats {
    pub total_submissions: usize,
    pub submissions_by_model: HashMap<String, usize>,
    pub submissions_by_problem: HashMap<String, usize>,
    pub best_score: f64,
    pub average_score: f64,
}

type UpdateListener = Box<dyn FnMut(&LeaderboardUpdate)>;

/// Owns the problem registry, all submission lists and the leaderboard
/// cache. All mutation of competition state goes through this type.
pub struct SubmissionManager {
    problems: ProblemRegistry,
    submissions: HashMap<String, Vec<CompetitionSubmission>>,
    leaderboards: LeaderboardManager,
    listeners: Vec<UpdateListener>,
}

impl SubmissionManager {
    pub fn new(problems: ProblemRegistry) -> Self {
        Self {
            problems,
            submissions: HashMap::new(),
            leaderboards: LeaderboardManager::new(),
            listeners: Vec::new(),
        }
    }

    pub fn problems(&self) -> &ProblemRegistry {
        &self.problems
    }

    pub fn register_problem(&mut self, problem: CompetitionProblem) -> Result<()> {
        self.problems.register(problem)
    }

    /// Subscribe to leaderboard change notifications.
    pub fn on_leaderboard_update(&mut self, listener: impl FnMut(&LeaderboardUpdate) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Submit one attempt, evaluated at the current wall-clock time.
    pub fn create_submission(&mut self, request: SubmissionRequest) -> Result<&CompetitionSubmission> {
        self.create_submission_at(request, Utc::now())
    }

    /// Submit one attempt with an explicit clock, for deterministic tests.
    pub fn create_submission_at(
        &mut self,
        request: SubmissionRequest,
        now: DateTime<Utc>,
    ) -> Result<&CompetitionSubmission> {
        self.create_submission_inner(request, now, None)
    }

    /// Like [`Self::create_submission`], with training progress reporting.
    pub fn create_submission_with_progress(
        &mut self,
        request: SubmissionRequest,
        progress: &mut ProgressFn<'_>,
    ) -> Result<&CompetitionSubmission> {
        self.create_submission_inner(request, Utc::now(), Some(progress))
    }

    fn create_submission_inner(
        &mut self,
        request: SubmissionRequest,
        now: DateTime<Utc>,
        progress: Option<&mut ProgressFn<'_>>,
    ) -> Result<&CompetitionSubmission> {
        let problem = self.problems.get(&request.problem_id)?;

        if !problem.is_active_at(now) {
            return Err(ArenaError::ProblemClosed {
                id: problem.id.clone(),
            });
        }

        let limit = problem.constraints.max_submissions;
        let used = self.user_submission_count(&request.problem_id, &request.user_id);
        if used >= limit {
            return Err(ArenaError::SubmissionLimitExceeded { limit, used });
        }

        validate_feature_selection(&request.selected_features, problem)?;

        if !problem.constraints.allowed_models.is_empty()
            && !problem.constraints.allowed_models.contains(&request.model_type)
        {
            return Err(ArenaError::ModelNotAllowed {
                model: request.model_type.to_string(),
            });
        }

        // Evaluate against the problem's frozen partition. Any failure here
        // surfaces to the caller before submission state changes.
        let problem_id = problem.id.clone();
        let primary_metric = problem.primary_metric;
        let evaluation = run_pipeline(
            problem,
            &request.selected_features,
            &request.preprocessing,
            request.model_type,
            &request.parameters,
            EvalPartition::Validation,
            progress,
        )?;
        let score = crate::scoring::compute_score(&evaluation.metrics, primary_metric)?;

        let submission = CompetitionSubmission {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            username: request.username,
            problem_id: problem_id.clone(),
            predictions: evaluation.predictions,
            selected_features: request.selected_features,
            model_type: request.model_type,
            parameters: request.parameters,
            preprocessing: request.preprocessing,
            submitted_at: now,
            score,
            metrics: evaluation.metrics,
            private_score: None,
            rank: None,
            team_id: request.team_id,
        };

        info!(
            problem = %problem_id,
            user = %submission.user_id,
            model = %submission.model_type,
            score,
            "submission accepted"
        );

        // Append, bump counters and recompute the leaderboard in one step:
        // no observer may see the submission without its leaderboard row.
        let entries = self.submissions.entry(problem_id.clone()).or_default();
        let is_new_participant = !entries
            .iter()
            .any(|s| s.user_id == submission.user_id);
        entries.push(submission);

        let problem = self.problems.get_mut(&problem_id)?;
        problem.submission_count += 1;
        if is_new_participant {
            problem.participant_count += 1;
        }

        let entries = self.submissions.get_mut(&problem_id).unwrap();
        self.leaderboards.recompute(&problem_id, entries, now);

        let update = LeaderboardUpdate {
            problem_id: problem_id.clone(),
        };
        for listener in &mut self.listeners {
            listener(&update);
        }

        Ok(self.submissions[&problem_id].last().unwrap())
    }

    /// Re-run a stored submission against the reserved test partition and
    /// overwrite its private score. Stored parameters carry their random
    /// seed, so repeating this call reproduces the same score.
    pub fn evaluate_private(&mut self, problem_id: &str, submission_id: &str) -> Result<f64> {
        let problem = self.problems.get(problem_id)?;
        let primary_metric = problem.primary_metric;

        let stored = self
            .submissions
            .get(problem_id)
            .and_then(|subs| subs.iter().find(|s| s.id == submission_id))
            .ok_or_else(|| ArenaError::Configuration(format!(
                "submission {} not found for problem {}",
                submission_id, problem_id
            )))?;

        let evaluation = run_pipeline(
            problem,
            &stored.selected_features,
            &stored.preprocessing,
            stored.model_type,
            &stored.parameters,
            EvalPartition::Test,
            None,
        )?;
        let score = crate::scoring::compute_score(&evaluation.metrics, primary_metric)?;

        let stored = self
            .submissions
            .get_mut(problem_id)
            .and_then(|subs| subs.iter_mut().find(|s| s.id == submission_id))
            .unwrap();
        stored.private_score = Some(score);

        info!(problem = problem_id, submission = submission_id, score, "private evaluation done");
        Ok(score)
    }

    /// Run the private evaluation for every stored submission of a problem.
    /// Returns how many submissions were re-scored; individual failures are
    /// surfaced, not swallowed.
    pub fn evaluate_private_all(&mut self, problem_id: &str) -> Result<usize> {
        let ids: Vec<String> = self
            .submissions
            .get(problem_id)
            .map(|subs| subs.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default();

        for id in &ids {
            self.evaluate_private(problem_id, id)?;
        }
        if ids.is_empty() {
            warn!(problem = problem_id, "private evaluation requested with no submissions");
        }
        Ok(ids.len())
    }

    pub fn submissions(&self, problem_id: &str) -> &[CompetitionSubmission] {
        self.submissions
            .get(problem_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn user_submission_count(&self, problem_id: &str, user_id: &str) -> usize {
        self.submissions(problem_id)
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }

    pub fn leaderboard(&self, problem_id: &str, limit: usize) -> Option<LeaderboardView> {
        self.leaderboards.get(problem_id, limit)
    }

    /// Aggregate statistics over every stored submission.
    pub fn stats(&self) -> SubmissionStats {
        let mut stats = SubmissionStats::default();
        let mut score_sum = 0.0;

        for (problem_id, subs) in &self.submissions {
            *stats
                .submissions_by_problem
                .entry(problem_id.clone())
                .or_default() += subs.len();
            for s in subs {
                stats.total_submissions += 1;
                *stats
                    .submissions_by_model
                    .entry(s.model_type.to_string())
                    .or_default() += 1;
                score_sum += s.score;
                if s.score > stats.best_score {
                    stats.best_score = s.score;
                }
            }
        }
        if stats.total_submissions > 0 {
            stats.average_score = score_sum / stats.total_submissions as f64;
        }
        stats
    }
}

enum EvalPartition {
    Validation,
    Test,
}

/// Shared split→preprocess→train→evaluate sequence used by both the public
/// submission path and the private evaluation pass.
fn run_pipeline(
    problem: &CompetitionProblem,
    selected_features: &[usize],
    preprocessing: &PreprocessConfig,
    model_type: ModelType,
    parameters: &ModelParams,
    partition: EvalPartition,
    progress: Option<&mut ProgressFn<'_>>,
) -> Result<crate::training::ModelEvaluation> {
    let split = problem.materialize_split();
    let split = split.select_features(selected_features);
    let split = preprocess_split(&split, preprocessing)?;

    let selected_dataset = selected_view(problem, selected_features);
    let (x_train, y_train) = design_matrix(&split.train, &selected_dataset)?;
    let eval_rows = match partition {
        EvalPartition::Validation => &split.validation,
        EvalPartition::Test => &split.test,
    };
    let (x_eval, y_eval) = design_matrix(eval_rows, &selected_dataset)?;

    let trainer = ModelTrainer::new(model_type, parameters.clone());
    let started = std::time::Instant::now();
    let model = trainer.train(
        &x_train,
        &y_train,
        problem.dataset.problem_type,
        progress,
        Some(problem.constraints.max_training_time),
    )?;
    let training_time = started.elapsed();

    evaluate(
        &model,
        &x_eval,
        &y_eval,
        problem.dataset.problem_type,
        training_time,
    )
}

/// Dataset metadata restricted to the selected feature columns; rows are
/// not copied, only names, so label resolution still works.
fn selected_view(problem: &CompetitionProblem, selected: &[usize]) -> crate::dataset::Dataset {
    crate::dataset::Dataset {
        data: Vec::new(),
        feature_names: selected
            .iter()
            .map(|&i| problem.dataset.feature_names[i].clone())
            .collect(),
        label_name: problem.dataset.label_name.clone(),
        classes: problem.dataset.classes.clone(),
        problem_type: problem.dataset.problem_type,
    }
}

fn validate_feature_selection(selected: &[usize], problem: &CompetitionProblem) -> Result<()> {
    if selected.is_empty() {
        return Err(ArenaError::InvalidFeatureSelection(
            "no features selected".to_string(),
        ));
    }
    let width = problem.dataset.feature_names.len();
    if let Some(&bad) = selected.iter().find(|&&i| i >= width) {
        return Err(ArenaError::InvalidFeatureSelection(format!(
            "feature index {} out of range for {} features",
            bad, width
        )));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(&dup) = selected.iter().find(|&&i| !seen.insert(i)) {
        return Err(ArenaError::InvalidFeatureSelection(format!(
            "feature index {} selected more than once",
            dup
        )));
    }
    if selected.len() > problem.constraints.max_features {
        return Err(ArenaError::InvalidFeatureSelection(format!(
            "{} features selected, problem allows at most {}",
            selected.len(),
            problem.constraints.max_features
        )));
    }
    Ok(())
}
