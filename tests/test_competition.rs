//! Integration test: competition flow across users and models

use chrono::{TimeZone, Utc};
use mlarena::dataset::synthetic::{self, SyntheticConfig};
use mlarena::prelude::*;

fn build_manager(max_submissions: usize) -> SubmissionManager {
    let dataset = synthetic::generate(&SyntheticConfig {
        rows: 150,
        features: 5,
        noise: 0.05,
        seed: 11,
        problem_type: ProblemType::Classification,
    })
    .unwrap();

    let problem = CompetitionProblem::new(
        "weekly",
        "Weekly challenge",
        "synthetic classification",
        dataset,
        SplitOptions {
            train_ratio: 0.7,
            validation_ratio: 0.2,
            test_ratio: 0.1,
            random_seed: Some(42),
            stratified: true,
        },
        PrimaryMetric::F1,
        ProblemConstraints {
            max_submissions,
            ..ProblemConstraints::default()
        },
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 8, 0, 0, 0).unwrap(),
    )
    .unwrap();

    let mut registry = ProblemRegistry::new();
    registry.register(problem).unwrap();
    SubmissionManager::new(registry)
}

fn request(user: &str, model: ModelType) -> SubmissionRequest {
    SubmissionRequest {
        problem_id: "weekly".to_string(),
        user_id: user.to_string(),
        username: user.to_string(),
        selected_features: vec![0, 1, 2, 3, 4],
        model_type: model,
        parameters: ModelParams::default().with_epochs(200),
        preprocessing: PreprocessConfig::standardize(),
        team_id: None,
    }
}

#[test]
fn test_multi_user_competition_round() {
    let mut manager = build_manager(10);
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

    manager
        .create_submission_at(request("alice", ModelType::LogisticRegression), now)
        .unwrap();
    manager
        .create_submission_at(request("bob", ModelType::Knn), now)
        .unwrap();
    manager
        .create_submission_at(request("alice", ModelType::NeuralNetwork), now)
        .unwrap();

    let problem = manager.problems().get("weekly").unwrap();
    assert_eq!(problem.submission_count, 3);
    assert_eq!(problem.participant_count, 2);

    let board = manager.leaderboard("weekly", 10).unwrap();
    assert_eq!(board.total_submissions, 3);
    assert_eq!(board.participant_count, 2);

    // Every attempt is ranked, ranks are contiguous from 1 and ordered by
    // non-increasing score.
    let ranks: Vec<usize> = board.entries.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3]);
    for pair in board.entries.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    // Ranks are written back onto the stored submissions.
    let mut stored_ranks: Vec<usize> = manager
        .submissions("weekly")
        .iter()
        .map(|s| s.rank.unwrap())
        .collect();
    stored_ranks.sort_unstable();
    assert_eq!(stored_ranks, vec![1, 2, 3]);
}

#[test]
fn test_submission_limit_across_round() {
    let mut manager = build_manager(2);
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

    manager
        .create_submission_at(request("alice", ModelType::Knn), now)
        .unwrap();
    manager
        .create_submission_at(request("alice", ModelType::LogisticRegression), now)
        .unwrap();

    let third = manager.create_submission_at(request("alice", ModelType::Knn), now);
    assert!(matches!(
        third,
        Err(ArenaError::SubmissionLimitExceeded { limit: 2, used: 2 })
    ));

    // Leaderboard still reflects exactly the accepted submissions.
    let board = manager.leaderboard("weekly", 10).unwrap();
    assert_eq!(board.total_submissions, 2);
}

#[test]
fn test_private_evaluation_pass_over_leaderboard() {
    let mut manager = build_manager(10);
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

    manager
        .create_submission_at(request("alice", ModelType::LogisticRegression), now)
        .unwrap();
    manager
        .create_submission_at(request("bob", ModelType::NeuralNetwork), now)
        .unwrap();

    let rescored = manager.evaluate_private_all("weekly").unwrap();
    assert_eq!(rescored, 2);

    for submission in manager.submissions("weekly") {
        let private = submission.private_score.unwrap();
        assert!((0.0..=1.0).contains(&private));
        // Public score stays untouched by the private pass.
        assert!((0.0..=1.0).contains(&submission.score));
    }
}

#[test]
fn test_shared_split_keeps_submissions_comparable() {
    let mut manager = build_manager(10);
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();

    // The same configuration submitted twice must receive the same score:
    // the problem's partition is frozen, not re-randomized per submission.
    let first = manager
        .create_submission_at(request("alice", ModelType::Knn), now)
        .unwrap()
        .score;
    let second = manager
        .create_submission_at(request("bob", ModelType::Knn), now)
        .unwrap()
        .score;
    assert_eq!(first, second);
}
