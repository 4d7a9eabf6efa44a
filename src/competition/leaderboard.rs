//! Rank-stable leaderboards
//!
//! Ranking is over all submissions for a problem, not best-per-user; every
//! attempt occupies its own row. Sort order is score descending with the
//! earlier submission winning ties, so ranking is deterministic. Ranks are
//! 1-based by sorted position with no rank sharing for equal scores.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::submission::CompetitionSubmission;
use crate::training::ModelType;

/// One ranked row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub submission_id: String,
    pub user_id: String,
    pub username: String,
    pub score: f64,
    pub model_type: ModelType,
    pub submitted_at: DateTime<Utc>,
}

/// Read-only leaderboard snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardView {
    pub problem_id: String,
    pub entries: Vec<LeaderboardEntry>,
    pub total_submissions: usize,
    pub participant_count: usize,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct Board {
    entries: Vec<LeaderboardEntry>,
    participant_count: usize,
    last_updated: DateTime<Utc>,
}

/// Maintains one ranked view per problem. The submission list owned by the
/// submission manager stays the single source of truth; boards hold derived
/// entries only and are rebuilt on every recompute.
#[derive(Debug, Default)]
pub struct LeaderboardManager {
    boards: HashMap<String, Board>,
}

impl LeaderboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the board for a problem and write ranks back into the
    /// submissions.
    pub fn recompute(
        &mut self,
        problem_id: &str,
        submissions: &mut [CompetitionSubmission],
        now: DateTime<Utc>,
    ) {
        let mut order: Vec<usize> = (0..submissions.len()).collect();
        order.sort_by(|&a, &b| {
            submissions[b]
                .score
                .total_cmp(&submissions[a].score)
                .then(submissions[a].submitted_at.cmp(&submissions[b].submitted_at))
        });

        let mut entries = Vec::with_capacity(order.len());
        for (position, &idx) in order.iter().enumerate() {
            let rank = position + 1;
            submissions[idx].rank = Some(rank);
            let s = &submissions[idx];
            entries.push(LeaderboardEntry {
                rank,
                submission_id: s.id.clone(),
                user_id: s.user_id.clone(),
                username: s.username.clone(),
                score: s.score,
                model_type: s.model_type,
                submitted_at: s.submitted_at,
            });
        }

        let participant_count = submissions
            .iter()
            .map(|s| s.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();

        debug!(
            problem = problem_id,
            submissions = entries.len(),
            participants = participant_count,
            "leaderboard recomputed"
        );
        self.boards.insert(
            problem_id.to_string(),
            Board {
                entries,
                participant_count,
                last_updated: now,
            },
        );
    }

    /// Ranked slice of at most `limit` entries. Totals always reflect the
    /// full submission set, not the slice.
    pub fn get(&self, problem_id: &str, limit: usize) -> Option<LeaderboardView> {
        self.boards.get(problem_id).map(|board| LeaderboardView {
            problem_id: problem_id.to_string(),
            entries: board.entries.iter().take(limit).cloned().collect(),
            total_submissions: board.entries.len(),
            participant_count: board.participant_count,
            last_updated: board.last_updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::PreprocessConfig;
    use crate::training::{MetricBundle, ModelParams};
    use chrono::TimeZone;

    fn submission(n: u32, user: &str, score: f64) -> CompetitionSubmission {
        CompetitionSubmission {
            id: format!("s{}", n),
            user_id: user.to_string(),
            username: user.to_string(),
            problem_id: "p1".to_string(),
            predictions: Vec::new(),
            selected_features: vec![0],
            model_type: ModelType::Knn,
            parameters: ModelParams::default(),
            preprocessing: PreprocessConfig::none(),
            submitted_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, n).unwrap(),
            score,
            metrics: MetricBundle::default(),
            private_score: None,
            rank: None,
            team_id: None,
        }
    }

    #[test]
    fn test_tie_break_prefers_earlier_submission() {
        // Scores [0.9, 0.5, 0.9, 0.3] at increasing timestamps must rank
        // [1, 3, 2, 4]: the first 0.9 wins the tie.
        let mut subs = vec![
            submission(0, "a", 0.9),
            submission(1, "b", 0.5),
            submission(2, "c", 0.9),
            submission(3, "d", 0.3),
        ];
        let mut manager = LeaderboardManager::new();
        manager.recompute("p1", &mut subs, Utc::now());

        let ranks: Vec<usize> = subs.iter().map(|s| s.rank.unwrap()).collect();
        assert_eq!(ranks, vec![1, 3, 2, 4]);

        let view = manager.get("p1", 10).unwrap();
        assert_eq!(view.entries[0].submission_id, "s0");
        assert_eq!(view.entries[1].submission_id, "s2");
    }

    #[test]
    fn test_participant_count_is_distinct_users() {
        let mut subs = vec![
            submission(0, "alice", 0.4),
            submission(1, "alice", 0.6),
            submission(2, "bob", 0.5),
        ];
        let mut manager = LeaderboardManager::new();
        manager.recompute("p1", &mut subs, Utc::now());

        let view = manager.get("p1", 10).unwrap();
        assert_eq!(view.participant_count, 2);
        assert_eq!(view.total_submissions, 3);
    }

    #[test]
    fn test_limit_bounds_slice_not_totals() {
        let mut subs: Vec<CompetitionSubmission> = (0..8)
            .map(|i| submission(i, &format!("u{}", i), 0.1 * i as f64))
            .collect();
        let mut manager = LeaderboardManager::new();
        manager.recompute("p1", &mut subs, Utc::now());

        let view = manager.get("p1", 3).unwrap();
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.total_submissions, 8);
        assert_eq!(view.participant_count, 8);
    }

    #[test]
    fn test_every_attempt_ranked_not_best_per_user() {
        let mut subs = vec![
            submission(0, "alice", 0.9),
            submission(1, "alice", 0.8),
            submission(2, "bob", 0.85),
        ];
        let mut manager = LeaderboardManager::new();
        manager.recompute("p1", &mut subs, Utc::now());

        let view = manager.get("p1", 10).unwrap();
        // Alice occupies two rows; her weaker attempt is still ranked.
        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries[2].user_id, "alice");
    }

    #[test]
    fn test_unknown_problem_has_no_board() {
        let manager = LeaderboardManager::new();
        assert!(manager.get("nope", 5).is_none());
    }
}
