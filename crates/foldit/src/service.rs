//! Progress submission and lookup keyed by real user ids.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::db::{
    CompletedPuzzle, DbError, FolditRepository, LeaderboardEntry, NewPuzzleComplete, NewScore,
    Score,
};
use crate::identity::AnonymousIdentity;
use crate::level::Level;

/// One puzzle's scores as reported by the Foldit client.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize, new)]
pub struct PuzzleScore {
    puzzle_id: i32,
    best_score: f64,
    current_score: f64,
    score_version: i32,
}

/// One completed puzzle level as reported by the Foldit client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize, new)]
pub struct PuzzleLevel {
    puzzle_id: i32,
    level: Level,
}

/// Service layer over [`FolditRepository`].
///
/// Callers pass real user ids; the service stamps records with the
/// anonymized id derived by `I` and looks them up the same way.
#[derive(Debug, Clone)]
pub struct ProgressService<I> {
    repository: FolditRepository,
    identity: I,
}

impl<I: AnonymousIdentity> ProgressService<I> {
    /// Creates a service backed by the given repository and id derivation.
    #[instrument(skip_all)]
    pub fn new(repository: FolditRepository, identity: I) -> Self {
        info!("Creating ProgressService");
        Self {
            repository,
            identity,
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &FolditRepository {
        &self.repository
    }

    /// Returns the anonymized id for a user.
    pub fn anonymous_id(&self, user_id: i32) -> String {
        self.identity.anonymous_id(user_id)
    }

    /// Records every reported score for a user.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on the first failed insert; earlier scores stay
    /// recorded.
    #[instrument(skip(self, scores), fields(count = scores.len()))]
    pub fn submit_scores(
        &self,
        user_id: i32,
        scores: &[PuzzleScore],
    ) -> Result<Vec<Score>, DbError> {
        let anonymous_id = self.anonymous_id(user_id);
        debug!("Submitting scores");

        let recorded = scores
            .iter()
            .map(|score| {
                self.repository.record_score(NewScore::new(
                    user_id,
                    anonymous_id.clone(),
                    score.puzzle_id,
                    score.best_score,
                    score.current_score,
                    score.score_version,
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(recorded = recorded.len(), "Scores submitted");
        Ok(recorded)
    }

    /// Records reported completions, skipping ones already stored.
    ///
    /// Returns the number of newly recorded completions.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, levels), fields(count = levels.len()))]
    pub fn submit_completions(&self, user_id: i32, levels: &[PuzzleLevel]) -> Result<usize, DbError> {
        let anonymous_id = self.anonymous_id(user_id);
        debug!("Submitting completions");

        let mut created = 0;
        for entry in levels {
            let (_, inserted) = self.repository.ensure_completion(NewPuzzleComplete::new(
                user_id,
                anonymous_id.clone(),
                entry.puzzle_id,
                *entry.level.set(),
                *entry.level.subset(),
            ))?;
            if inserted {
                created += 1;
            }
        }

        info!(created, "Completions submitted");
        Ok(created)
    }

    /// Lists the levels a user completed, by ascending puzzle id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn completed_puzzles(&self, user_id: i32) -> Result<Vec<CompletedPuzzle>, DbError> {
        self.repository
            .completed_puzzles(&self.anonymous_id(user_id))
    }

    /// Checks whether a user completed `level`, optionally by `due`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn is_level_complete(
        &self,
        user_id: i32,
        level: Level,
        due: Option<NaiveDateTime>,
    ) -> Result<bool, DbError> {
        self.repository.is_level_complete(
            &self.anonymous_id(user_id),
            *level.set(),
            *level.subset(),
            due,
        )
    }

    /// Lowest best score a user reached on a puzzle.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn best_score(&self, user_id: i32, puzzle_id: i32) -> Result<Option<f64>, DbError> {
        self.repository
            .best_score(&self.anonymous_id(user_id), puzzle_id)
    }

    /// Top `n` users over `puzzles`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn leaderboard(&self, n: usize, puzzles: &[i32]) -> Result<Vec<LeaderboardEntry>, DbError> {
        self.repository.top_scores(n, puzzles)
    }
}
