//! Database models and domain types.

use std::fmt;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::db::schema;

/// Platform user the progress records belong to.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    id: i32,
    username: String,
    created_at: NaiveDateTime,
}

/// Insertable user model.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::users)]
pub struct NewUser {
    username: String,
}

/// A score submitted for one Foldit puzzle.
///
/// Several rows may exist for the same user and puzzle; each submission
/// is kept.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::foldit_score)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Score {
    id: i32,
    user_id: i32,
    /// Anonymized id, for callers without access to the real user id.
    unique_user_id: String,
    puzzle_id: i32,
    best_score: f64,
    current_score: f64,
    score_version: i32,
    created: NaiveDateTime,
}

/// Insertable score model. `created` is stamped by the store.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::foldit_score)]
pub struct NewScore {
    user_id: i32,
    unique_user_id: String,
    puzzle_id: i32,
    best_score: f64,
    current_score: f64,
    score_version: i32,
}

/// A completed puzzle level for one user.
///
/// At most one row exists per (user, puzzle, set, subset).
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters, Serialize)]
#[diesel(table_name = schema::foldit_puzzlecomplete)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PuzzleComplete {
    id: i32,
    user_id: i32,
    unique_user_id: String,
    puzzle_id: i32,
    puzzle_set: i32,
    puzzle_subset: i32,
    created: NaiveDateTime,
}

impl PuzzleComplete {
    /// Renders the completion with the owner's username in place of the id.
    ///
    /// `user` should be the owner of this completion.
    pub fn labelled<'a>(&'a self, user: &'a User) -> LabelledCompletion<'a> {
        LabelledCompletion {
            completion: self,
            username: &user.username,
        }
    }
}

/// Completion rendered with its owner's username. See [`PuzzleComplete::labelled`].
#[derive(Debug, Clone, Copy)]
pub struct LabelledCompletion<'a> {
    completion: &'a PuzzleComplete,
    username: &'a str,
}

impl fmt::Display for LabelledCompletion<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = self.completion;
        write!(
            f,
            "PuzzleComplete({}, id={}, set={}, subset={}, created={})",
            self.username, c.puzzle_id, c.puzzle_set, c.puzzle_subset, c.created
        )
    }
}

// Without a loaded user, the owner is shown by id.
impl fmt::Display for PuzzleComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PuzzleComplete({}, id={}, set={}, subset={}, created={})",
            self.user_id, self.puzzle_id, self.puzzle_set, self.puzzle_subset, self.created
        )
    }
}

/// Insertable completion model. `created` is stamped by the store.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::foldit_puzzlecomplete)]
pub struct NewPuzzleComplete {
    user_id: i32,
    unique_user_id: String,
    puzzle_id: i32,
    puzzle_set: i32,
    puzzle_subset: i32,
}

/// Reduced view of a completion: the level reached and when.
///
/// Loaded directly from a `(puzzle_set, puzzle_subset, created)` select.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Getters, Serialize)]
pub struct CompletedPuzzle {
    set: i32,
    subset: i32,
    created: NaiveDateTime,
}

/// One row of the puzzle leaderboard.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, new)]
pub struct LeaderboardEntry {
    username: String,
    /// Sum of the user's best raw score on each ranked puzzle.
    total_score: f64,
    /// Score as shown to players; higher is better.
    display_score: f64,
}

/// Converts a raw Foldit total into the number shown to players.
///
/// Raw scores are energies where lower is better; each ranked puzzle
/// contributes an 8000 point offset.
#[instrument]
pub fn display_score(total: f64, puzzle_count: usize) -> f64 {
    (-total) * 10.0 + 8000.0 * puzzle_count as f64
}
