//! Database repository for Foldit scores and puzzle completions.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::dsl::{exists, min};
use diesel::prelude::*;
use tracing::{debug, info, instrument};

use crate::db::{
    CompletedPuzzle, DbError, LeaderboardEntry, NewPuzzleComplete, NewScore, NewUser,
    PuzzleComplete, Score, User, display_score, run_migrations, schema,
};

/// How long a connection waits on a locked database, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5000;

/// Database repository for progress records.
#[derive(Debug, Clone)]
pub struct FolditRepository {
    db_path: String,
}

impl FolditRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path must not be empty"));
        }
        info!(path = %db_path, "Creating FolditRepository");
        Ok(Self { db_path })
    }

    /// Returns the database path this repository connects to.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Establishes a database connection with foreign keys enforced.
    ///
    /// Writers contending for the database wait up to
    /// [`BUSY_TIMEOUT_MS`] before failing with `database is locked`.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        diesel::sql_query(format!("PRAGMA busy_timeout = {}", BUSY_TIMEOUT_MS)).execute(&mut conn)?;
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
        Ok(conn)
    }

    /// Applies pending schema migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    #[instrument(skip(self))]
    pub fn migrate(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        run_migrations(&mut conn)
    }

    /// Creates a user row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the username is taken or a database error occurs.
    #[instrument(skip(self))]
    pub fn create_user(&self, username: String) -> Result<User, DbError> {
        debug!(username = %username, "Creating user");
        let mut conn = self.connection()?;

        let user = diesel::insert_into(schema::users::table)
            .values(&NewUser::new(username))
            .returning(User::as_returning())
            .get_result(&mut conn)?;

        info!(user_id = user.id(), username = %user.username(), "User created");
        Ok(user)
    }

    /// Gets a user by id. Returns `None` if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn get_user(&self, user_id: i32) -> Result<Option<User>, DbError> {
        let mut conn = self.connection()?;

        let user = schema::users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .optional()?;

        debug!(found = user.is_some(), "User lookup finished");
        Ok(user)
    }

    /// Records a score submission. Every submission is a new row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the user does not exist or a database error occurs.
    #[instrument(skip(self, score), fields(user_id = score.user_id(), puzzle_id = score.puzzle_id()))]
    pub fn record_score(&self, score: NewScore) -> Result<Score, DbError> {
        debug!("Recording score");
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::foldit_score::table)
            .values(&score)
            .returning(Score::as_returning())
            .get_result(&mut conn)?;

        info!(
            score_id = stored.id(),
            best_score = stored.best_score(),
            current_score = stored.current_score(),
            "Score recorded"
        );
        Ok(stored)
    }

    /// Gets every score for an anonymized user id, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn scores_for(&self, anonymous_user_id: &str) -> Result<Vec<Score>, DbError> {
        use schema::foldit_score::dsl;

        let mut conn = self.connection()?;
        let scores = dsl::foldit_score
            .filter(dsl::unique_user_id.eq(anonymous_user_id))
            .order((dsl::created.desc(), dsl::id.desc()))
            .select(Score::as_select())
            .load(&mut conn)?;

        info!(count = scores.len(), "Scores loaded");
        Ok(scores)
    }

    /// Gets the lowest best score an anonymized user reached on a puzzle.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn best_score(
        &self,
        anonymous_user_id: &str,
        puzzle_id: i32,
    ) -> Result<Option<f64>, DbError> {
        use schema::foldit_score::dsl;

        let mut conn = self.connection()?;
        let best = dsl::foldit_score
            .filter(dsl::unique_user_id.eq(anonymous_user_id))
            .filter(dsl::puzzle_id.eq(puzzle_id))
            .select(min(dsl::best_score))
            .get_result::<Option<f64>>(&mut conn)?;

        debug!(?best, "Best score computed");
        Ok(best)
    }

    /// Ranks users by their summed best scores over `puzzles`.
    ///
    /// For each user the lowest `best_score` per puzzle is taken and the
    /// per-puzzle values are summed. Lower totals rank first; at most `n`
    /// entries are returned.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn top_scores(&self, n: usize, puzzles: &[i32]) -> Result<Vec<LeaderboardEntry>, DbError> {
        if n == 0 || puzzles.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection()?;
        let rows = schema::foldit_score::table
            .inner_join(schema::users::table)
            .filter(schema::foldit_score::puzzle_id.eq_any(puzzles))
            .select((
                schema::users::username,
                schema::foldit_score::puzzle_id,
                schema::foldit_score::best_score,
            ))
            .load::<(String, i32, f64)>(&mut conn)?;

        let mut best: BTreeMap<(String, i32), f64> = BTreeMap::new();
        for (username, puzzle_id, score) in rows {
            best.entry((username, puzzle_id))
                .and_modify(|b| *b = b.min(score))
                .or_insert(score);
        }

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for ((username, _), score) in best {
            *totals.entry(username).or_insert(0.0) += score;
        }

        // Stable sort keeps username order among equal totals.
        let mut entries: Vec<LeaderboardEntry> = totals
            .into_iter()
            .map(|(username, total)| {
                LeaderboardEntry::new(username, total, display_score(total, puzzles.len()))
            })
            .collect();
        entries.sort_by(|a, b| a.total_score().total_cmp(b.total_score()));
        entries.truncate(n);

        info!(count = entries.len(), "Leaderboard computed");
        Ok(entries)
    }

    /// Records a puzzle completion.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the same (user, puzzle, set, subset) was
    /// already recorded, or a database error occurs.
    #[instrument(skip(self, completion), fields(
        user_id = completion.user_id(),
        puzzle_id = completion.puzzle_id(),
        set = completion.puzzle_set(),
        subset = completion.puzzle_subset(),
    ))]
    pub fn record_completion(
        &self,
        completion: NewPuzzleComplete,
    ) -> Result<PuzzleComplete, DbError> {
        debug!("Recording completion");
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::foldit_puzzlecomplete::table)
            .values(&completion)
            .returning(PuzzleComplete::as_returning())
            .get_result(&mut conn)?;

        info!(completion = %stored, "Completion recorded");
        Ok(stored)
    }

    /// Returns the existing completion for the same key, or records it.
    ///
    /// The flag is `true` when a new row was inserted. The lookup and insert
    /// run under a write lock taken up front, so concurrent callers with the
    /// same key see the first caller's row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, completion), fields(
        user_id = completion.user_id(),
        puzzle_id = completion.puzzle_id(),
    ))]
    pub fn ensure_completion(
        &self,
        completion: NewPuzzleComplete,
    ) -> Result<(PuzzleComplete, bool), DbError> {
        use schema::foldit_puzzlecomplete::dsl;

        let mut conn = self.connection()?;
        conn.immediate_transaction::<_, DbError, _>(|conn| {
            let existing = dsl::foldit_puzzlecomplete
                .filter(dsl::user_id.eq(*completion.user_id()))
                .filter(dsl::puzzle_id.eq(*completion.puzzle_id()))
                .filter(dsl::puzzle_set.eq(*completion.puzzle_set()))
                .filter(dsl::puzzle_subset.eq(*completion.puzzle_subset()))
                .select(PuzzleComplete::as_select())
                .first(conn)
                .optional()?;

            if let Some(found) = existing {
                debug!(completion_id = found.id(), "Completion already recorded");
                return Ok((found, false));
            }

            let stored = diesel::insert_into(dsl::foldit_puzzlecomplete)
                .values(&completion)
                .returning(PuzzleComplete::as_returning())
                .get_result(conn)?;

            info!(completion = %stored, "Completion recorded");
            Ok((stored, true))
        })
    }

    /// Lists the levels an anonymized user completed, by ascending puzzle id.
    ///
    /// Returns an empty list when the user has no completions.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn completed_puzzles(
        &self,
        anonymous_user_id: &str,
    ) -> Result<Vec<CompletedPuzzle>, DbError> {
        use schema::foldit_puzzlecomplete::dsl;

        let mut conn = self.connection()?;
        let completed = dsl::foldit_puzzlecomplete
            .filter(dsl::unique_user_id.eq(anonymous_user_id))
            .order((dsl::puzzle_id.asc(), dsl::id.asc()))
            .select((dsl::puzzle_set, dsl::puzzle_subset, dsl::created))
            .load::<CompletedPuzzle>(&mut conn)?;

        info!(count = completed.len(), "Completed puzzles loaded");
        Ok(completed)
    }

    /// Checks whether an anonymized user completed `level`-`sub_level`.
    ///
    /// With `due`, only completions created at or before it count.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn is_level_complete(
        &self,
        anonymous_user_id: &str,
        level: i32,
        sub_level: i32,
        due: Option<NaiveDateTime>,
    ) -> Result<bool, DbError> {
        use schema::foldit_puzzlecomplete::dsl;

        let mut conn = self.connection()?;
        let matching = dsl::foldit_puzzlecomplete
            .filter(dsl::unique_user_id.eq(anonymous_user_id))
            .filter(dsl::puzzle_set.eq(level))
            .filter(dsl::puzzle_subset.eq(sub_level));

        let complete = match due {
            Some(due) => diesel::select(exists(matching.filter(dsl::created.le(due))))
                .get_result::<bool>(&mut conn)?,
            None => diesel::select(exists(matching)).get_result::<bool>(&mut conn)?,
        };

        debug!(complete, "Level completion checked");
        Ok(complete)
    }
}
