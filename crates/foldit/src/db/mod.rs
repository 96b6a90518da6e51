//! Database persistence layer for Foldit scores and puzzle completions.

mod error;
mod migrations;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use migrations::{MIGRATIONS, run_migrations};
pub use models::{
    CompletedPuzzle, LabelledCompletion, LeaderboardEntry, NewPuzzleComplete, NewScore, NewUser, PuzzleComplete,
    Score, User, display_score,
};
pub use repository::FolditRepository;
