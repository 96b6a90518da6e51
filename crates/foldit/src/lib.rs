//! Foldit progress records.
//!
//! Persists the scores users reach on Foldit puzzles and the puzzle levels
//! they complete, and answers the lookups a course needs to grade them.
//!
//! # Architecture
//!
//! - **db**: Diesel models, embedded migrations and [`FolditRepository`]
//! - **identity**: anonymized user ids ([`AnonymousIdentity`])
//! - **service**: [`ProgressService`], keyed by real user ids
//! - **config**: [`FolditConfig`] loaded from TOML
//!
//! # Example
//!
//! ```no_run
//! use foldit::{FolditRepository, Level, ProgressService, SaltedDigest};
//!
//! # fn example() -> anyhow::Result<()> {
//! let repository = FolditRepository::new("foldit.db".to_string())?;
//! repository.migrate()?;
//!
//! let service = ProgressService::new(repository, SaltedDigest::new("secret"));
//! let done = service.is_level_complete(42, "4-5".parse::<Level>()?, None)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod identity;
mod level;
mod service;

// Crate-level exports - Persistence
pub use db::{
    CompletedPuzzle, DbError, FolditRepository, LabelledCompletion, LeaderboardEntry, MIGRATIONS, NewPuzzleComplete,
    NewScore, NewUser, PuzzleComplete, Score, User, display_score, run_migrations,
};

// Crate-level exports - Identity
pub use identity::{ANONYMOUS_ID_MAX_LEN, AnonymousIdentity, SaltedDigest};

// Crate-level exports - Levels
pub use level::{Level, LevelParseError};

// Crate-level exports - Service
pub use service::{ProgressService, PuzzleLevel, PuzzleScore};

// Crate-level exports - Configuration
pub use config::{ConfigError, FolditConfig, SECRET_KEY_ENV};
