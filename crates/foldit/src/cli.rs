//! Command-line interface for the foldit progress store.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use foldit::Level;

/// Foldit progress store - scores and completed puzzle levels
#[derive(Parser, Debug)]
#[command(name = "foldit")]
#[command(about = "Inspect and record Foldit puzzle progress", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (ignored if missing)
    #[arg(short, long, default_value = "foldit.toml")]
    pub config: PathBuf,

    /// Database path, overriding the config file
    #[arg(long)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Create a user row
    CreateUser {
        /// Unique username
        #[arg(long)]
        username: String,
    },

    /// Record a puzzle score for a user
    RecordScore {
        /// Platform user id
        #[arg(long)]
        user_id: i32,

        /// Foldit puzzle id
        #[arg(long)]
        puzzle_id: i32,

        /// Best score reached
        #[arg(long, allow_negative_numbers = true)]
        best: f64,

        /// Score of the current solution
        #[arg(long, allow_negative_numbers = true)]
        current: f64,

        /// Score format version
        #[arg(long, default_value = "1")]
        score_version: i32,
    },

    /// Record a completed puzzle level (no-op if already recorded)
    Complete {
        /// Platform user id
        #[arg(long)]
        user_id: i32,

        /// Foldit puzzle id
        #[arg(long)]
        puzzle_id: i32,

        /// Level as set-subset, e.g. 4-5
        #[arg(long)]
        level: Level,
    },

    /// List the levels a user completed (JSON)
    Completed {
        /// Platform user id
        #[arg(long)]
        user_id: i32,
    },

    /// Check whether a user completed a level (JSON)
    LevelComplete {
        /// Platform user id
        #[arg(long)]
        user_id: i32,

        /// Level as set-subset, e.g. 4-5
        #[arg(long)]
        level: Level,

        /// Only count completions at or before this time (e.g. 2026-10-17T12:00:00)
        #[arg(long)]
        due: Option<NaiveDateTime>,
    },

    /// Show the puzzle leaderboard (JSON)
    Leaderboard {
        /// Number of rows, defaulting to the configured size
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// Puzzle to rank (repeatable), defaulting to the configured puzzles
        #[arg(long = "puzzle")]
        puzzles: Vec<i32>,
    },
}
