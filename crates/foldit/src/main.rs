//! Foldit progress store - operator CLI
//!
//! Applies the schema and records or queries progress from the shell.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use foldit::{FolditConfig, FolditRepository, ProgressService, PuzzleLevel, PuzzleScore};
use serde::Serialize;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // stdout carries JSON results; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    let repository = FolditRepository::new(config.database_path().clone())?;

    match cli.command {
        Command::Migrate => {
            let applied = repository.migrate()?;
            info!(applied, "Schema up to date");
            Ok(())
        }
        Command::CreateUser { username } => print_json(&repository.create_user(username)?),
        Command::RecordScore {
            user_id,
            puzzle_id,
            best,
            current,
            score_version,
        } => {
            let service = ProgressService::new(repository, config.identity()?);
            let scores = service.submit_scores(
                user_id,
                &[PuzzleScore::new(puzzle_id, best, current, score_version)],
            )?;
            print_json(&scores)
        }
        Command::Complete {
            user_id,
            puzzle_id,
            level,
        } => {
            let service = ProgressService::new(repository, config.identity()?);
            let created =
                service.submit_completions(user_id, &[PuzzleLevel::new(puzzle_id, level)])?;
            print_json(&serde_json::json!({ "level": level.to_string(), "created": created == 1 }))
        }
        Command::Completed { user_id } => {
            let service = ProgressService::new(repository, config.identity()?);
            print_json(&service.completed_puzzles(user_id)?)
        }
        Command::LevelComplete {
            user_id,
            level,
            due,
        } => {
            let service = ProgressService::new(repository, config.identity()?);
            let complete = service.is_level_complete(user_id, level, due)?;
            print_json(&serde_json::json!({ "level": level.to_string(), "complete": complete }))
        }
        Command::Leaderboard { top, puzzles } => {
            let n = top.unwrap_or(*config.leaderboard_size());
            let puzzles = if puzzles.is_empty() {
                config.leaderboard_puzzles().clone()
            } else {
                puzzles
            };
            print_json(&repository.top_scores(n, &puzzles)?)
        }
    }
}

/// Loads the config file if present, then applies env and CLI overrides.
#[instrument(skip(cli))]
fn load_config(cli: &Cli) -> Result<FolditConfig> {
    let config = if cli.config.exists() {
        FolditConfig::from_file(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        debug!(path = %cli.config.display(), "No config file, using defaults");
        FolditConfig::default()
    };

    let config = config.with_env_overrides();
    Ok(match &cli.db_path {
        Some(path) => config.with_database_path(path.clone()),
        None => config,
    })
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
