//! Tests for database repository operations.

use chrono::TimeDelta;
use tempfile::NamedTempFile;

use foldit::{FolditRepository, NewPuzzleComplete, NewScore, User};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, FolditRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = FolditRepository::new(db_path).expect("Failed to create repository");
    repo.migrate().expect("Migrations failed");
    (db_file, repo)
}

fn completion(user: &User, anon: &str, puzzle_id: i32, set: i32, subset: i32) -> NewPuzzleComplete {
    NewPuzzleComplete::new(*user.id(), anon.to_string(), puzzle_id, set, subset)
}

fn score(user: &User, anon: &str, puzzle_id: i32, best: f64) -> NewScore {
    NewScore::new(*user.id(), anon.to_string(), puzzle_id, best, best + 10.0, 1)
}

#[test]
fn test_migrate_is_idempotent() {
    let (_db, repo) = setup_test_db();
    assert_eq!(repo.migrate().expect("Second migrate failed"), 0);
}

#[test]
fn test_create_and_get_user() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("alice".to_string()).expect("Create failed");
    assert_eq!(user.username(), "alice");

    let found = repo.get_user(*user.id()).expect("Query failed");
    assert_eq!(found.map(|u| u.username().clone()), Some("alice".to_string()));
    assert!(repo.get_user(9999).expect("Query failed").is_none());
}

#[test]
fn test_completed_puzzles_empty_for_unknown_user() {
    let (_db, repo) = setup_test_db();
    let completed = repo.completed_puzzles("nobody").expect("Query failed");
    assert!(completed.is_empty());
}

#[test]
fn test_level_complete_after_recording() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("bob".to_string()).expect("Create failed");

    repo.record_completion(completion(&user, "anon-bob", 994559, 4, 5))
        .expect("Record failed");

    assert!(repo.is_level_complete("anon-bob", 4, 5, None).expect("Query failed"));
    assert!(!repo.is_level_complete("anon-bob", 4, 6, None).expect("Query failed"));
    assert!(!repo.is_level_complete("anon-bob", 5, 5, None).expect("Query failed"));
    assert!(!repo.is_level_complete("anon-other", 4, 5, None).expect("Query failed"));
}

#[test]
fn test_level_complete_respects_due() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("carol".to_string()).expect("Create failed");

    let recorded = repo
        .record_completion(completion(&user, "anon-carol", 1, 2, 3))
        .expect("Record failed");
    let created = *recorded.created();

    let before = created - TimeDelta::seconds(1);
    let after = created + TimeDelta::hours(1);

    assert!(!repo
        .is_level_complete("anon-carol", 2, 3, Some(before))
        .expect("Query failed"));
    assert!(repo
        .is_level_complete("anon-carol", 2, 3, Some(created))
        .expect("Query failed"));
    assert!(repo
        .is_level_complete("anon-carol", 2, 3, Some(after))
        .expect("Query failed"));
}

#[test]
fn test_duplicate_completion_fails() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("dave".to_string()).expect("Create failed");

    repo.record_completion(completion(&user, "anon-dave", 10, 1, 1))
        .expect("First record failed");
    let err = repo
        .record_completion(completion(&user, "anon-dave", 10, 1, 1))
        .expect_err("Duplicate completion should fail");
    assert!(err.message.contains("UNIQUE constraint failed"), "{}", err);

    // Any differing key component is a distinct completion.
    repo.record_completion(completion(&user, "anon-dave", 10, 1, 2))
        .expect("Different subset failed");
    repo.record_completion(completion(&user, "anon-dave", 11, 1, 1))
        .expect("Different puzzle failed");
}

#[test]
fn test_completion_requires_existing_user() {
    let (_db, repo) = setup_test_db();
    let result = repo.record_completion(NewPuzzleComplete::new(
        4242,
        "anon-ghost".to_string(),
        1,
        1,
        1,
    ));
    assert!(result.is_err(), "Foreign key should reject unknown user");
}

#[test]
fn test_anonymous_id_longer_than_column_fails() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("erin".to_string()).expect("Create failed");
    let long_id = "x".repeat(51);
    let result = repo.record_completion(completion(&user, &long_id, 1, 1, 1));
    assert!(result.is_err(), "Anonymized id over 50 chars should fail");
}

#[test]
fn test_completed_puzzles_ordered_by_puzzle_id() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("frank".to_string()).expect("Create failed");

    repo.record_completion(completion(&user, "anon-frank", 30, 3, 1))
        .expect("Record failed");
    repo.record_completion(completion(&user, "anon-frank", 10, 1, 1))
        .expect("Record failed");
    repo.record_completion(completion(&user, "anon-frank", 20, 2, 1))
        .expect("Record failed");

    let completed = repo.completed_puzzles("anon-frank").expect("Query failed");
    let sets: Vec<i32> = completed.iter().map(|c| *c.set()).collect();
    assert_eq!(sets, vec![1, 2, 3]);
    assert!(completed.iter().all(|c| *c.subset() == 1));
}

#[test]
fn test_completed_puzzles_scoped_to_user() {
    let (_db, repo) = setup_test_db();
    let grace = repo.create_user("grace".to_string()).expect("Create failed");
    let hank = repo.create_user("hank".to_string()).expect("Create failed");

    repo.record_completion(completion(&grace, "anon-grace", 1, 1, 1))
        .expect("Record failed");
    repo.record_completion(completion(&hank, "anon-hank", 1, 1, 1))
        .expect("Record failed");
    repo.record_completion(completion(&hank, "anon-hank", 2, 1, 2))
        .expect("Record failed");

    assert_eq!(repo.completed_puzzles("anon-grace").expect("Query failed").len(), 1);
    assert_eq!(repo.completed_puzzles("anon-hank").expect("Query failed").len(), 2);
}

#[test]
fn test_ensure_completion_is_idempotent() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("ivy".to_string()).expect("Create failed");

    let (first, created) = repo
        .ensure_completion(completion(&user, "anon-ivy", 5, 1, 4))
        .expect("Ensure failed");
    assert!(created);

    let (second, created) = repo
        .ensure_completion(completion(&user, "anon-ivy", 5, 1, 4))
        .expect("Ensure failed");
    assert!(!created);
    assert_eq!(first.id(), second.id());
    assert_eq!(repo.completed_puzzles("anon-ivy").expect("Query failed").len(), 1);
}

#[test]
fn test_puzzle_complete_display() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("jack".to_string()).expect("Create failed");
    let stored = repo
        .record_completion(completion(&user, "anon-jack", 994559, 4, 5))
        .expect("Record failed");

    let rendered = stored.to_string();
    assert!(rendered.starts_with(&format!("PuzzleComplete({}, id=994559, set=4, subset=5, created=", user.id())));
}

#[test]
fn test_puzzle_complete_labelled_with_username() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("jill".to_string()).expect("Create failed");
    let stored = repo
        .record_completion(completion(&user, "anon-jill", 994559, 4, 5))
        .expect("Record failed");

    let rendered = stored.labelled(&user).to_string();
    assert_eq!(
        rendered,
        format!("PuzzleComplete(jill, id=994559, set=4, subset=5, created={})", stored.created())
    );
}

#[test]
fn test_record_score_allows_repeats() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("kim".to_string()).expect("Create failed");

    let first = repo.record_score(score(&user, "anon-kim", 7, -50.0)).expect("Record failed");
    repo.record_score(score(&user, "anon-kim", 7, -80.0)).expect("Record failed");

    assert_eq!(*first.best_score(), -50.0);
    assert_eq!(*first.current_score(), -40.0);
    assert_eq!(*first.score_version(), 1);
    assert_eq!(repo.scores_for("anon-kim").expect("Query failed").len(), 2);
}

#[test]
fn test_best_score() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("lee".to_string()).expect("Create failed");

    assert_eq!(repo.best_score("anon-lee", 7).expect("Query failed"), None);

    for best in [-10.0, -30.0, -20.0] {
        repo.record_score(score(&user, "anon-lee", 7, best)).expect("Record failed");
    }
    repo.record_score(score(&user, "anon-lee", 8, -99.0)).expect("Record failed");

    assert_eq!(repo.best_score("anon-lee", 7).expect("Query failed"), Some(-30.0));
}

#[test]
fn test_top_scores_ranks_lowest_totals_first() {
    let (_db, repo) = setup_test_db();
    let mia = repo.create_user("mia".to_string()).expect("Create failed");
    let ned = repo.create_user("ned".to_string()).expect("Create failed");
    let oli = repo.create_user("oli".to_string()).expect("Create failed");

    // mia: best -40 on 1, -10 on 2 => -50
    repo.record_score(score(&mia, "anon-mia", 1, -20.0)).expect("Record failed");
    repo.record_score(score(&mia, "anon-mia", 1, -40.0)).expect("Record failed");
    repo.record_score(score(&mia, "anon-mia", 2, -10.0)).expect("Record failed");
    // ned: -70 on 1 => -70
    repo.record_score(score(&ned, "anon-ned", 1, -70.0)).expect("Record failed");
    // oli: only an unranked puzzle
    repo.record_score(score(&oli, "anon-oli", 3, -500.0)).expect("Record failed");

    let board = repo.top_scores(10, &[1, 2]).expect("Leaderboard failed");
    let names: Vec<&str> = board.iter().map(|e| e.username().as_str()).collect();
    assert_eq!(names, vec!["ned", "mia"]);
    assert_eq!(*board[0].total_score(), -70.0);
    assert_eq!(*board[0].display_score(), 700.0 + 16_000.0);
    assert_eq!(*board[1].total_score(), -50.0);

    let top_one = repo.top_scores(1, &[1, 2]).expect("Leaderboard failed");
    assert_eq!(top_one.len(), 1);
    assert_eq!(top_one[0].username(), "ned");
}

#[test]
fn test_top_scores_empty_inputs() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("pat".to_string()).expect("Create failed");
    repo.record_score(score(&user, "anon-pat", 1, -5.0)).expect("Record failed");

    assert!(repo.top_scores(0, &[1]).expect("Leaderboard failed").is_empty());
    assert!(repo.top_scores(5, &[]).expect("Leaderboard failed").is_empty());
}

#[test]
fn test_ensure_completion_concurrent_callers_share_one_row() {
    let (_db, repo) = setup_test_db();
    let user = repo.create_user("quinn".to_string()).expect("Create failed");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let repo = repo.clone();
            let user = user.clone();
            std::thread::spawn(move || {
                (0..20)
                    .map(|_| repo.ensure_completion(completion(&user, "anon-quinn", 77, 3, 2)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut inserted = 0;
    let mut ids = Vec::new();
    for handle in handles {
        for result in handle.join().expect("Worker panicked") {
            let (stored, created) = result.expect("Ensure failed under contention");
            if created {
                inserted += 1;
            }
            ids.push(*stored.id());
        }
    }

    assert_eq!(inserted, 1);
    assert_eq!(ids.len(), 160);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert_eq!(repo.completed_puzzles("anon-quinn").expect("Query failed").len(), 1);
}
