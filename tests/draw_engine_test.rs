//! Tests for the digit draw and quarter-winner computation.

use diesel::Connection;
use diesel::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::NamedTempFile;

use superbowl_squares::{
    Axis, BoardAuthority, BoardRepository, Digits, DrawEngine, DrawError, User,
};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

fn setup_test_db() -> (NamedTempFile, DrawEngine) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let mut conn = SqliteConnection::establish(&db_path).expect("Failed to connect");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Migrations failed");

    let repo = BoardRepository::new(db_path).expect("Failed to create repository");
    repo.initialize().expect("Seeding failed");
    (db_file, DrawEngine::new(repo))
}

fn make_admin(engine: &DrawEngine) -> User {
    engine
        .repository()
        .create_user("admin", "Admin", true)
        .expect("Create failed")
}

fn assert_permutation(digits: &Digits) {
    let mut seen = [false; 10];
    for &d in digits.as_slice() {
        assert!(d <= 9, "digit out of range");
        assert!(!seen[d as usize], "digit repeated");
        seen[d as usize] = true;
    }
}

#[test]
fn test_randomize_both_yields_two_permutations() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    let (rows, cols) = engine
        .randomize_digits(&admin, Axis::Both)
        .expect("Randomize failed");
    assert_permutation(&rows);
    assert_permutation(&cols);
    assert!(engine.digits_assigned().expect("Check failed"));

    // Persisted, not just returned.
    let (stored_rows, stored_cols) = engine.digits().expect("Read failed");
    assert_eq!(stored_rows, Some(rows));
    assert_eq!(stored_cols, Some(cols));
}

#[test]
fn test_rerandomize_never_corrupts_permutation() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    for _ in 0..10 {
        let (rows, cols) = engine
            .randomize_digits(&admin, Axis::Both)
            .expect("Randomize failed");
        assert_permutation(&rows);
        assert_permutation(&cols);
    }
}

#[test]
fn test_randomize_single_axis_preserves_other() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    let (_, cols_before) = engine
        .randomize_digits(&admin, Axis::Both)
        .expect("Randomize failed");
    let (rows_after, cols_after) = engine
        .randomize_digits(&admin, Axis::Rows)
        .expect("Randomize failed");

    assert_eq!(cols_after, cols_before);
    assert_permutation(&rows_after);
}

#[test]
fn test_randomize_single_axis_backfills_unset_other() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    // No prior assignment at all: randomizing just the rows must not
    // leave the columns unset.
    let (rows, cols) = engine
        .randomize_digits(&admin, Axis::Rows)
        .expect("Randomize failed");
    assert_permutation(&rows);
    assert_permutation(&cols);
    assert!(engine.digits_assigned().expect("Check failed"));
}

#[test]
fn test_randomize_requires_admin() {
    let (_db, engine) = setup_test_db();
    let user = engine
        .repository()
        .create_user("alice", "Alice", false)
        .expect("Create failed");

    let result = engine.randomize_digits(&user, Axis::Both);
    assert!(matches!(result, Err(DrawError::AdminRequired)));
    assert!(!engine.digits_assigned().expect("Check failed"));
}

#[test]
fn test_set_digits_manual() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    engine
        .set_digits(
            &admin,
            &[3, 0, 1, 9, 8, 7, 6, 5, 4, 2],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        )
        .expect("Set failed");

    let (rows, cols) = engine.digits().expect("Read failed");
    assert_eq!(
        rows.expect("rows unset").as_slice(),
        &[3, 0, 1, 9, 8, 7, 6, 5, 4, 2]
    );
    assert_eq!(
        cols.expect("cols unset").as_slice(),
        &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
    );
}

#[test]
fn test_set_digits_rejects_invalid_assignment() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    let result = engine.set_digits(
        &admin,
        &[0, 0, 1, 2, 3, 4, 5, 6, 7, 8],
        &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    );
    assert!(matches!(result, Err(DrawError::InvalidDigitAssignment)));
    // Nothing was written, not even the valid axis.
    assert!(!engine.digits_assigned().expect("Check failed"));
    let (rows, cols) = engine.digits().expect("Read failed");
    assert!(rows.is_none());
    assert!(cols.is_none());
}

#[test]
fn test_clear_digits_unsets_both_axes() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    engine
        .randomize_digits(&admin, Axis::Both)
        .expect("Randomize failed");
    engine.clear_digits(&admin).expect("Clear failed");

    assert!(!engine.digits_assigned().expect("Check failed"));
    assert!(engine.winner_square(1).expect("Winner failed").is_none());
}

#[test]
fn test_winner_undefined_while_digits_unset() {
    let (_db, engine) = setup_test_db();
    assert!(engine.winner_square(1).expect("Winner failed").is_none());
    assert!(engine.quarter_winners().expect("Winners failed").is_none());
}

#[test]
fn test_winner_square_last_digit_lookup() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    // Row digit 3 sits at row index 0; column digit 4 at column index 4.
    engine
        .set_digits(
            &admin,
            &[3, 0, 1, 9, 8, 7, 6, 5, 4, 2],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        )
        .expect("Set failed");
    engine.record_score(&admin, 1, 23, 14).expect("Score failed");

    let winner = engine
        .winner_square(1)
        .expect("Winner failed")
        .expect("Digits set");
    assert_eq!(*winner.rows_last_digit(), 3);
    assert_eq!(*winner.cols_last_digit(), 4);
    assert_eq!(winner.square().row(), 0);
    assert_eq!(winner.square().col(), 4);
    assert_eq!(winner.square().index(), 4);
    assert!(winner.owner_display_name().is_none());
}

#[test]
fn test_winner_is_pure_and_tracks_updates() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    engine
        .set_digits(
            &admin,
            &[3, 0, 1, 9, 8, 7, 6, 5, 4, 2],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        )
        .expect("Set failed");
    engine.record_score(&admin, 2, 10, 7).expect("Score failed");

    let first = engine.winner_square(2).expect("Winner failed").expect("set");
    let second = engine.winner_square(2).expect("Winner failed").expect("set");
    assert_eq!(first.square(), second.square());

    // Changing the stored score changes the reported winner on next read.
    engine.record_score(&admin, 2, 13, 7).expect("Score failed");
    let third = engine.winner_square(2).expect("Winner failed").expect("set");
    assert_eq!(*third.rows_last_digit(), 3);
    assert_ne!(third.square(), first.square());
}

#[test]
fn test_winner_names_square_owner() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);
    let board = BoardAuthority::new(engine.repository().clone());
    let alice = engine
        .repository()
        .create_user("alice", "Alice", false)
        .expect("Create failed");

    engine
        .set_digits(
            &admin,
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
            &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
        )
        .expect("Set failed");
    // Scores 0:0 win at row 0, column 0 - square #0.
    board.apply_changes(&alice, &[0], &[]).expect("Batch failed");

    let winner = engine
        .winner_square(1)
        .expect("Winner failed")
        .expect("Digits set");
    assert_eq!(winner.square().index(), 0);
    assert_eq!(winner.owner_display_name().as_deref(), Some("Alice"));
}

#[test]
fn test_quarter_winners_covers_all_quarters() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    engine
        .randomize_digits(&admin, Axis::Both)
        .expect("Randomize failed");
    engine.record_score(&admin, 3, 21, 17).expect("Score failed");

    let winners = engine
        .quarter_winners()
        .expect("Winners failed")
        .expect("Digits set");
    assert_eq!(winners.len(), 4);
    assert_eq!(*winners[2].quarter(), 3);
    assert_eq!(*winners[2].rows_score(), 21);
    assert_eq!(*winners[2].cols_score(), 17);
}

#[test]
fn test_record_score_validation() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);
    let user = engine
        .repository()
        .create_user("alice", "Alice", false)
        .expect("Create failed");

    assert!(matches!(
        engine.record_score(&user, 1, 7, 7),
        Err(DrawError::AdminRequired)
    ));
    assert!(matches!(
        engine.record_score(&admin, 0, 7, 7),
        Err(DrawError::InvalidQuarter { quarter: 0 })
    ));
    assert!(matches!(
        engine.record_score(&admin, 5, 7, 7),
        Err(DrawError::InvalidQuarter { quarter: 5 })
    ));
    assert!(matches!(
        engine.record_score(&admin, 1, -3, 7),
        Err(DrawError::InvalidScore { .. })
    ));
}

#[test]
fn test_record_score_overwrites_unconditionally() {
    let (_db, engine) = setup_test_db();
    let admin = make_admin(&engine);

    engine.record_score(&admin, 4, 28, 24).expect("Score failed");
    engine.record_score(&admin, 4, 3, 0).expect("Score failed");

    let score = engine.repository().get_score(4).expect("Get failed");
    assert_eq!(*score.rows_score(), 3);
    assert_eq!(*score.cols_score(), 0);
}
