//! Library-level integration tests over a real SQLite file.

pub mod agent_test;
pub mod configurator_test;
pub mod session_test;

use dbchat::db::{create_sample, SAMPLE_SEED};
use std::path::PathBuf;
use tempfile::TempDir;

/// Creates the sample student database in a fresh temporary directory.
///
/// Keep the returned `TempDir` alive for as long as the file is used.
pub async fn sample_db() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("student.db");
    let created = create_sample(&path, SAMPLE_SEED)
        .await
        .expect("create sample database");
    assert!(created);
    (dir, path)
}
