//! Common test utilities for TUI tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A throwaway workspace holding the sample database and an empty config.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        Self { dir }
    }

    pub fn db_file(&self) -> PathBuf {
        self.dir.path().join("student.db")
    }

    fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Runs dbchat in headless mode against the workspace's sample database.
///
/// The sample is created on first use. `api_key` is exported as
/// `OPENAI_API_KEY` when given. Returns (exit code, stdout, stderr).
pub fn run_headless(
    workspace: &Workspace,
    api_key: Option<&str>,
    args: &[&str],
) -> (i32, String, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_dbchat"));
    command
        .current_dir(workspace.path())
        .arg("--headless")
        .arg("--init-sample")
        .arg("--llm")
        .arg("mock")
        .arg("--config")
        .arg(workspace.config_file())
        .arg("--db-file")
        .arg(workspace.db_file())
        .args(args)
        .env_remove("OPENAI_MODEL")
        .env_remove("MYSQL_HOST")
        .env_remove("MYSQL_USER")
        .env_remove("MYSQL_DATABASE")
        .env_remove("MYSQL_PWD")
        .env("RUST_LOG", "warn");

    match api_key {
        Some(key) => command.env("OPENAI_API_KEY", key),
        None => command.env_remove("OPENAI_API_KEY"),
    };

    let output = command.output().expect("Failed to execute dbchat");

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    (exit_code, stdout, stderr)
}
