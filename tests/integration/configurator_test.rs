//! Connection configurator tests with the real sqlx connector.

use std::sync::Arc;
use std::time::Duration;

use dbchat::connection::{ConnectionConfigurator, ConnectionForm, INCOMPLETE_REMOTE_MESSAGE};
use dbchat::db::Value;
use tokio_test::{assert_err, assert_ok};

use super::sample_db;

fn configurator(path: &std::path::Path) -> ConnectionConfigurator {
    ConnectionConfigurator::with_sqlx(Duration::from_secs(60), path)
}

#[tokio::test]
async fn test_embedded_handle_is_cached() {
    let (_dir, path) = sample_db().await;
    let configurator = configurator(&path);

    let first = configurator
        .configure_form(&ConnectionForm::embedded())
        .await
        .unwrap();
    let second = configurator
        .configure_form(&ConnectionForm::embedded())
        .await
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(configurator.cache().len(), 1);
}

#[tokio::test]
async fn test_embedded_handle_is_read_only() {
    let (_dir, path) = sample_db().await;
    let handle = configurator(&path)
        .configure_form(&ConnectionForm::embedded())
        .await
        .unwrap();

    let write = handle
        .execute_query("INSERT INTO STUDENT (NAME, CLASS, SECTION, MARKS) VALUES ('Eve', 'AI', 'C', 70)")
        .await;
    assert_err!(write, "writes must fail on the embedded handle");

    let count = assert_ok!(handle.execute_query("SELECT COUNT(*) FROM STUDENT").await);
    assert_eq!(count.rows[0][0], Value::Int(5));
}

#[tokio::test]
async fn test_embedded_schema_lists_student_table() {
    let (_dir, path) = sample_db().await;
    let handle = configurator(&path)
        .configure_form(&ConnectionForm::embedded())
        .await
        .unwrap();

    let schema = handle.introspect_schema().await.unwrap();
    let student = schema.find_table("STUDENT").expect("STUDENT table");
    let columns: Vec<&str> = student.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(columns, vec!["NAME", "CLASS", "SECTION", "MARKS"]);
}

#[tokio::test]
async fn test_missing_embedded_file_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let configurator = configurator(&dir.path().join("absent.db"));

    let err = configurator
        .configure_form(&ConnectionForm::embedded())
        .await
        .err()
        .unwrap();

    assert_eq!(err.category(), "Connection Error");
    assert!(configurator.cache().is_empty());
    assert!(!dir.path().join("absent.db").exists());
}

#[tokio::test]
async fn test_incomplete_remote_form_opens_nothing() {
    let (_dir, path) = sample_db().await;
    let configurator = configurator(&path);
    let form = ConnectionForm::remote("", "reader", "p@ss#1!", "school");

    let err = configurator.configure_form(&form).await.err().unwrap();

    assert!(err.is_missing_input());
    assert_eq!(err.to_string(), INCOMPLETE_REMOTE_MESSAGE);
    assert!(configurator.cache().is_empty());
}
