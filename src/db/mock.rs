//! Mock database client for testing.
//!
//! Serves a fixed schema and canned query results, and records every query
//! it receives.

use super::{DatabaseBackend, DatabaseClient, QueryResult, Schema};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that returns predefined results.
#[derive(Default)]
pub struct MockDatabaseClient {
    schema: Schema,
    results: Vec<(String, QueryResult)>,
    failures: Vec<(String, String)>,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    /// Returns `result` for any query containing `pattern` (case-insensitive).
    pub fn with_result(mut self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.results.push((pattern.into().to_lowercase(), result));
        self
    }

    /// Fails any query containing `pattern` with the given message.
    pub fn with_failure(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .push((pattern.into().to_lowercase(), message.into()));
        self
    }

    /// Queries received so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|q| q.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        Ok(self.schema.clone())
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(sql.to_string());
        }

        let lowered = sql.to_lowercase();

        if let Some((_, message)) = self.failures.iter().find(|(p, _)| lowered.contains(p)) {
            return Err(ChatError::query(message.clone()));
        }

        Ok(self
            .results
            .iter()
            .find(|(p, _)| lowered.contains(p))
            .map(|(_, r)| r.clone())
            .unwrap_or_default())
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnInfo, Value};

    #[tokio::test]
    async fn test_canned_result_matches_pattern() {
        let client = MockDatabaseClient::new().with_result(
            "count(*)",
            QueryResult::with_data(
                vec![ColumnInfo::new("COUNT(*)", "INTEGER")],
                vec![vec![Value::Int(5)]],
            ),
        );

        let result = client
            .execute_query("SELECT COUNT(*) FROM STUDENT")
            .await
            .unwrap();
        assert_eq!(result.rows[0][0], Value::Int(5));

        let other = client.execute_query("SELECT 1").await.unwrap();
        assert!(other.is_empty());
        assert_eq!(client.executed().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_pattern() {
        let client = MockDatabaseClient::new().with_failure("missing", "no such table: missing");
        let err = client
            .execute_query("SELECT * FROM missing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }
}
