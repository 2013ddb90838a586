//! Database abstraction layer for dbchat.
//!
//! Provides a trait-based interface for database operations so the agent
//! toolkit works the same against the embedded SQLite file and a remote
//! MySQL server.

mod mock;
mod mysql;
mod schema;
mod sqlite;
mod types;

pub use mock::MockDatabaseClient;
pub use mysql::MySqlClient;
pub use schema::{Column, ForeignKey, Schema, Table};
pub use sqlite::{create_sample, SqliteClient, SAMPLE_SEED};
pub use types::{ColumnInfo, QueryResult, Row, Value, MAX_ROWS};

use crate::connection::ConnectionDescriptor;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    MySql,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }

    /// SQL dialect name as the agent is told about it.
    pub fn dialect_name(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::MySql => "mysql",
        }
    }

    /// Quotes an identifier for this backend.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Self::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            Self::MySql => format!("`{}`", name.replace('`', "``")),
        }
    }
}

/// Opens a database client for the given descriptor.
///
/// This is the central factory function for database connections.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Box<dyn DatabaseClient>> {
    match descriptor {
        ConnectionDescriptor::Embedded { path } => {
            let client = SqliteClient::open_read_only(path).await?;
            Ok(Box::new(client))
        }
        ConnectionDescriptor::Remote(details) => {
            let client = MySqlClient::connect(details).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with ChatError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Introspects the database schema, returning table and relationship information.
    async fn introspect_schema(&self) -> Result<Schema>;

    /// Executes a SQL query and returns the results.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Returns which backend this client talks to.
    fn backend(&self) -> DatabaseBackend;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_identifier() {
        assert_eq!(DatabaseBackend::Sqlite.quote_identifier("STUDENT"), "\"STUDENT\"");
        assert_eq!(DatabaseBackend::Sqlite.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(DatabaseBackend::MySql.quote_identifier("order"), "`order`");
        assert_eq!(DatabaseBackend::MySql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(DatabaseBackend::Sqlite.as_str(), "sqlite");
        assert_eq!(DatabaseBackend::MySql.dialect_name(), "mysql");
    }
}
