//! SQLite database client for the embedded database.
//!
//! The embedded file is always opened read-only. `create_sample` is the only
//! code path that writes to it, and only when the file does not exist yet.

use crate::db::{
    Column, ColumnInfo, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Row, Schema,
    Table, Value, MAX_ROWS,
};
use crate::error::{ChatError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Connection, Row as SqlxRow, TypeInfo, ValueRef};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Query timeout in seconds.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Seed script for the sample student database.
pub const SAMPLE_SEED: &str = include_str!("../../data/student.sql");

/// Read-only SQLite client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
    path: PathBuf,
}

impl SqliteClient {
    /// Opens the database file read-only.
    ///
    /// A missing file is reported as a connection error rather than being
    /// created.
    pub async fn open_read_only(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ChatError::connection(format!(
                "Database file not found: {}. Run with --init-sample to create it.",
                path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| map_open_error(e, path))?;

        debug!(path = %path.display(), "Opened SQLite database read-only");

        Ok(Self {
            pool,
            path: path.to_path_buf(),
        })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn fetch_tables(&self) -> Result<Vec<Table>> {
        let table_names: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to fetch tables: {e}")))?;

        let mut tables = Vec::with_capacity(table_names.len());
        for name in table_names {
            tables.push(self.fetch_table(name).await?);
        }

        Ok(tables)
    }

    async fn fetch_table(&self, name: String) -> Result<Table> {
        let rows: Vec<(String, String, i64, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", dflt_value, pk
            FROM pragma_table_info(?)
            ORDER BY cid
            "#,
        )
        .bind(&name)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChatError::query(format!("Failed to fetch columns for {name}: {e}")))?;

        let mut pk_columns: Vec<(i64, String)> = Vec::new();
        let columns = rows
            .into_iter()
            .map(|(column, data_type, not_null, default, pk)| {
                if pk > 0 {
                    pk_columns.push((pk, column.clone()));
                }
                Column {
                    name: column,
                    data_type,
                    is_nullable: not_null == 0,
                    default,
                }
            })
            .collect();

        pk_columns.sort_by_key(|(position, _)| *position);

        Ok(Table {
            name,
            columns,
            primary_key: pk_columns.into_iter().map(|(_, c)| c).collect(),
        })
    }

    async fn fetch_foreign_keys(&self, tables: &[Table]) -> Result<Vec<ForeignKey>> {
        let mut foreign_keys = Vec::new();

        for table in tables {
            let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(
                r#"
                SELECT id, "table", "from", "to"
                FROM pragma_foreign_key_list(?)
                ORDER BY id, seq
                "#,
            )
            .bind(&table.name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                ChatError::query(format!(
                    "Failed to fetch foreign keys for {}: {e}",
                    table.name
                ))
            })?;

            // Group multi-column constraints by id.
            let mut by_id: BTreeMap<i64, ForeignKey> = BTreeMap::new();
            for (id, to_table, from_column, to_column) in rows {
                let fk = by_id.entry(id).or_insert_with(|| {
                    ForeignKey::new(table.name.clone(), Vec::new(), to_table, Vec::new())
                });
                fk.from_columns.push(from_column.clone());
                fk.to_columns.push(to_column.unwrap_or(from_column));
            }
            foreign_keys.extend(by_id.into_values());
        }

        Ok(foreign_keys)
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn introspect_schema(&self) -> Result<Schema> {
        let tables = self.fetch_tables().await?;
        let foreign_keys = self.fetch_foreign_keys(&tables).await?;

        Ok(Schema {
            tables,
            foreign_keys,
        })
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_secs(QUERY_TIMEOUT_SECS),
            sqlx::query(sql).fetch_all(&self.pool),
        )
        .await
        .map_err(|_| {
            ChatError::query(format!(
                "Query timed out after {QUERY_TIMEOUT_SECS} seconds"
            ))
        })?
        .map_err(|e| ChatError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = result
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect()
            })
            .unwrap_or_default();

        let was_truncated = result.len() > MAX_ROWS;
        if was_truncated {
            warn!(
                "Query returned {} rows, truncating to {} rows",
                result.len(),
                MAX_ROWS
            );
        }

        let rows: Vec<Row> = result.iter().take(MAX_ROWS).map(convert_row).collect();

        Ok(QueryResult {
            columns,
            rows,
            execution_time,
            was_truncated,
        })
    }

    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts one value using its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),
        "REAL" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),
        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),
        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn map_open_error(error: sqlx::Error, path: &Path) -> ChatError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("unable to open") {
        ChatError::connection(format!(
            "Unable to open database file {}. Check that it exists and is readable.",
            path.display()
        ))
    } else if error_str.contains("not a database") || error_str.contains("malformed") {
        ChatError::connection(format!(
            "{} is not a valid SQLite database.",
            path.display()
        ))
    } else {
        ChatError::connection(error.to_string())
    }
}

fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => format!("ERROR: {}", db_error.message()),
        None => error.to_string(),
    }
}

/// Creates a SQLite database at `path` from a seed script.
///
/// Returns `Ok(false)` without touching anything when the file already
/// exists.
pub async fn create_sample(path: &Path, seed: &str) -> Result<bool> {
    if path.exists() {
        info!(path = %path.display(), "Sample database already exists");
        return Ok(false);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            ChatError::internal(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let mut conn = SqliteConnection::connect_with(&options)
        .await
        .map_err(|e| map_open_error(e, path))?;

    sqlx::raw_sql(seed)
        .execute(&mut conn)
        .await
        .map_err(|e| ChatError::query(format!("Failed to seed sample database: {e}")))?;

    conn.close()
        .await
        .map_err(|e| ChatError::internal(format!("Failed to close sample database: {e}")))?;

    info!(path = %path.display(), "Created sample database");
    Ok(true)
}
