//! SQL tools exposed to the agent.
//!
//! Tool failures that the model can recover from (unknown tables, database
//! errors, rejected statements) are returned as observation text. Only
//! language model failures propagate as errors.

use std::sync::Arc;
use std::time::Instant;

use crate::connection::SharedClient;
use crate::error::Result;
use crate::llm::{LlmClient, Message};
use crate::safety::SqlClassifier;

use super::prompt::query_checker_prompt;

/// Number of sample rows shown under each table definition.
const SAMPLE_ROWS: usize = 3;

/// Name and description of a tool, as listed in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
}

/// The tools the agent can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Query,
    Schema,
    ListTables,
    QueryChecker,
}

impl ToolKind {
    /// All tools in prompt order.
    pub const ALL: [ToolKind; 4] = [
        ToolKind::Query,
        ToolKind::Schema,
        ToolKind::ListTables,
        ToolKind::QueryChecker,
    ];

    /// Name the model uses to call the tool.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Query => "sql_db_query",
            Self::Schema => "sql_db_schema",
            Self::ListTables => "sql_db_list_tables",
            Self::QueryChecker => "sql_db_query_checker",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Query => {
                "Input to this tool is a detailed and correct SQL query, output is a result from the database. \
                 If the query is not correct, an error message will be returned. \
                 If an error is returned, rewrite the query, check the query, and try again. \
                 If you encounter an issue with Unknown column 'xxxx' in 'field list', \
                 use sql_db_schema to query the correct table fields."
            }
            Self::Schema => {
                "Input to this tool is a comma-separated list of tables, output is the schema and sample rows for those tables. \
                 Be sure that the tables actually exist by calling sql_db_list_tables first! \
                 Example Input: table1, table2, table3"
            }
            Self::ListTables => {
                "Input is an empty string, output is a comma-separated list of tables in the database."
            }
            Self::QueryChecker => {
                "Use this tool to double check if your query is correct before executing it. \
                 Always use this tool before executing a query with sql_db_query!"
            }
        }
    }

    /// Looks a tool up by the name the model wrote.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name.trim())
    }

    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name(),
            description: self.description(),
        }
    }
}

/// The database and model a set of tools works against.
#[derive(Clone)]
pub struct SqlToolkit {
    db: SharedClient,
    llm: Arc<dyn LlmClient>,
    classifier: Arc<SqlClassifier>,
}

impl SqlToolkit {
    pub fn new(db: SharedClient, llm: Arc<dyn LlmClient>) -> Self {
        let classifier = Arc::new(SqlClassifier::for_backend(db.backend()));
        Self {
            db,
            llm,
            classifier,
        }
    }

    /// Definitions of every tool, in prompt order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolKind::ALL.iter().map(ToolKind::definition).collect()
    }

    /// SQL dialect name of the underlying database.
    pub fn dialect(&self) -> &'static str {
        self.db.backend().dialect_name()
    }

    /// Runs the named tool and returns its observation.
    pub async fn invoke(&self, tool: &str, input: &str) -> Result<String> {
        let Some(kind) = ToolKind::from_name(tool) else {
            let names = ToolKind::ALL.map(|t| t.name()).join(", ");
            return Ok(format!("{tool} is not a valid tool, try one of [{names}]."));
        };

        let start = Instant::now();
        let observation = match kind {
            ToolKind::ListTables => self.list_tables().await,
            ToolKind::Schema => self.table_info(input).await,
            ToolKind::QueryChecker => self.check_query(input).await?,
            ToolKind::Query => self.run_query(input).await,
        };

        tracing::debug!(
            tool = kind.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool finished"
        );

        Ok(observation)
    }

    async fn list_tables(&self) -> String {
        match self.db.introspect_schema().await {
            Ok(schema) => schema.table_names().join(", "),
            Err(e) => format!("Error: {e}"),
        }
    }

    async fn table_info(&self, input: &str) -> String {
        let schema = match self.db.introspect_schema().await {
            Ok(schema) => schema,
            Err(e) => return format!("Error: {e}"),
        };

        let requested = input
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();

        let missing = requested
            .iter()
            .filter(|name| schema.find_table(name).is_none())
            .map(|name| format!("'{name}'"))
            .collect::<Vec<_>>();

        if requested.is_empty() || !missing.is_empty() {
            return format!(
                "Error: table_names {{{}}} not found in database",
                missing.join(", ")
            );
        }

        let mut blocks = Vec::with_capacity(requested.len());
        for name in requested {
            let Some(table) = schema.find_table(name) else {
                continue;
            };
            let mut block = schema.create_statement(table);

            let quoted = self.db.backend().quote_identifier(&table.name);
            let sample_sql = format!("SELECT * FROM {quoted} LIMIT {SAMPLE_ROWS}");
            if let Ok(sample) = self.db.execute_query(&sample_sql).await {
                block.push_str(&format!(
                    "\n\n/*\n{SAMPLE_ROWS} rows from {} table:\n{}\n*/",
                    table.name,
                    sample.format_as_tsv()
                ));
            }
            blocks.push(block);
        }

        blocks.join("\n\n")
    }

    async fn check_query(&self, input: &str) -> Result<String> {
        if let Err(e) = self.classifier.check_syntax(input) {
            return Ok(format!("Error: {e}"));
        }

        let prompt = query_checker_prompt(input, self.dialect());
        let checked = self.llm.complete(&[Message::user(prompt)]).await?;
        Ok(checked.trim().to_string())
    }

    async fn run_query(&self, sql: &str) -> String {
        let classification = self.classifier.classify(sql);
        if !classification.is_read_only() {
            return format!("Error: {}", classification.rejection_message());
        }

        match self.db.execute_query(sql).await {
            Ok(result) => result.format_as_tuples(),
            Err(e) => format!("Error: {e}"),
        }
    }
}
