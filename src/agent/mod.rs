//! SQL agent for dbchat.
//!
//! Wraps a database handle and a model client into a toolkit, and the
//! toolkit into a ReAct agent that answers one question at a time.

pub mod executor;
pub mod parser;
pub mod prompt;
pub mod toolkit;

use std::sync::Arc;

pub use executor::{SqlAgent, ITERATION_LIMIT_ANSWER};
pub use parser::{parse_output, AgentStep};
pub use toolkit::{SqlToolkit, ToolDefinition, ToolKind};

use crate::config::AgentConfig;
use crate::connection::SharedClient;
use crate::llm::LlmClient;

/// Builds an agent over the given handle.
///
/// Agents are cheap and are rebuilt for every interaction cycle so they
/// always use the handle from the latest configuration.
pub fn build_agent(handle: SharedClient, llm: Arc<dyn LlmClient>, config: AgentConfig) -> SqlAgent {
    let toolkit = SqlToolkit::new(handle, llm.clone());
    SqlAgent::new(llm, toolkit, config)
}
