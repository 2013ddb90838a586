//! Zero-shot ReAct loop over the SQL toolkit.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::llm::{LlmClient, Message};

use super::parser::{parse_output, AgentStep};
use super::prompt::{build_template, render, STOP_SEQUENCE};
use super::toolkit::SqlToolkit;

/// Answer returned when the agent runs out of iterations.
pub const ITERATION_LIMIT_ANSWER: &str = "Agent stopped due to iteration limit or time limit.";

/// A SQL agent bound to one database handle and one model client.
pub struct SqlAgent {
    llm: Arc<dyn LlmClient>,
    toolkit: SqlToolkit,
    config: AgentConfig,
    template: String,
}

impl SqlAgent {
    pub fn new(llm: Arc<dyn LlmClient>, toolkit: SqlToolkit, config: AgentConfig) -> Self {
        let template = build_template(toolkit.dialect(), config.top_k, &toolkit.definitions());
        Self {
            llm,
            toolkit,
            config,
            template,
        }
    }

    /// Runs the agent until it produces a final answer.
    ///
    /// Model failures and unparsable model output are errors. Tool failures
    /// are fed back to the model as observations.
    pub async fn run(&self, question: &str) -> Result<String> {
        let start = Instant::now();
        let stop = [STOP_SEQUENCE.to_string()];
        let mut scratchpad = String::new();

        for iteration in 1..=self.config.max_iterations {
            let prompt = render(&self.template, question, &scratchpad);
            let output = self
                .llm
                .complete_with_stop(&[Message::user(prompt)], &stop)
                .await?;

            match parse_output(&output)? {
                AgentStep::Finish { answer, .. } => {
                    info!(
                        iterations = iteration,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Agent finished"
                    );
                    return Ok(answer);
                }
                AgentStep::Action { tool, input, log } => {
                    debug!(iteration, tool = %tool, "Agent calling tool");
                    let observation = self.toolkit.invoke(&tool, &input).await?;
                    scratchpad.push_str(&format!("{log}\nObservation: {observation}\nThought: "));
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Agent hit the iteration limit"
        );
        Ok(ITERATION_LIMIT_ANSWER.to_string())
    }
}
