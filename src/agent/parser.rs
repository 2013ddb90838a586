//! Parses model output into agent steps.
//!
//! The model answers in the ReAct text format: either an `Action:` /
//! `Action Input:` pair or a `Final Answer:`. Anything else, or both at once,
//! is a parse error.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ChatError, Result};

const FINAL_ANSWER: &str = "Final Answer:";

/// One decision of the agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// Call a tool.
    Action {
        tool: String,
        input: String,
        /// Raw model output for the scratchpad.
        log: String,
    },
    /// Stop and answer.
    Finish { answer: String, log: String },
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("action regex is valid")
    })
}

/// Parses one model completion.
pub fn parse_output(text: &str) -> Result<AgentStep> {
    let has_final = text.contains(FINAL_ANSWER);
    let action = action_regex().captures(text);

    match (action, has_final) {
        (Some(_), true) => Err(ChatError::agent(format!(
            "Parsing LLM output produced both a final answer and a parse-able action: {text}"
        ))),
        (Some(caps), false) => {
            let tool = caps.get(1).map_or("", |m| m.as_str()).trim();
            let input = caps.get(2).map_or("", |m| m.as_str());
            Ok(AgentStep::Action {
                tool: tool.trim_matches('`').to_string(),
                input: clean_input(input),
                log: text.to_string(),
            })
        }
        (None, true) => {
            let answer = text
                .rsplit(FINAL_ANSWER)
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            Ok(AgentStep::Finish {
                answer,
                log: text.to_string(),
            })
        }
        (None, false) => Err(ChatError::agent(format!(
            "Could not parse LLM output: `{}`",
            text.trim()
        ))),
    }
}

/// Strips surrounding whitespace, quotes and a markdown SQL fence from a tool input.
fn clean_input(input: &str) -> String {
    let trimmed = input.trim();
    let unfenced = trimmed
        .strip_prefix("```sql")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    unfenced.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_action() {
        let text = "I should list the tables.\nAction: sql_db_list_tables\nAction Input: ";
        assert_eq!(
            parse_output(text).unwrap(),
            AgentStep::Action {
                tool: "sql_db_list_tables".to_string(),
                input: String::new(),
                log: text.to_string(),
            }
        );
    }

    #[test]
    fn test_parse_action_with_multiline_sql() {
        let text = "Action: sql_db_query\nAction Input: SELECT NAME\nFROM STUDENT\nWHERE MARKS > 80";
        match parse_output(text).unwrap() {
            AgentStep::Action { tool, input, .. } => {
                assert_eq!(tool, "sql_db_query");
                assert_eq!(input, "SELECT NAME\nFROM STUDENT\nWHERE MARKS > 80");
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_action_strips_quotes_and_fences() {
        let text = "Action: sql_db_query\nAction Input: \"SELECT 1\"";
        assert!(matches!(
            parse_output(text).unwrap(),
            AgentStep::Action { input, .. } if input == "SELECT 1"
        ));

        let fenced = "Action: sql_db_query\nAction Input: ```sql\nSELECT 2\n```";
        assert!(matches!(
            parse_output(fenced).unwrap(),
            AgentStep::Action { input, .. } if input == "SELECT 2"
        ));
    }

    #[test]
    fn test_parse_final_answer() {
        let text = "I now know the final answer\nFinal Answer: There are 5 students.";
        assert_eq!(
            parse_output(text).unwrap(),
            AgentStep::Finish {
                answer: "There are 5 students.".to_string(),
                log: text.to_string(),
            }
        );
    }

    #[test]
    fn test_both_action_and_answer_is_error() {
        let text = "Action: sql_db_query\nAction Input: SELECT 1\nFinal Answer: 1";
        let err = parse_output(text).unwrap_err();
        assert!(matches!(err, ChatError::Agent(_)));
        assert!(err.to_string().contains("both a final answer"));
    }

    #[test]
    fn test_unstructured_output_is_error() {
        let err = parse_output("The answer is probably five.").unwrap_err();
        assert!(matches!(err, ChatError::Agent(_)));
        assert!(err.to_string().contains("Could not parse LLM output"));
    }
}
