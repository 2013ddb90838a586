//! Prompt templates for the SQL agent.

use super::toolkit::ToolDefinition;

/// Stop sequence that ends every model turn before it invents an observation.
pub const STOP_SEQUENCE: &str = "\nObservation:";

const PREFIX_TEMPLATE: &str = r#"You are an agent designed to interact with a SQL database.
Given an input question, create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer.
Unless the user specifies a specific number of examples they wish to obtain, always limit your query to at most {top_k} results.
You can order the results by a relevant column to return the most interesting examples in the database.
Never query for all the columns from a specific table, only ask for the relevant columns given the question.
You have access to tools for interacting with the database.
Only use the below tools. Only use the information returned by the below tools to construct your final answer.
You MUST double check your query before executing it. If you get an error while executing a query, rewrite the query and try again.

DO NOT make any DML statements (INSERT, UPDATE, DELETE, DROP etc.) to the database.

If the question does not seem related to the database, just return "I don't know" as the answer."#;

const FORMAT_INSTRUCTIONS: &str = r#"Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question"#;

const SUFFIX: &str = r#"Begin!

Question: {input}
Thought: I should look at the tables in the database to see what I can query.  Then I should query the schema of the most relevant tables.
{agent_scratchpad}"#;

const QUERY_CHECKER_TEMPLATE: &str = r#"{query}
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only.

SQL Query: "#;

/// Builds the static part of the agent prompt: prefix, tools and format.
pub fn build_template(dialect: &str, top_k: usize, tools: &[ToolDefinition]) -> String {
    let prefix = PREFIX_TEMPLATE
        .replace("{dialect}", dialect)
        .replace("{top_k}", &top_k.to_string());

    let tool_lines = tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n");

    let tool_names = tools
        .iter()
        .map(|t| t.name)
        .collect::<Vec<_>>()
        .join(", ");

    let format = FORMAT_INSTRUCTIONS.replace("{tool_names}", &tool_names);

    format!("{prefix}\n\n{tool_lines}\n\n{format}\n\n{SUFFIX}")
}

/// Fills the question and scratchpad into a template from `build_template`.
pub fn render(template: &str, input: &str, scratchpad: &str) -> String {
    let (head, tail) = template
        .split_once("{agent_scratchpad}")
        .unwrap_or((template, ""));
    format!("{}{scratchpad}{tail}", head.replacen("{input}", input, 1))
}

/// Builds the query checker prompt for one query.
pub fn query_checker_prompt(query: &str, dialect: &str) -> String {
    QUERY_CHECKER_TEMPLATE
        .replace("{dialect}", dialect)
        .replace("{query}", query)
}
