//! SQL agent tests against the sample database.

use std::sync::Arc;
use std::time::Duration;

use dbchat::agent::build_agent;
use dbchat::config::AgentConfig;
use dbchat::connection::{ConnectionConfigurator, ConnectionForm, SharedClient};
use dbchat::db::Value;
use dbchat::llm::MockLlmClient;

use super::sample_db;

async fn student_handle(path: &std::path::Path) -> SharedClient {
    ConnectionConfigurator::with_sqlx(Duration::from_secs(60), path)
        .configure_form(&ConnectionForm::embedded())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_counts_students() {
    let (_dir, path) = sample_db().await;
    let handle = student_handle(&path).await;
    let llm = Arc::new(MockLlmClient::new());

    let agent = build_agent(handle, llm.clone(), AgentConfig::default());
    let answer = agent.run("How many students are there?").await.unwrap();

    assert_eq!(answer, "There are 5 records in the STUDENT table.");
    assert_eq!(llm.call_count(), 4);
}

#[tokio::test]
async fn test_observations_come_from_the_database() {
    let (_dir, path) = sample_db().await;
    let handle = student_handle(&path).await;
    let llm = Arc::new(MockLlmClient::with_script(vec![
        "Let me look at the table.\nAction: sql_db_schema\nAction Input: STUDENT".to_string(),
        "Now the top scorers.\nAction: sql_db_query\nAction Input: SELECT NAME FROM STUDENT WHERE MARKS >= 90 ORDER BY NAME".to_string(),
        "I now know the final answer\nFinal Answer: John and Krish scored at least 90.".to_string(),
    ]));

    let agent = build_agent(handle, llm.clone(), AgentConfig::default());
    let answer = agent.run("Who scored at least 90?").await.unwrap();
    assert_eq!(answer, "John and Krish scored at least 90.");

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("CREATE TABLE"));
    assert!(prompt.contains("3 rows from STUDENT table"));
    assert!(prompt.contains("'John'"));
    assert!(prompt.contains("'Krish'"));
    assert!(!prompt.contains("('Mukesh',)"));
}

#[tokio::test]
async fn test_agent_cannot_modify_data() {
    let (_dir, path) = sample_db().await;
    let handle = student_handle(&path).await;
    let llm = Arc::new(MockLlmClient::with_script(vec![
        "Action: sql_db_query\nAction Input: DELETE FROM STUDENT".to_string(),
        "Final Answer: I am not allowed to delete rows.".to_string(),
    ]));

    let agent = build_agent(handle.clone(), llm.clone(), AgentConfig::default());
    agent.run("Delete every student").await.unwrap();

    let prompt = llm.last_prompt().unwrap();
    assert!(prompt.contains("Observation: Error: Only read-only queries are allowed"));

    let count = handle
        .execute_query("SELECT COUNT(*) FROM STUDENT")
        .await
        .unwrap();
    assert_eq!(count.rows[0][0], Value::Int(5));
}

#[tokio::test]
async fn test_bad_sql_becomes_an_observation() {
    let (_dir, path) = sample_db().await;
    let handle = student_handle(&path).await;
    let llm = Arc::new(MockLlmClient::with_script(vec![
        "Action: sql_db_query\nAction Input: SELECT AGE FROM STUDENT".to_string(),
        "Final Answer: The table has no AGE column.".to_string(),
    ]));

    let agent = build_agent(handle, llm.clone(), AgentConfig::default());
    let answer = agent.run("How old are the students?").await.unwrap();

    assert_eq!(answer, "The table has no AGE column.");
    assert!(llm.last_prompt().unwrap().contains("Observation: Error:"));
}
