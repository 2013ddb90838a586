//! dbchat - chat with a SQLite or MySQL database through an LLM-driven SQL agent.
//!
//! This library exposes the core modules for the binary and integration tests.

pub mod agent;
pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod safety;
pub mod session;
pub mod tui;
