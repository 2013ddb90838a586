//! Headless end-to-end tests that drive the `dbchat` binary.

mod common;
mod headless_test;
