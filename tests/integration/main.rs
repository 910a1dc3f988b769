//! Integration tests for Contact-Scout
//!
//! These tests use wiremock to create mock HTTP servers and temporary
//! SQLite files to exercise full runs end-to-end.

mod common;
mod fetch_tests;
mod proxy_tests;
mod run_tests;
