//! Stepwright CLI
//!
//! Command-line interface for browsing test suites, cases, and steps,
//! and for exporting generated Playwright scripts.

pub mod client;
pub mod commands;
pub mod output;
