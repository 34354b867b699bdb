//! Stepwright Web API
//!
//! Serves the step store over HTTP: pages and selectors, test suites and
//! cases, ordered test steps, and script generation.

pub mod actions;
pub mod error;
pub mod generate;
pub mod pages;
pub mod server;
pub mod steps;
pub mod suites;

pub use error::{ApiError, ApiResult};
pub use server::{ApiServer, AppState, ServerConfig};
