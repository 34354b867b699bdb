//! Stepwright Common Library
//!
//! Shared types, the SQLite store, the step sequencer, and the script
//! compilers for the Stepwright platform.

pub mod catalog;
pub mod codegen;
pub mod db;
pub mod error;
pub mod pageobject;
pub mod sequencer;
pub mod types;

// Re-export commonly used types
pub use catalog::{ActionCatalog, ActionKind, ActionSpec, LineTemplate};
pub use codegen::{compile, CompiledScript, SkipReason, SkippedStep};
pub use db::Database;
pub use error::{Error, Result};
pub use sequencer::StepSequencer;
pub use types::*;

/// Stepwright version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".stepwright")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("state.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
