//! CLI Commands

pub mod case;
pub mod generate;
pub mod step;
pub mod suite;
