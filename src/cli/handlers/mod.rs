//! CLI command handlers.

pub mod analyze;
pub mod generate;
pub mod show;
