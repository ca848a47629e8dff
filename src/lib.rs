pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod init;
pub mod mcp;
pub mod models;
pub mod repository;
pub mod services;
pub mod utils;

pub use error::PlotweaveError;
