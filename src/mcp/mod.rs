pub mod error;
pub mod server;
pub mod types;

pub use server::PlotweaveServer;
pub use types::*;
