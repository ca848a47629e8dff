//! Plotweave - plot generation and manuscript analysis for fiction writing
//!
//! Usage:
//!   plotweave mcp                              Start MCP server on stdio
//!   plotweave generate "premise" --genre X     Generate a plot outline
//!   plotweave holes book.yaml                  Detect plot holes
//!   plotweave graph book.yaml --mermaid        Character relationship graph
//!   plotweave --help                           Show all commands

use anyhow::Result;
use clap::Parser;

use plotweave::cli::output::OutputMode;
use plotweave::cli::{Cli, Commands};
use plotweave::init::AppContext;
use plotweave::mcp::server::run_mcp_server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr (safe for MCP stdio transport)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("plotweave=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_flags(cli.json, cli.md);

    match &cli.command {
        Commands::Mcp => {
            let ctx = AppContext::new(cli.data_path.clone()).await?;
            run_mcp_server(ctx).await?;
        }
        cmd => {
            let ctx = AppContext::new(cli.data_path.clone()).await?;
            plotweave::cli::execute(cmd, &ctx, mode).await?;
        }
    }

    Ok(())
}
