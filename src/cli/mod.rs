//! CLI interface for Plotweave.

pub mod handlers;
pub mod input;
pub mod output;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use output::OutputMode;

/// Plotweave - plot generation and manuscript analysis for fiction writing
#[derive(Parser)]
#[command(name = "plotweave", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.plotweave)
    #[arg(long, env = "PLOTWEAVE_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    /// Output as Markdown
    #[arg(long, global = true)]
    pub md: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start MCP server (stdio transport)
    Mcp,

    /// Generate a plot outline with suggestions and alternative openings
    Generate {
        /// Story premise
        premise: String,
        /// Genre (fantasy, thriller, ...)
        #[arg(long)]
        genre: String,
        /// Project to store the result under
        #[arg(long, default_value = "default")]
        project: String,
        /// Target length in chapters
        #[arg(long)]
        length: Option<u32>,
        /// Narrative structure (three-act, five-act, heros-journey, kishotenketsu, custom)
        #[arg(long)]
        structure: Option<String>,
        /// Character name (repeatable)
        #[arg(long = "character", action = clap::ArgAction::Append)]
        characters: Vec<String>,
        /// Theme (repeatable)
        #[arg(long = "theme", action = clap::ArgAction::Append)]
        themes: Vec<String>,
        /// Tone (dark, whimsical, ...)
        #[arg(long)]
        tone: Option<String>,
        /// Plot point the outline must honor (repeatable)
        #[arg(long = "plot-point", action = clap::ArgAction::Append)]
        plot_points: Vec<String>,
        /// YAML or JSON file with existing project context
        #[arg(long)]
        context: Option<PathBuf>,
    },

    /// Detect plot holes in a manuscript file
    Holes {
        /// YAML or JSON manuscript (project_id, chapters, characters)
        manuscript: PathBuf,
    },

    /// Build the character relationship graph for a manuscript file
    Graph {
        /// YAML or JSON manuscript (project_id, chapters, characters)
        manuscript: PathBuf,
        /// Print a Mermaid diagram instead of tables
        #[arg(long, conflicts_with = "bridges")]
        mermaid: bool,
        /// Rank characters by betweenness centrality
        #[arg(long)]
        bridges: bool,
        /// Only show relationships of this character (id or name)
        #[arg(long)]
        character: Option<String>,
        /// Show only the N strongest relationships
        #[arg(long)]
        top: Option<usize>,
        /// Drop relationships weaker than this from the Mermaid diagram
        #[arg(long, default_value = "1")]
        min_strength: u8,
    },

    /// Run plot-hole detection and graph building in one pass
    Analyze {
        /// YAML or JSON manuscript (project_id, chapters, characters)
        manuscript: PathBuf,
    },

    /// Show what is stored for a project
    Show {
        /// Project id
        project: String,
    },

    /// List stored projects
    Projects,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}

/// Execute a CLI command, dispatching to the appropriate handler.
pub async fn execute(
    command: &Commands,
    ctx: &crate::init::AppContext,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Mcp => unreachable!("MCP handled in main"),

        Commands::Generate {
            premise,
            genre,
            project,
            length,
            structure,
            characters,
            themes,
            tone,
            plot_points,
            context,
        } => {
            let request = handlers::generate::build_request(
                premise,
                genre,
                *length,
                structure.as_deref(),
                characters,
                themes,
                tone.clone(),
                plot_points,
            )?;
            handlers::generate::handle_generate(ctx, project, &request, context.as_deref(), mode)
                .await?
        }

        Commands::Holes { manuscript } => {
            handlers::analyze::handle_holes(ctx, manuscript, mode).await?
        }

        Commands::Graph {
            manuscript,
            mermaid,
            bridges,
            character,
            top,
            min_strength,
        } => {
            let view = if *mermaid {
                handlers::analyze::GraphView::Mermaid {
                    min_strength: *min_strength,
                }
            } else if *bridges {
                handlers::analyze::GraphView::Bridges
            } else {
                handlers::analyze::GraphView::Tables {
                    character: character.clone(),
                    top: *top,
                }
            };
            handlers::analyze::handle_graph(ctx, manuscript, view, mode).await?
        }

        Commands::Analyze { manuscript } => {
            handlers::analyze::handle_analyze(ctx, manuscript, mode).await?
        }

        Commands::Show { project } => handlers::show::handle_show(ctx, project, mode).await?,

        Commands::Projects => handlers::show::handle_projects(ctx, mode).await?,

        // No AppContext needed, but we have it here
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "plotweave",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
