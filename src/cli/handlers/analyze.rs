//! CLI handlers for manuscript analysis commands.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::cli::input::load_manuscript;
use crate::cli::output::{
    output_json, output_json_list, print_header, print_hint, print_kv, print_rows,
    severity_label, OutputMode,
};
use crate::init::AppContext;
use crate::models::{CharacterGraph, PlotHoleAnalysis};
use crate::services::graph_export::legend;
use crate::services::{
    bridge_characters, classify_evolution, find_node, relationships_for, strongest_relationships,
    to_mermaid, MermaidOptions,
};

/// How `plotweave graph` presents its result.
#[derive(Debug, Clone)]
pub enum GraphView {
    Tables {
        character: Option<String>,
        top: Option<usize>,
    },
    Mermaid {
        min_strength: u8,
    },
    Bridges,
}

pub async fn handle_holes(ctx: &AppContext, manuscript: &Path, mode: OutputMode) -> Result<()> {
    let manuscript = load_manuscript(manuscript)?;
    let analysis = ctx
        .analysis_service
        .detect_plot_holes(
            &manuscript.project_id,
            &manuscript.chapters,
            &manuscript.characters,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Plot hole detection failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&analysis);
    } else {
        print_holes(&analysis, mode);
    }
    Ok(())
}

pub async fn handle_graph(
    ctx: &AppContext,
    manuscript: &Path,
    view: GraphView,
    mode: OutputMode,
) -> Result<()> {
    let manuscript = load_manuscript(manuscript)?;
    let graph = ctx
        .analysis_service
        .build_character_graph(
            &manuscript.project_id,
            &manuscript.chapters,
            &manuscript.characters,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Character graph failed: {}", e))?;

    match view {
        GraphView::Mermaid { min_strength } => {
            let options = MermaidOptions {
                min_strength,
                ..Default::default()
            };
            let diagram = to_mermaid(&graph, &options);
            if mode == OutputMode::Json {
                output_json(&serde_json::json!({ "mermaid": diagram }));
            } else if mode == OutputMode::Markdown {
                println!("```mermaid\n{}\n```", diagram);
                print!("{}", legend());
            } else {
                println!("{}", diagram);
            }
        }
        GraphView::Bridges => {
            let results = bridge_characters(&graph, graph.nodes.len())
                .map_err(|e| anyhow::anyhow!("Centrality computation failed: {}", e))?;
            if mode == OutputMode::Json {
                output_json_list(&results);
            } else {
                let rows: Vec<Vec<String>> = results
                    .iter()
                    .enumerate()
                    .map(|(i, r)| {
                        vec![
                            format!("{}", i + 1),
                            r.character_name.clone(),
                            format!("{:.4}", r.degree),
                            format!("{:.4}", r.betweenness),
                            r.narrative_role.clone(),
                        ]
                    })
                    .collect();
                print_rows(
                    mode,
                    &["#", "Character", "Degree", "Betweenness", "Role"],
                    rows,
                );
            }
        }
        GraphView::Tables { character, top } => {
            if mode == OutputMode::Json {
                output_json(&graph);
            } else {
                print_graph(&graph, character.as_deref(), top, mode)?;
            }
        }
    }
    Ok(())
}

pub async fn handle_analyze(ctx: &AppContext, manuscript: &Path, mode: OutputMode) -> Result<()> {
    let manuscript = load_manuscript(manuscript)?;
    let analysis = ctx
        .analysis_service
        .analyze_project(
            &manuscript.project_id,
            &manuscript.chapters,
            &manuscript.characters,
        )
        .await
        .map_err(|e| anyhow::anyhow!("Analysis failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&analysis);
    } else {
        print_holes(&analysis.plot_holes, mode);
        print_graph(&analysis.character_graph, None, None, mode)?;
    }
    Ok(())
}

pub(crate) fn print_holes(analysis: &PlotHoleAnalysis, mode: OutputMode) {
    print_header(mode, &format!("Plot holes in {}", analysis.project_id));
    let score = analysis.overall_score.to_string();
    let score = match analysis.overall_score {
        90.. => score.green(),
        60..=89 => score.yellow(),
        _ => score.red(),
    };
    print_kv("Score", &format!("{}/100", score));
    println!("{}\n", analysis.summary);

    let rows: Vec<Vec<String>> = analysis
        .holes_by_severity()
        .into_values()
        .flatten()
        .map(|h| {
            vec![
                severity_label(h.severity),
                h.hole_type.as_str().to_string(),
                h.title.clone(),
                h.affected_chapters.join(", "),
                format!("{:.1}", h.confidence),
            ]
        })
        .collect();
    print_rows(
        mode,
        &["Severity", "Type", "Issue", "Chapters", "Confidence"],
        rows,
    );

    let fixes: Vec<String> = analysis
        .holes
        .iter()
        .filter_map(|h| h.suggested_fix.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    if !fixes.is_empty() {
        print_header(mode, "Suggested fixes");
        for fix in fixes {
            println!("  - {}", fix);
        }
    }
}

pub(crate) fn print_graph(
    graph: &CharacterGraph,
    character: Option<&str>,
    top: Option<usize>,
    mode: OutputMode,
) -> Result<()> {
    print_header(mode, &format!("Characters in {}", graph.project_id));
    let mut nodes: Vec<_> = graph.nodes.iter().collect();
    nodes.sort_by(|a, b| b.importance.cmp(&a.importance).then(a.name.cmp(&b.name)));
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|n| {
            vec![
                n.name.clone(),
                n.role.clone(),
                n.importance.to_string(),
                n.connection_count.to_string(),
            ]
        })
        .collect();
    print_rows(mode, &["Character", "Role", "Importance", "Connections"], rows);

    let relationships = match (character, top) {
        (Some(query), _) => {
            let node = find_node(graph, query)
                .ok_or_else(|| anyhow::anyhow!("No character matching '{}'", query))?;
            relationships_for(graph, &node.id)
        }
        (None, Some(n)) => strongest_relationships(graph, n),
        (None, None) => graph.relationships.iter().collect(),
    };

    print_header(mode, "Relationships");
    let name = |id: &str| {
        graph
            .node(id)
            .map(|n| n.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    let rows: Vec<Vec<String>> = relationships
        .iter()
        .map(|r| {
            vec![
                name(&r.character_a),
                name(&r.character_b),
                r.rel_type.to_string(),
                r.strength.to_string(),
                classify_evolution(r).as_str().to_string(),
            ]
        })
        .collect();
    if rows.is_empty() && mode == OutputMode::Human {
        print_hint("No two characters share a scene.");
        return Ok(());
    }
    print_rows(
        mode,
        &["Character", "Character", "Type", "Strength", "Evolution"],
        rows,
    );
    Ok(())
}
