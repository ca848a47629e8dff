//! CLI handlers for stored project data.

use anyhow::Result;

use crate::cli::output::{
    output_json, output_json_list, print_header, print_hint, print_kv, print_rows, OutputMode,
};
use crate::init::AppContext;

pub async fn handle_show(ctx: &AppContext, project: &str, mode: OutputMode) -> Result<()> {
    let record = ctx
        .repository
        .get_project(project)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load project: {}", e))?
        .ok_or_else(|| anyhow::anyhow!("Project '{}' not found", project))?;

    if mode == OutputMode::Json {
        output_json(&record);
        return Ok(());
    }

    print_header(mode, &format!("Project {}", record.project_id));
    if let Some(updated_at) = record.updated_at {
        print_kv("Updated", &updated_at.format("%Y-%m-%d %H:%M").to_string());
    }

    match &record.plot_structure {
        Some(structure) => {
            print_kv(
                "Plot",
                &format!(
                    "{} acts, {} beats, {} chapters",
                    structure.acts.len(),
                    structure.plot_point_count(),
                    structure.total_duration()
                ),
            );
            let rows: Vec<Vec<String>> = structure
                .acts
                .iter()
                .map(|a| {
                    vec![
                        a.act_number.to_string(),
                        a.name.clone(),
                        a.duration.to_string(),
                        a.plot_points.len().to_string(),
                    ]
                })
                .collect();
            print_rows(mode, &["Act", "Name", "Chapters", "Beats"], rows);
        }
        None => print_hint("No plot generated yet. Run 'plotweave generate'."),
    }

    print_kv("Suggestions", &record.suggestions.len().to_string());
    print_kv("Plot holes", &record.plot_holes.len().to_string());
    match &record.character_graph {
        Some(graph) => print_kv(
            "Character graph",
            &format!(
                "{} characters, {} relationships",
                graph.nodes.len(),
                graph.relationships.len()
            ),
        ),
        None => print_hint("No character graph yet. Run 'plotweave graph <manuscript>'."),
    }

    Ok(())
}

pub async fn handle_projects(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    let projects = ctx
        .repository
        .list_projects()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list projects: {}", e))?;

    if mode == OutputMode::Json {
        output_json_list(&projects);
    } else {
        let rows: Vec<Vec<String>> = projects.into_iter().map(|p| vec![p]).collect();
        print_rows(mode, &["Project"], rows);
    }
    Ok(())
}
