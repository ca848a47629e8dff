//! CLI handler for plot generation.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::cli::input::load_context;
use crate::cli::output::{
    output_json, print_header, print_hint, print_kv, print_rows, print_success, OutputMode,
};
use crate::init::AppContext;
use crate::models::{
    GenerationSource, Importance, NarrativeStructure, PlotGenerationRequest, PlotGenerationResult,
};

#[allow(clippy::too_many_arguments)]
pub fn build_request(
    premise: &str,
    genre: &str,
    length: Option<u32>,
    structure: Option<&str>,
    characters: &[String],
    themes: &[String],
    tone: Option<String>,
    plot_points: &[String],
) -> Result<PlotGenerationRequest> {
    let structure = structure
        .map(|s| s.parse::<NarrativeStructure>())
        .transpose()?;

    let request = PlotGenerationRequest {
        premise: premise.to_string(),
        genre: genre.to_string(),
        target_length: length,
        structure,
        characters: characters.to_vec(),
        themes: themes.to_vec(),
        tone,
        plot_points: plot_points.to_vec(),
    };
    request.validate()?;
    Ok(request)
}

pub async fn handle_generate(
    ctx: &AppContext,
    project: &str,
    request: &PlotGenerationRequest,
    context_file: Option<&Path>,
    mode: OutputMode,
) -> Result<()> {
    let context = context_file.map(load_context).transpose()?;
    let result = ctx
        .generate_and_store(project, request, context.as_ref())
        .await
        .map_err(|e| anyhow::anyhow!("Plot generation failed: {}", e))?;

    if mode == OutputMode::Json {
        output_json(&result);
        return Ok(());
    }

    print_result(&result, mode);

    if mode == OutputMode::Human {
        println!();
        print_success(&format!("Saved plot for project '{}'", project));
        if result.source == GenerationSource::Template {
            print_hint(
                "Provider unavailable; this is the template outline. Configure a provider in plotweave.toml.",
            );
        }
    }
    Ok(())
}

pub(crate) fn print_result(result: &PlotGenerationResult, mode: OutputMode) {
    let structure = &result.structure;

    print_header(mode, &format!("Plot for {}", structure.project_id));
    let source = match result.source {
        GenerationSource::Provider => "provider".green().to_string(),
        GenerationSource::Template => "template".yellow().to_string(),
    };
    print_kv("Source", &source);
    print_kv("Confidence", &format!("{:.2}", result.confidence));
    print_kv("Chapters", &structure.total_duration().to_string());

    for act in &structure.acts {
        print_header(
            mode,
            &format!(
                "Act {}: {} ({} chapters)",
                act.act_number, act.name, act.duration
            ),
        );
        if let Some(description) = &act.description {
            println!("{}\n", description);
        }
        let rows: Vec<Vec<String>> = act
            .plot_points
            .iter()
            .map(|p| {
                vec![
                    p.position.map(|v| format!("{}%", v)).unwrap_or_default(),
                    p.point_type.clone(),
                    p.title.clone(),
                    match p.importance {
                        Importance::Major => "major".to_string(),
                        Importance::Minor => "minor".to_string(),
                    },
                ]
            })
            .collect();
        print_rows(mode, &["Position", "Type", "Beat", "Importance"], rows);
    }

    if let Some(climax) = &structure.climax {
        print_kv("Climax", &climax.title);
    }
    if let Some(resolution) = &structure.resolution {
        print_kv("Resolution", &resolution.title);
    }

    if !result.suggestions.is_empty() {
        print_header(mode, "Suggestions");
        let rows: Vec<Vec<String>> = result
            .suggestions
            .iter()
            .map(|s| {
                vec![
                    serde_json::to_value(s.suggestion_type)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default(),
                    s.title.clone(),
                    s.impact.clone().unwrap_or_default(),
                ]
            })
            .collect();
        print_rows(mode, &["Type", "Suggestion", "Impact"], rows);
    }

    if !result.alternatives.is_empty() {
        print_header(mode, "Alternative openings");
        let rows: Vec<Vec<String>> = result
            .alternatives
            .iter()
            .map(|a| {
                vec![
                    a.act_number.to_string(),
                    a.name.clone(),
                    a.plot_points.len().to_string(),
                ]
            })
            .collect();
        print_rows(mode, &["Act", "Name", "Beats"], rows);
    }
}
