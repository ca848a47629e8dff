//! Mermaid rendering of a character graph.

use crate::models::{CharacterGraph, RelationshipType};

/// Rendering options.
#[derive(Debug, Clone)]
pub struct MermaidOptions {
    /// Mermaid flow direction: LR, TB, RL, BT.
    pub direction: String,
    /// Add each character's role under their name.
    pub include_roles: bool,
    /// Drop relationships weaker than this.
    pub min_strength: u8,
}

impl Default for MermaidOptions {
    fn default() -> Self {
        Self {
            direction: "LR".to_string(),
            include_roles: false,
            min_strength: 1,
        }
    }
}

/// Edge stroke for a relationship type.
fn relationship_color(rel_type: RelationshipType) -> &'static str {
    match rel_type {
        RelationshipType::Family => "stroke:#22c55e,stroke-width:2px", // green
        RelationshipType::Romantic => "stroke:#ef4444,stroke-width:2px", // red
        RelationshipType::Friend => "stroke:#f59e0b,stroke-width:2px", // amber
        RelationshipType::Rival => "stroke:#8b5cf6,stroke-width:2px",  // purple
        RelationshipType::Mentor => "stroke:#14b8a6,stroke-width:2px", // teal
        RelationshipType::Enemy => "stroke:#b91c1c,stroke-width:3px",  // dark red
        RelationshipType::Neutral => "stroke:#6b7280,stroke-width:1px", // gray
    }
}

fn node_id(raw: &str) -> String {
    let id: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("c_{}", id)
}

fn node_label_escape(label: &str) -> String {
    label
        .replace('"', "#quot;")
        .replace('[', "(")
        .replace(']', ")")
}

fn edge_label_escape(label: &str) -> String {
    // Mermaid edge labels need certain chars escaped
    label
        .replace('|', "\\|")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

/// Render the graph as a Mermaid flowchart.
pub fn to_mermaid(graph: &CharacterGraph, options: &MermaidOptions) -> String {
    let mut lines = vec![format!("graph {}", options.direction)];

    for node in &graph.nodes {
        let label = if options.include_roles && !node.role.trim().is_empty() {
            format!("{}\\n({})", node.name, node.role)
        } else {
            node.name.clone()
        };
        lines.push(format!(
            "    {}[\"{}\"]",
            node_id(&node.id),
            node_label_escape(&label)
        ));
    }

    let mut link_styles = Vec::new();
    let edges = graph
        .relationships
        .iter()
        .filter(|r| r.strength >= options.min_strength)
        .filter(|r| graph.node(&r.character_a).is_some() && graph.node(&r.character_b).is_some());

    for (index, rel) in edges.enumerate() {
        let label = format!("{} ({})", rel.rel_type, rel.strength);
        lines.push(format!(
            "    {} --- |{}| {}",
            node_id(&rel.character_a),
            edge_label_escape(&label),
            node_id(&rel.character_b)
        ));
        link_styles.push(format!(
            "    linkStyle {} {}",
            index,
            relationship_color(rel.rel_type)
        ));
    }

    if !link_styles.is_empty() {
        lines.push(String::new());
        lines.push("    %% Relationship type styles".to_string());
        lines.extend(link_styles);
    }

    lines.join("\n")
}

/// Legend for the edge colors, as markdown.
pub fn legend() -> &'static str {
    r#"
## Legend

| Color | Relationship Type |
|-------|-------------------|
| Green | Family |
| Red | Romantic |
| Dark red | Enemy |
| Amber | Friend |
| Purple | Rival |
| Teal | Mentor |
| Gray | Neutral |
"#
}
