//! Centrality over the character relationship graph.
//!
//! Identifies hubs and "bridge" characters: the ones whose removal would
//! split the cast into groups that never share a scene.

use std::collections::HashMap;

use graphrs::{algorithms::centrality, Edge, Graph, GraphSpecs, Node};
use serde::Serialize;

use crate::models::CharacterGraph;
use crate::PlotweaveError;

/// Centrality scores for one character.
#[derive(Debug, Clone, Serialize)]
pub struct CentralityResult {
    pub character_id: String,
    pub character_name: String,
    pub degree: f64,
    pub betweenness: f64,
    pub narrative_role: String,
}

/// Narrative label for a pair of normalized centrality scores.
pub(crate) fn assign_narrative_role(degree: f64, betweenness: f64) -> String {
    if degree == 0.0 {
        "isolated".to_string()
    } else if degree > 0.5 {
        "hub".to_string()
    } else if betweenness > 0.3 {
        "bridge".to_string()
    } else if degree < 0.2 && betweenness < 0.1 {
        "peripheral".to_string()
    } else {
        "connected".to_string()
    }
}

/// Relationships are undirected; each becomes a pair of directed edges.
fn build_graph(graph: &CharacterGraph) -> Result<Graph<String, ()>, PlotweaveError> {
    let mut g = Graph::<String, ()>::new(GraphSpecs::directed());

    for node in &graph.nodes {
        g.add_node(Node::from_name(node.id.clone()));
    }

    for rel in &graph.relationships {
        if graph.node(&rel.character_a).is_none() || graph.node(&rel.character_b).is_none() {
            continue;
        }
        for (u, v) in [
            (&rel.character_a, &rel.character_b),
            (&rel.character_b, &rel.character_a),
        ] {
            g.add_edge(Edge::new(u.clone(), v.clone()))
                .map_err(|e| PlotweaveError::Graph(format!("Failed to add edge: {:?}", e)))?;
        }
    }

    Ok(g)
}

/// Characters ranked by betweenness centrality, highest first.
pub fn bridge_characters(
    graph: &CharacterGraph,
    limit: usize,
) -> Result<Vec<CentralityResult>, PlotweaveError> {
    let n = graph.nodes.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let betweenness: HashMap<String, f64> = if n > 1 {
        let g = build_graph(graph)?;
        centrality::betweenness::betweenness_centrality(&g, false, true)
            .map_err(|e| PlotweaveError::Graph(format!("Betweenness centrality error: {:?}", e)))?
    } else {
        HashMap::new()
    };

    let mut results: Vec<CentralityResult> = graph
        .nodes
        .iter()
        .map(|node| {
            let degree = if n > 1 {
                node.connection_count as f64 / (n - 1) as f64
            } else {
                0.0
            };
            let betweenness = betweenness.get(&node.id).copied().unwrap_or(0.0);
            CentralityResult {
                character_id: node.id.clone(),
                character_name: node.name.clone(),
                degree,
                betweenness,
                narrative_role: assign_narrative_role(degree, betweenness),
            }
        })
        .collect();

    results.sort_by(|a, b| {
        b.betweenness
            .partial_cmp(&a.betweenness)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.degree
                    .partial_cmp(&a.degree)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
    results.truncate(limit);

    Ok(results)
}
