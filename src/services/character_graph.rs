//! Character relationship graph built from co-occurrence in chapter text.

use chrono::Utc;
use rapidfuzz::distance::levenshtein;
use tracing::{debug, info};

use crate::models::{
    Chapter, Character, CharacterGraph, CharacterNode, CharacterRelationship, EvolutionPattern,
    RelationshipSnapshot, RelationshipType,
};
use crate::utils::text::{find_all, slugify, truncate_words, window_around, words, FoldedText};
use crate::PlotweaveError;

/// Chars inspected either side of the closest pair of mentions.
pub const DEFAULT_WINDOW_RADIUS: usize = 200;

const BASE_STRENGTH: i32 = 5;
const KEY_EVENT_CHARS: usize = 160;
const FUZZY_NAME_THRESHOLD: f64 = 0.8;

/// Ordered classification rules; the first rule with a keyword in the window wins.
const TYPE_RULES: &[(RelationshipType, &[&str])] = &[
    (
        RelationshipType::Romantic,
        &["love", "kiss", "romance", "romantic", "embrace", "heart", "beloved", "passion"],
    ),
    (
        RelationshipType::Enemy,
        &["enemy", "enemies", "fight", "fought", "attack", "hate", "kill", "betray", "war", "foe"],
    ),
    (
        RelationshipType::Mentor,
        &["teach", "taught", "mentor", "guide", "train", "lesson", "master", "apprentice"],
    ),
    (
        RelationshipType::Family,
        &[
            "brother", "sister", "mother", "father", "son", "daughter", "family", "cousin",
            "uncle", "aunt",
        ],
    ),
    (
        RelationshipType::Friend,
        &["friend", "together", "laugh", "companion", "ally", "allies"],
    ),
    (
        RelationshipType::Rival,
        &["rival", "rivalry", "compete", "competition", "jealous", "jealousy", "envy", "envious"],
    ),
];

const POSITIVE_KEYWORDS: &[&str] = &["help", "support", "trust", "care", "protect", "love"];
const NEGATIVE_KEYWORDS: &[&str] = &["betray", "hurt", "abandon", "hate", "kill", "destroy"];

/// Inflections accepted after a keyword stem.
const SUFFIXES: &[&str] = &["", "s", "es", "d", "ed", "ing", "er", "ers", "ly", "ful", "ship"];

fn matches_keyword(word: &str, keyword: &str) -> bool {
    if let Some(rest) = word.strip_prefix(keyword) {
        if SUFFIXES.contains(&rest) {
            return true;
        }
    }
    // love -> loving, compete -> competing
    if let Some(stem) = keyword.strip_suffix('e') {
        if let Some(rest) = word.strip_prefix(stem) {
            return rest == "ing";
        }
    }
    false
}

fn window_has(window_words: &[String], keyword: &str) -> bool {
    window_words.iter().any(|w| matches_keyword(w, keyword))
}

/// Relationship type for a text window (lowercased words).
pub fn classify_type(window_words: &[String]) -> RelationshipType {
    TYPE_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| window_has(window_words, k)))
        .map(|(rel_type, _)| *rel_type)
        .unwrap_or(RelationshipType::Neutral)
}

/// Strength for a text window: 5, +1 per positive and -1 per negative keyword present, in 1..=10.
pub fn score_strength(window_words: &[String]) -> u8 {
    let positive = POSITIVE_KEYWORDS
        .iter()
        .filter(|k| window_has(window_words, k))
        .count() as i32;
    let negative = NEGATIVE_KEYWORDS
        .iter()
        .filter(|k| window_has(window_words, k))
        .count() as i32;
    (BASE_STRENGTH + positive - negative).clamp(1, 10) as u8
}

fn role_bonus(role: &str) -> usize {
    match role.trim().to_lowercase().as_str() {
        "protagonist" => 5,
        "antagonist" => 4,
        "supporting" => 2,
        _ => 0,
    }
}

/// Byte offsets of the closest pair of mentions, if both names occur.
fn closest_mentions(a_hits: &[usize], b_hits: &[usize]) -> Option<(usize, usize)> {
    a_hits
        .iter()
        .flat_map(|a| b_hits.iter().map(move |b| (*a, *b)))
        .min_by_key(|(a, b)| a.abs_diff(*b))
}

/// Builds a [`CharacterGraph`] from chapters and characters.
#[derive(Debug, Clone)]
pub struct CharacterGraphBuilder {
    window_radius: usize,
}

impl Default for CharacterGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacterGraphBuilder {
    pub fn new() -> Self {
        Self {
            window_radius: DEFAULT_WINDOW_RADIUS,
        }
    }

    pub fn with_window_radius(mut self, radius: usize) -> Self {
        self.window_radius = radius;
        self
    }

    /// Build the graph for `project_id`. Rebuilding replaces any earlier graph wholesale.
    pub fn build_character_graph(
        &self,
        project_id: &str,
        chapters: &[Chapter],
        characters: &[Character],
    ) -> Result<CharacterGraph, PlotweaveError> {
        super::validate_manuscript(project_id, chapters, characters)?;

        let folded: Vec<FoldedText> = chapters
            .iter()
            .map(|c| FoldedText::new(&c.content))
            .collect();

        let mut relationships = Vec::new();
        for (i, a) in characters.iter().enumerate() {
            for b in &characters[i + 1..] {
                if let Some(rel) = self.relate(project_id, a, b, chapters, &folded) {
                    relationships.push(rel);
                }
            }
        }

        let nodes: Vec<CharacterNode> = characters
            .iter()
            .map(|c| {
                let connection_count = relationships.iter().filter(|r| r.involves(&c.id)).count();
                CharacterNode {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    role: c.role.clone(),
                    importance: (connection_count + role_bonus(&c.role)).min(10) as u8,
                    connection_count,
                }
            })
            .collect();

        info!(
            "Built character graph for {}: {} nodes, {} relationships",
            project_id,
            nodes.len(),
            relationships.len()
        );

        Ok(CharacterGraph {
            project_id: project_id.to_string(),
            nodes,
            relationships,
            analyzed_at: Utc::now(),
        })
    }

    fn relate(
        &self,
        project_id: &str,
        a: &Character,
        b: &Character,
        chapters: &[Chapter],
        folded: &[FoldedText],
    ) -> Option<CharacterRelationship> {
        let a_name = a.name.trim().to_lowercase();
        let b_name = b.name.trim().to_lowercase();
        let mut evolution: Vec<RelationshipSnapshot> = Vec::new();

        for (index, (chapter, text)) in chapters.iter().zip(folded).enumerate() {
            let a_hits = find_all(text.as_str(), &a_name);
            let b_hits = find_all(text.as_str(), &b_name);
            let Some((pa, pb)) = closest_mentions(&a_hits, &b_hits) else {
                continue;
            };

            let center = (pa + pb) / 2;
            let window_words: Vec<String> =
                words(window_around(text.as_str(), center, self.window_radius)).collect();
            let rel_type = classify_type(&window_words);
            let strength = score_strength(&window_words);

            if evolution.last().map(|s| s.rel_type) == Some(rel_type) {
                continue;
            }
            let excerpt = window_around(
                text.original(),
                text.original_offset(center),
                self.window_radius,
            );
            evolution.push(RelationshipSnapshot {
                chapter_id: chapter.id.clone(),
                chapter_index: index,
                rel_type,
                strength,
                key_event: Some(truncate_words(excerpt, KEY_EVENT_CHARS)),
            });
        }

        let (rel_type, strength) = evolution.last().map(|s| (s.rel_type, s.strength))?;
        debug!(
            "{} / {}: {} ({} transitions)",
            a.name,
            b.name,
            rel_type,
            evolution.len()
        );

        Some(CharacterRelationship {
            id: format!("rel-{}-{}", slugify(&a.id), slugify(&b.id)),
            project_id: project_id.to_string(),
            character_a: a.id.clone(),
            character_b: b.id.clone(),
            rel_type,
            strength,
            is_reciprocal: true,
            evolution,
        })
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Relationships touching a character.
pub fn relationships_for<'a>(
    graph: &'a CharacterGraph,
    character_id: &str,
) -> Vec<&'a CharacterRelationship> {
    graph
        .relationships
        .iter()
        .filter(|r| r.involves(character_id))
        .collect()
}

/// Top `n` relationships by strength; ties keep graph order.
pub fn strongest_relationships(graph: &CharacterGraph, n: usize) -> Vec<&CharacterRelationship> {
    let mut sorted: Vec<&CharacterRelationship> = graph.relationships.iter().collect();
    sorted.sort_by(|a, b| b.strength.cmp(&a.strength));
    sorted.truncate(n);
    sorted
}

/// Look a node up by id, exact name, or close-enough name.
pub fn find_node<'a>(graph: &'a CharacterGraph, query: &str) -> Option<&'a CharacterNode> {
    let query = query.trim();
    if let Some(node) = graph.node(query) {
        return Some(node);
    }
    if let Some(node) = graph
        .nodes
        .iter()
        .find(|n| n.name.eq_ignore_ascii_case(query))
    {
        return Some(node);
    }

    let query_lower = query.to_lowercase();
    graph
        .nodes
        .iter()
        .map(|n| {
            let similarity = levenshtein::normalized_similarity(
                query_lower.chars(),
                n.name.to_lowercase().chars(),
            );
            (n, similarity)
        })
        .filter(|(_, similarity)| *similarity >= FUZZY_NAME_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(n, _)| n)
}

/// Shape of a relationship's strength over its recorded transitions.
pub fn classify_evolution(relationship: &CharacterRelationship) -> EvolutionPattern {
    let strengths: Vec<i32> = relationship
        .evolution
        .iter()
        .map(|s| s.strength as i32)
        .collect();

    let (Some(first), Some(last)) = (strengths.first(), strengths.last()) else {
        return EvolutionPattern::Stable;
    };
    if strengths.len() < 2 {
        return EvolutionPattern::Stable;
    }

    let net = last - first;
    if net > 2 {
        return EvolutionPattern::Improving;
    }
    if net < -2 {
        return EvolutionPattern::Deteriorating;
    }

    let swings = strengths
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() >= 2)
        .count();
    if swings >= 2 {
        EvolutionPattern::Complex
    } else {
        EvolutionPattern::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(text: &str) -> Vec<String> {
        words(text).collect()
    }

    #[test]
    fn test_rule_order_romantic_before_enemy() {
        assert_eq!(
            classify_type(&w("she loved him even as they fought")),
            RelationshipType::Romantic
        );
        assert_eq!(
            classify_type(&w("he betrayed his brother")),
            RelationshipType::Enemy
        );
        assert_eq!(
            classify_type(&w("they walked on in silence")),
            RelationshipType::Neutral
        );
    }

    #[test]
    fn test_keyword_inflections() {
        assert!(matches_keyword("taught", "taught"));
        assert!(matches_keyword("trained", "train"));
        assert!(matches_keyword("loving", "love"));
        assert!(matches_keyword("friendship", "friend"));
        assert!(!matches_keyword("warm", "war"));
        assert!(!matches_keyword("song", "son"));
    }

    #[test]
    fn test_strength_clamps() {
        assert_eq!(score_strength(&w("")), 5);
        assert_eq!(
            score_strength(&w("help support trust care protect love")),
            10
        );
        assert_eq!(
            score_strength(&w("betray hurt abandon hate kill destroy")),
            1
        );
        assert_eq!(score_strength(&w("she helped him but he hurt her")), 5);
    }

    #[test]
    fn test_closest_mentions() {
        assert_eq!(closest_mentions(&[0, 100], &[90, 400]), Some((100, 90)));
        assert_eq!(closest_mentions(&[], &[1]), None);
    }

    fn rel_with_strengths(strengths: &[u8]) -> CharacterRelationship {
        CharacterRelationship {
            id: "r".into(),
            project_id: "p".into(),
            character_a: "a".into(),
            character_b: "b".into(),
            rel_type: RelationshipType::Neutral,
            strength: strengths.last().copied().unwrap_or(5),
            is_reciprocal: true,
            evolution: strengths
                .iter()
                .enumerate()
                .map(|(i, s)| RelationshipSnapshot {
                    chapter_id: format!("c{}", i),
                    chapter_index: i,
                    rel_type: RelationshipType::Neutral,
                    strength: *s,
                    key_event: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_classify_evolution() {
        assert_eq!(classify_evolution(&rel_with_strengths(&[5])), EvolutionPattern::Stable);
        assert_eq!(
            classify_evolution(&rel_with_strengths(&[3, 8])),
            EvolutionPattern::Improving
        );
        assert_eq!(
            classify_evolution(&rel_with_strengths(&[9, 2])),
            EvolutionPattern::Deteriorating
        );
        assert_eq!(
            classify_evolution(&rel_with_strengths(&[5, 8, 5, 6])),
            EvolutionPattern::Complex
        );
        assert_eq!(
            classify_evolution(&rel_with_strengths(&[5, 6, 5])),
            EvolutionPattern::Stable
        );
    }

    #[test]
    fn test_role_bonus() {
        assert_eq!(role_bonus("Protagonist"), 5);
        assert_eq!(role_bonus("antagonist"), 4);
        assert_eq!(role_bonus("supporting"), 2);
        assert_eq!(role_bonus("cameo"), 0);
    }
}
