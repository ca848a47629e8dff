use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

/// Category of a detected plot hole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotHoleType {
    Continuity,
    Logic,
    CharacterInconsistency,
    Timeline,
    UnresolvedThread,
    ContradictoryFacts,
    MissingMotivation,
}

impl PlotHoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlotHoleType::Continuity => "continuity",
            PlotHoleType::Logic => "logic",
            PlotHoleType::CharacterInconsistency => "character_inconsistency",
            PlotHoleType::Timeline => "timeline",
            PlotHoleType::UnresolvedThread => "unresolved_thread",
            PlotHoleType::ContradictoryFacts => "contradictory_facts",
            PlotHoleType::MissingMotivation => "missing_motivation",
        }
    }
}

/// Severity of a plot hole.
///
/// Ordered from least to most severe so that `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Critical,
}

impl Severity {
    /// Score penalty before confidence weighting.
    pub fn penalty_weight(&self) -> f32 {
        match self {
            Severity::Critical => 15.0,
            Severity::Major => 10.0,
            Severity::Moderate => 5.0,
            Severity::Minor => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::Major,
        Severity::Moderate,
        Severity::Minor,
    ];
}

/// A detected structural defect. Immutable once created.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotHole {
    pub id: String,
    pub hole_type: PlotHoleType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub affected_chapters: Vec<String>,
    pub affected_characters: Vec<String>,
    pub suggested_fix: Option<String>,
    /// Detection confidence (0.0-1.0).
    pub confidence: f32,
    pub detected_at: DateTime<Utc>,
}

impl PlotHole {
    /// Penalty this hole contributes to the overall score.
    pub fn penalty(&self) -> f32 {
        self.severity.penalty_weight() * self.confidence.clamp(0.0, 1.0)
    }
}

/// Scored report from a plot-hole detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotHoleAnalysis {
    pub project_id: String,
    pub analyzed_at: DateTime<Utc>,
    pub holes: Vec<PlotHole>,
    /// 0-100, higher is better.
    pub overall_score: u8,
    pub summary: String,
}

impl PlotHoleAnalysis {
    /// Holes grouped by severity, most severe first.
    pub fn holes_by_severity(&self) -> BTreeMap<std::cmp::Reverse<Severity>, Vec<&PlotHole>> {
        let mut grouped: BTreeMap<std::cmp::Reverse<Severity>, Vec<&PlotHole>> = BTreeMap::new();
        for hole in &self.holes {
            grouped
                .entry(std::cmp::Reverse(hole.severity))
                .or_default()
                .push(hole);
        }
        grouped
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.holes.iter().filter(|h| h.severity == severity).count()
    }

    pub fn holes_of_type(&self, hole_type: PlotHoleType) -> impl Iterator<Item = &PlotHole> {
        self.holes.iter().filter(move |h| h.hole_type == hole_type)
    }
}
