//! Heuristic plot-hole detection over manuscript text.
//!
//! Each analyzer scans the chapters for one kind of defect. Findings are
//! signals with a confidence, not verdicts: the checks are keyword and
//! pattern based and will both miss and over-report.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::models::{Chapter, Character, PlotHole, PlotHoleAnalysis, PlotHoleType, Severity};
use crate::utils::text::{head_chars, slugify, tail_chars};
use crate::PlotweaveError;

/// Characters inspected at each side of a chapter boundary.
const BOUNDARY_CHARS: usize = 500;

/// Chapters a character may be missing for before the absence is flagged.
const MAX_ABSENCE_GAP: usize = 5;

/// Trailing chapters exempt from the unresolved-thread check.
const PAYOFF_WINDOW: usize = 3;

const TIME_OF_DAY_MARKERS: &[&str] = &["morning", "dawn", "sunrise"];
const BRAVERY_TRAITS: &[&str] = &["brave", "confident"];
const COWARDICE_ACTIONS: &[&str] = &["fled", "ran away", "cowered"];

static DURATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|several|few)\s+(hour|day|week|month|year)s?\b",
    )
    .expect("duration marker pattern is valid")
});

static COMMITMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(would return|promised to|vowed to|planned to|intended to|must|had to)\b")
        .expect("commitment pattern is valid")
});

static PAYOFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(returned|fulfilled|completed)\b").expect("payoff pattern is valid")
});

static LOCKED_BARRIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(door|gate|entrance) (was|is) locked\b").expect("locked pattern is valid")
});

// ============================================================================
// Analyzer Trait
// ============================================================================

/// One independent plot-hole check.
///
/// Analyzers cannot fail: malformed or sparse input simply yields no findings.
pub trait PlotHoleAnalyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(
        &self,
        chapters: &[Chapter],
        characters: &[Character],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole>;
}

/// Suggested fix for a hole type.
pub fn generate_suggested_fix(hole_type: PlotHoleType) -> Option<String> {
    let fix = match hole_type {
        PlotHoleType::Timeline => {
            "State how much time passes between the chapters, or change the time of day"
        }
        PlotHoleType::CharacterInconsistency => {
            "Show what changed in the character, or account for their absence on the page"
        }
        PlotHoleType::UnresolvedThread => {
            "Pay off the commitment in a later chapter, or show it being abandoned"
        }
        PlotHoleType::Logic => "Show how the barrier was unlocked before it is opened",
        PlotHoleType::Continuity => "Reconcile the conflicting details across chapters",
        PlotHoleType::ContradictoryFacts => {
            "Decide which fact is true and revise the other mention"
        }
        PlotHoleType::MissingMotivation => {
            "Give the character a reason on the page before they act"
        }
    };
    Some(fix.to_string())
}

#[allow(clippy::too_many_arguments)]
fn make_hole(
    id: String,
    hole_type: PlotHoleType,
    severity: Severity,
    title: String,
    description: String,
    affected_chapters: Vec<String>,
    affected_characters: Vec<String>,
    confidence: f32,
    detected_at: DateTime<Utc>,
) -> PlotHole {
    PlotHole {
        id,
        hole_type,
        severity,
        title,
        description,
        affected_chapters,
        affected_characters,
        suggested_fix: generate_suggested_fix(hole_type),
        confidence,
        detected_at,
    }
}

// ============================================================================
// Analyzers
// ============================================================================

/// Consecutive chapters that both sit at the same time of day with no stated time skip.
pub struct TimelineAnalyzer;

impl PlotHoleAnalyzer for TimelineAnalyzer {
    fn name(&self) -> &'static str {
        "timeline"
    }

    fn analyze(
        &self,
        chapters: &[Chapter],
        _characters: &[Character],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        let mentions_morning = |text: &str| {
            let lower = text.to_lowercase();
            TIME_OF_DAY_MARKERS.iter().any(|m| lower.contains(m))
        };

        chapters
            .windows(2)
            .filter_map(|pair| {
                let (prev, cur) = (&pair[0], &pair[1]);
                let prev_end = tail_chars(&prev.content, BOUNDARY_CHARS);
                let cur_start = head_chars(&cur.content, BOUNDARY_CHARS);

                if !(mentions_morning(prev_end) && mentions_morning(cur_start)) {
                    return None;
                }
                if DURATION_MARKER.is_match(&prev.content) || DURATION_MARKER.is_match(&cur.content)
                {
                    return None;
                }

                Some(make_hole(
                    format!("timeline-{}-{}", slugify(&prev.id), slugify(&cur.id)),
                    PlotHoleType::Timeline,
                    Severity::Minor,
                    "Unclear time progression".to_string(),
                    format!(
                        "\"{}\" ends in the morning and \"{}\" opens in the morning with no \
                         indication of how much time has passed.",
                        prev.display_name(),
                        cur.display_name()
                    ),
                    vec![prev.id.clone(), cur.id.clone()],
                    Vec::new(),
                    0.6,
                    detected_at,
                ))
            })
            .collect()
    }
}

/// Long unexplained absences and actions that contradict declared traits.
pub struct CharacterConsistencyAnalyzer;

impl CharacterConsistencyAnalyzer {
    fn absences(
        character: &Character,
        chapters: &[Chapter],
        lowered: &[String],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        let name = character.name.trim().to_lowercase();
        let appearances: Vec<usize> = lowered
            .iter()
            .enumerate()
            .filter(|(_, text)| text.contains(&name))
            .map(|(i, _)| i)
            .collect();

        appearances
            .windows(2)
            .filter(|w| w[1] - w[0] > MAX_ABSENCE_GAP)
            .map(|w| {
                let (from, to) = (w[0], w[1]);
                make_hole(
                    format!("absence-{}-{}-{}", slugify(&character.name), from + 1, to + 1),
                    PlotHoleType::CharacterInconsistency,
                    Severity::Moderate,
                    format!("{} disappears without explanation", character.name),
                    format!(
                        "{} is absent for {} chapters between \"{}\" and \"{}\".",
                        character.name,
                        to - from - 1,
                        chapters[from].display_name(),
                        chapters[to].display_name()
                    ),
                    vec![chapters[from].id.clone(), chapters[to].id.clone()],
                    vec![character.id.clone()],
                    0.6,
                    detected_at,
                )
            })
            .collect()
    }

    fn trait_contradictions(
        character: &Character,
        chapters: &[Chapter],
        lowered: &[String],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        let name = character.name.trim().to_lowercase();
        let phrases: Vec<String> = COWARDICE_ACTIONS
            .iter()
            .map(|action| format!("{} {}", name, action))
            .collect();

        let contradicting: Vec<String> = lowered
            .iter()
            .zip(chapters)
            .filter(|(text, _)| phrases.iter().any(|p| text.contains(p.as_str())))
            .map(|(_, chapter)| chapter.id.clone())
            .collect();

        if contradicting.len() <= 2 {
            return Vec::new();
        }

        BRAVERY_TRAITS
            .iter()
            .filter(|t| character.has_trait(t))
            .map(|trait_name| {
                make_hole(
                    format!(
                        "trait-contradiction-{}-{}",
                        slugify(&character.name),
                        trait_name
                    ),
                    PlotHoleType::CharacterInconsistency,
                    Severity::Moderate,
                    format!("{} acts against being {}", character.name, trait_name),
                    format!(
                        "{} is described as {} but flees or cowers in {} chapters.",
                        character.name,
                        trait_name,
                        contradicting.len()
                    ),
                    contradicting.clone(),
                    vec![character.id.clone()],
                    0.7,
                    detected_at,
                )
            })
            .collect()
    }
}

impl PlotHoleAnalyzer for CharacterConsistencyAnalyzer {
    fn name(&self) -> &'static str {
        "character_consistency"
    }

    fn analyze(
        &self,
        chapters: &[Chapter],
        characters: &[Character],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        let lowered: Vec<String> = chapters.iter().map(|c| c.content.to_lowercase()).collect();

        characters
            .iter()
            .flat_map(|character| {
                let mut holes = Self::absences(character, chapters, &lowered, detected_at);
                holes.extend(Self::trait_contradictions(
                    character,
                    chapters,
                    &lowered,
                    detected_at,
                ));
                holes
            })
            .collect()
    }
}

/// Commitments made early that no later chapter pays off.
pub struct UnresolvedThreadAnalyzer;

impl PlotHoleAnalyzer for UnresolvedThreadAnalyzer {
    fn name(&self) -> &'static str {
        "unresolved_thread"
    }

    fn analyze(
        &self,
        chapters: &[Chapter],
        _characters: &[Character],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        let checked = chapters.len().saturating_sub(PAYOFF_WINDOW);

        (0..checked)
            .filter_map(|i| {
                let chapter = &chapters[i];
                let commitment = COMMITMENT.find(&chapter.content)?;
                let paid_off = chapters[i + 1..]
                    .iter()
                    .any(|later| PAYOFF.is_match(&later.content));
                if paid_off {
                    return None;
                }

                Some(make_hole(
                    format!("unresolved-{}", slugify(&chapter.id)),
                    PlotHoleType::UnresolvedThread,
                    Severity::Moderate,
                    format!("Unresolved commitment in \"{}\"", chapter.display_name()),
                    format!(
                        "\"{}\" sets up a commitment (\"{}\") that no later chapter resolves.",
                        chapter.display_name(),
                        commitment.as_str().to_lowercase()
                    ),
                    vec![chapter.id.clone()],
                    Vec::new(),
                    0.5,
                    detected_at,
                ))
            })
            .collect()
    }
}

/// Locked barriers that are later opened without ever being unlocked.
pub struct LogicAnalyzer;

impl PlotHoleAnalyzer for LogicAnalyzer {
    fn name(&self) -> &'static str {
        "logic"
    }

    fn analyze(
        &self,
        chapters: &[Chapter],
        _characters: &[Character],
        detected_at: DateTime<Utc>,
    ) -> Vec<PlotHole> {
        chapters
            .iter()
            .filter_map(|chapter| {
                let lower = chapter.content.to_lowercase();
                let locked = LOCKED_BARRIER.captures(&lower)?;
                let barrier = locked.get(1)?.as_str().to_string();
                let after = locked.get(0)?.end();

                if !lower[after..].contains("opened") || lower.contains("unlock") {
                    return None;
                }

                Some(make_hole(
                    format!("logic-locked-{}-{}", barrier, slugify(&chapter.id)),
                    PlotHoleType::Logic,
                    Severity::Minor,
                    format!("Locked {} opened", barrier),
                    format!(
                        "In \"{}\" the {} is locked but later opened with no mention of \
                         unlocking it.",
                        chapter.display_name(),
                        barrier
                    ),
                    vec![chapter.id.clone()],
                    Vec::new(),
                    0.6,
                    detected_at,
                ))
            })
            .collect()
    }
}

// ============================================================================
// Detector
// ============================================================================

/// Runs the analyzers in a fixed order and scores the findings.
pub struct PlotHoleDetector {
    analyzers: Vec<Box<dyn PlotHoleAnalyzer>>,
}

impl Default for PlotHoleDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl PlotHoleDetector {
    /// Detector with the built-in analyzers.
    pub fn new() -> Self {
        Self {
            analyzers: vec![
                Box::new(TimelineAnalyzer),
                Box::new(CharacterConsistencyAnalyzer),
                Box::new(UnresolvedThreadAnalyzer),
                Box::new(LogicAnalyzer),
            ],
        }
    }

    pub fn with_analyzers(analyzers: Vec<Box<dyn PlotHoleAnalyzer>>) -> Self {
        Self { analyzers }
    }

    /// Scan a manuscript. Fails only on invalid input.
    pub fn detect_plot_holes(
        &self,
        project_id: &str,
        chapters: &[Chapter],
        characters: &[Character],
    ) -> Result<PlotHoleAnalysis, PlotweaveError> {
        super::validate_manuscript(project_id, chapters, characters)?;

        let analyzed_at = Utc::now();
        let mut holes = Vec::new();
        for analyzer in &self.analyzers {
            let found = analyzer.analyze(chapters, characters, analyzed_at);
            debug!("{} analyzer found {} holes", analyzer.name(), found.len());
            holes.extend(found);
        }

        let overall_score = calculate_score(&holes);
        let summary = summarize(&holes, overall_score);

        Ok(PlotHoleAnalysis {
            project_id: project_id.to_string(),
            analyzed_at,
            holes,
            overall_score,
            summary,
        })
    }
}

/// `100 - sum(weight * confidence)`, floored at 0 and rounded.
pub fn calculate_score(holes: &[PlotHole]) -> u8 {
    let penalty: f32 = holes.iter().map(|h| h.penalty()).sum();
    (100.0 - penalty).max(0.0).round() as u8
}

/// Qualitative bracket for a score.
pub fn score_rating(score: u8) -> &'static str {
    match score {
        90.. => "excellent",
        75..=89 => "good",
        60..=74 => "fair",
        _ => "needs improvement",
    }
}

/// One-line report: counts by severity plus the score bracket.
pub fn summarize(holes: &[PlotHole], score: u8) -> String {
    if holes.is_empty() {
        return format!(
            "No plot holes detected. Overall score: {}/100 ({}).",
            score,
            score_rating(score)
        );
    }

    let counts: Vec<String> = Severity::ALL
        .iter()
        .filter_map(|severity| {
            let n = holes.iter().filter(|h| h.severity == *severity).count();
            (n > 0).then(|| format!("{} {}", n, severity.as_str()))
        })
        .collect();

    format!(
        "Found {} potential plot {} ({}). Overall score: {}/100 ({}).",
        holes.len(),
        if holes.len() == 1 { "hole" } else { "holes" },
        counts.join(", "),
        score,
        score_rating(score)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Psychology;

    fn chapter(id: &str, content: &str) -> Chapter {
        Chapter::new(id, content)
    }

    fn brave(name: &str) -> Character {
        Character {
            id: format!("char-{}", name.to_lowercase()),
            name: name.to_string(),
            role: "protagonist".into(),
            psychology: Psychology {
                personality_traits: vec!["Brave".into()],
                flaws: vec![],
            },
        }
    }

    #[test]
    fn test_timeline_morning_to_morning() {
        let chapters = vec![
            chapter("c1", "They rode until the morning sun rose."),
            chapter("c2", "At dawn the camp stirred."),
        ];
        let holes = TimelineAnalyzer.analyze(&chapters, &[], Utc::now());
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].severity, Severity::Minor);
        assert_eq!(holes[0].id, "timeline-c1-c2");
    }

    #[test]
    fn test_timeline_duration_marker_suppresses() {
        let chapters = vec![
            chapter("c1", "They rode until the morning sun rose."),
            chapter("c2", "Three days later, at dawn, the camp stirred."),
        ];
        assert!(TimelineAnalyzer.analyze(&chapters, &[], Utc::now()).is_empty());
    }

    #[test]
    fn test_trait_contradiction_id() {
        let chapters: Vec<Chapter> = (1..=3)
            .map(|i| chapter(&format!("c{}", i), "When the wolves came, Kael fled."))
            .collect();
        let holes = CharacterConsistencyAnalyzer.analyze(&chapters, &[brave("Kael")], Utc::now());
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].id, "trait-contradiction-kael-brave");
        assert_eq!(holes[0].severity, Severity::Moderate);
        assert!((holes[0].confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_two_contradictions_are_tolerated() {
        let chapters = vec![
            chapter("c1", "Kael fled."),
            chapter("c2", "Kael cowered."),
            chapter("c3", "Kael stood firm."),
        ];
        assert!(CharacterConsistencyAnalyzer
            .analyze(&chapters, &[brave("Kael")], Utc::now())
            .is_empty());
    }

    #[test]
    fn test_absence_gap() {
        let mut chapters = vec![chapter("c1", "Mira arrives.")];
        for i in 2..=7 {
            chapters.push(chapter(&format!("c{}", i), "Nobody here."));
        }
        chapters.push(chapter("c8", "Mira returns."));
        let mira = Character::new("m", "Mira", "supporting");
        let holes = CharacterConsistencyAnalyzer.analyze(&chapters, &[mira], Utc::now());
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].id, "absence-mira-1-8");
    }

    #[test]
    fn test_unresolved_skips_last_three() {
        let chapters = vec![
            chapter("c1", "She promised to come back for the sword."),
            chapter("c2", "Travel."),
            chapter("c3", "More travel."),
            chapter("c4", "He vowed to return."),
        ];
        let holes = UnresolvedThreadAnalyzer.analyze(&chapters, &[], Utc::now());
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].affected_chapters, vec!["c1".to_string()]);
    }

    #[test]
    fn test_unresolved_payoff_clears() {
        let chapters = vec![
            chapter("c1", "She promised to come back for the sword."),
            chapter("c2", "Travel."),
            chapter("c3", "She returned for the sword."),
            chapter("c4", "End."),
        ];
        assert!(UnresolvedThreadAnalyzer
            .analyze(&chapters, &[], Utc::now())
            .is_empty());
    }

    #[test]
    fn test_commitment_needs_word_boundary() {
        let chapters = vec![
            chapter("c1", "The mustard was fine."),
            chapter("c2", "x"),
            chapter("c3", "y"),
            chapter("c4", "z"),
        ];
        assert!(UnresolvedThreadAnalyzer
            .analyze(&chapters, &[], Utc::now())
            .is_empty());
    }

    #[test]
    fn test_logic_locked_then_opened() {
        let chapters = vec![chapter(
            "c1",
            "The door was locked. After a while he opened the door.",
        )];
        let holes = LogicAnalyzer.analyze(&chapters, &[], Utc::now());
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].hole_type, PlotHoleType::Logic);
        assert_eq!(holes[0].severity, Severity::Minor);
    }

    #[test]
    fn test_logic_unlock_suppresses() {
        let chapters = vec![chapter(
            "c1",
            "The gate was locked. She unlocked it, and the gate opened.",
        )];
        assert!(LogicAnalyzer.analyze(&chapters, &[], Utc::now()).is_empty());
    }

    #[test]
    fn test_score_and_rating() {
        assert_eq!(calculate_score(&[]), 100);
        assert_eq!(score_rating(100), "excellent");
        assert_eq!(score_rating(75), "good");
        assert_eq!(score_rating(60), "fair");
        assert_eq!(score_rating(59), "needs improvement");
    }

    #[test]
    fn test_validation_rejects_blank_ids() {
        let detector = PlotHoleDetector::new();
        assert!(detector.detect_plot_holes(" ", &[], &[]).is_err());
        assert!(detector
            .detect_plot_holes("p", &[chapter("", "text")], &[])
            .is_err());
        assert!(detector
            .detect_plot_holes("p", &[], &[Character::new("c", "  ", "")])
            .is_err());
    }

    #[test]
    fn test_summary_clean() {
        insta::assert_snapshot!(
            summarize(&[], 100),
            @"No plot holes detected. Overall score: 100/100 (excellent)."
        );
    }
}
