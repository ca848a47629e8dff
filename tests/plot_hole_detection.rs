//! Integration tests for plot-hole detection over whole manuscripts.

mod common;

use chrono::Utc;
use plotweave::models::{PlotHole, PlotHoleType, Severity};
use plotweave::services::plot_holes::{calculate_score, score_rating};
use plotweave::services::PlotHoleDetector;
use plotweave::PlotweaveError;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use common::{chapter, ChapterBuilder, CharacterBuilder};

// ============================================================================
// SINGLE-DEFECT MANUSCRIPTS
// ============================================================================

#[test]
fn test_clean_manuscript_scores_100() {
    let chapters = vec![
        chapter("ch1", "Kael reached the harbor at dusk."),
        chapter("ch2", "Three days later, Kael boarded the ship."),
    ];
    let characters = vec![CharacterBuilder::new("Kael").build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &characters)
        .unwrap();

    assert!(analysis.holes.is_empty());
    assert_eq!(analysis.overall_score, 100);
    assert_eq!(
        analysis.summary,
        "No plot holes detected. Overall score: 100/100 (excellent)."
    );
}

#[test]
fn test_brave_character_fleeing_three_times() {
    let chapters = vec![
        chapter("ch1", "At the first sign of the wolves, Kael fled into the trees."),
        chapter("ch2", "Kael fled again when the bandits came."),
        chapter("ch3", "Facing the dragon, Kael fled without a word."),
    ];
    let characters = vec![CharacterBuilder::new("Kael")
        .role("protagonist")
        .with_trait("brave")
        .build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &characters)
        .unwrap();

    let contradictions: Vec<&PlotHole> = analysis
        .holes_of_type(PlotHoleType::CharacterInconsistency)
        .collect();
    assert_eq!(contradictions.len(), 1);
    let hole = contradictions[0];
    assert_eq!(hole.id, "trait-contradiction-kael-brave");
    assert_eq!(hole.severity, Severity::Moderate);
    assert_eq!(hole.affected_chapters, vec!["ch1", "ch2", "ch3"]);
    assert_eq!(hole.affected_characters, vec!["kael"]);
    assert!((hole.confidence - 0.7).abs() < 1e-6);
    assert!(hole.suggested_fix.is_some());
}

#[test]
fn test_two_flights_are_tolerated() {
    let chapters = vec![
        chapter("ch1", "Kael fled."),
        chapter("ch2", "Kael fled."),
        chapter("ch3", "Kael stood his ground."),
    ];
    let characters = vec![CharacterBuilder::new("Kael").with_trait("Brave").build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &characters)
        .unwrap();
    assert_eq!(
        analysis
            .holes_of_type(PlotHoleType::CharacterInconsistency)
            .count(),
        0
    );
}

#[test]
fn test_locked_door_opened_without_unlocking() {
    let chapters = vec![ChapterBuilder::new("vault")
        .title("The Vault")
        .text("The door was locked and the guards were gone.")
        .text("Mira pushed and the door opened onto darkness.")
        .build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &[])
        .unwrap();

    assert_eq!(analysis.holes.len(), 1);
    let hole = &analysis.holes[0];
    assert_eq!(hole.hole_type, PlotHoleType::Logic);
    assert_eq!(hole.id, "logic-locked-door-vault");
    assert_eq!(hole.severity, Severity::Minor);
    assert!(hole.description.contains("The Vault"));
    // 100 - 2 * 0.6
    assert_eq!(analysis.overall_score, 99);
}

#[test]
fn test_unlocking_clears_the_locked_door() {
    let chapters = vec![chapter(
        "vault",
        "The door was locked. Mira unlocked it with the stolen key and the door opened.",
    )];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &[])
        .unwrap();
    assert!(analysis.holes.is_empty());
}

#[test]
fn test_morning_to_morning_without_time_skip() {
    let chapters = vec![
        chapter("ch1", "They rode all night and arrived at dawn."),
        chapter("ch2", "In the morning light the city looked smaller."),
    ];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &[])
        .unwrap();

    let timeline: Vec<&PlotHole> = analysis.holes_of_type(PlotHoleType::Timeline).collect();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].id, "timeline-ch1-ch2");
    assert_eq!(timeline[0].affected_chapters, vec!["ch1", "ch2"]);
}

#[test]
fn test_stated_time_skip_suppresses_timeline_hole() {
    let chapters = vec![
        chapter("ch1", "They arrived at dawn."),
        chapter("ch2", "Two weeks passed. In the morning the city looked smaller."),
    ];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &[])
        .unwrap();
    assert_eq!(analysis.holes_of_type(PlotHoleType::Timeline).count(), 0);
}

#[test]
fn test_unpaid_promise_is_unresolved() {
    let chapters = vec![
        chapter("ch1", "Mira promised to find her brother."),
        chapter("ch2", "The caravan moved south."),
        chapter("ch3", "Storms kept them in the pass."),
        chapter("ch4", "They reached the coast."),
        chapter("ch5", "The ship sailed."),
    ];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &[])
        .unwrap();

    let unresolved: Vec<&PlotHole> = analysis
        .holes_of_type(PlotHoleType::UnresolvedThread)
        .collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id, "unresolved-ch1");
    assert_eq!(analysis.overall_score, 98);
}

#[test]
fn test_long_absence_is_flagged() {
    let mut chapters = vec![chapter("ch1", "Amara left for the north.")];
    for i in 2..=7 {
        chapters.push(chapter(&format!("ch{}", i), "The war dragged on."));
    }
    chapters.push(chapter("ch8", "Amara walked back into camp."));
    let characters = vec![CharacterBuilder::new("Amara").build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &characters)
        .unwrap();

    let absences: Vec<&PlotHole> = analysis
        .holes_of_type(PlotHoleType::CharacterInconsistency)
        .collect();
    assert_eq!(absences.len(), 1);
    assert_eq!(absences[0].id, "absence-amara-1-8");
    assert_eq!(absences[0].affected_chapters, vec!["ch1", "ch8"]);
}

#[test]
fn test_padded_name_is_matched_like_the_graph_does() {
    let mut chapters = vec![chapter("ch1", "Amara left for the north.")];
    for i in 2..=7 {
        chapters.push(chapter(&format!("ch{}", i), "The war dragged on."));
    }
    chapters.push(chapter("ch8", "Amara walked back into camp."));
    let characters = vec![CharacterBuilder::new(" Amara ").id("amara").build()];

    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &chapters, &characters)
        .unwrap();

    let ids: Vec<&str> = analysis.holes.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["absence-amara-1-8"]);
}

// ============================================================================
// WHOLE-REPORT PROPERTIES
// ============================================================================

fn messy_manuscript() -> Vec<plotweave::models::Chapter> {
    vec![
        chapter("ch1", "Kael fled. Kael promised to return the crown. They slept until morning."),
        chapter("ch2", "Morning again. Kael fled. The gate was locked, yet the gate opened."),
        chapter("ch3", "Kael fled once more."),
        chapter("ch4", "Nothing happened."),
    ]
}

#[test]
fn test_detection_is_deterministic() {
    let characters = vec![CharacterBuilder::new("Kael").with_trait("brave").build()];
    let detector = PlotHoleDetector::new();

    let first = detector
        .detect_plot_holes("novel", &messy_manuscript(), &characters)
        .unwrap();
    let second = detector
        .detect_plot_holes("novel", &messy_manuscript(), &characters)
        .unwrap();

    let ids = |a: &plotweave::models::PlotHoleAnalysis| {
        a.holes.iter().map(|h| h.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.overall_score, second.overall_score);
    assert_eq!(first.summary, second.summary);
    assert!(first.holes.len() >= 3);
}

#[test]
fn test_empty_manuscript_is_valid() {
    let analysis = PlotHoleDetector::new()
        .detect_plot_holes("novel", &[], &[])
        .unwrap();
    assert!(analysis.holes.is_empty());
    assert_eq!(analysis.overall_score, 100);
}

#[test]
fn test_invalid_input_is_rejected() {
    let detector = PlotHoleDetector::new();

    let err = detector.detect_plot_holes(" ", &[], &[]).unwrap_err();
    assert!(matches!(err, PlotweaveError::Validation(_)));

    let err = detector
        .detect_plot_holes("novel", &[chapter("", "text")], &[])
        .unwrap_err();
    assert!(err.to_string().contains("position 1"));

    let nameless = CharacterBuilder::new("").build();
    assert!(detector
        .detect_plot_holes("novel", &[], &[nameless])
        .is_err());
}

fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Minor),
        Just(Severity::Moderate),
        Just(Severity::Major),
        Just(Severity::Critical),
    ]
}

fn hole_strategy() -> impl Strategy<Value = PlotHole> {
    (severity_strategy(), 0.0f32..=1.0).prop_map(|(severity, confidence)| PlotHole {
        id: "h".into(),
        hole_type: PlotHoleType::Logic,
        severity,
        title: "t".into(),
        description: "d".into(),
        affected_chapters: vec![],
        affected_characters: vec![],
        suggested_fix: None,
        confidence,
        detected_at: Utc::now(),
    })
}

proptest! {
    #[test]
    fn prop_adding_a_hole_never_raises_the_score(
        holes in prop::collection::vec(hole_strategy(), 0..30),
        extra in hole_strategy(),
    ) {
        let before = calculate_score(&holes);
        let mut more = holes.clone();
        more.push(extra);
        prop_assert!(calculate_score(&more) <= before);
        prop_assert!(before <= 100);
    }

    #[test]
    fn prop_rating_brackets_are_ordered(a in 0u8..=100, b in 0u8..=100) {
        let rank = |s: u8| match score_rating(s) {
            "excellent" => 3,
            "good" => 2,
            "fair" => 1,
            _ => 0,
        };
        if a <= b {
            prop_assert!(rank(a) <= rank(b));
        }
    }
}
