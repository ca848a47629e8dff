//! Deterministic fallback plot and act duration distribution.

use chrono::Utc;
use uuid::Uuid;

use crate::models::{Act, Importance, PlotGenerationRequest, PlotPoint, PlotStructure};

/// Split `target` chapters over `act_count` acts.
///
/// Three acts split 25/50/25 with the middle act absorbing rounding; any other
/// count splits evenly with the remainder going to the earliest acts. The
/// result always sums to `target`.
pub fn distribute_durations(target: u32, act_count: usize) -> Vec<u32> {
    match act_count {
        0 => Vec::new(),
        3 => {
            let act1 = (target as f64 * 0.25).round() as u32;
            let act3 = (target as f64 * 0.25).round() as u32;
            let act2 = target.saturating_sub(act1 + act3);
            vec![act1, act2, act3]
        }
        n => {
            let n32 = n as u32;
            let base = target / n32;
            let remainder = target % n32;
            (0..n32)
                .map(|i| base + u32::from(i < remainder))
                .collect()
        }
    }
}

/// Assign durations to acts in order.
pub fn apply_durations(acts: &mut [Act], target: u32) {
    let durations = distribute_durations(target, acts.len());
    for (act, duration) in acts.iter_mut().zip(durations) {
        act.duration = duration;
    }
}

fn beat(point_type: &str, title: &str, description: String, position: u8) -> PlotPoint {
    PlotPoint {
        id: Uuid::new_v4().to_string(),
        point_type: point_type.to_string(),
        title: title.to_string(),
        description,
        chapter: None,
        characters: Vec::new(),
        importance: Importance::Major,
        position: Some(position),
    }
}

fn act(act_number: u32, name: &str, description: &str, point: PlotPoint) -> Act {
    Act {
        id: Uuid::new_v4().to_string(),
        act_number,
        name: name.to_string(),
        description: Some(description.to_string()),
        plot_points: vec![point],
        chapters: Vec::new(),
        duration: 0,
    }
}

/// Provider-independent three-act outline built from the request alone.
pub fn template_structure(project_id: &str, request: &PlotGenerationRequest) -> PlotStructure {
    let premise = request.premise.trim();
    let lead = request
        .characters
        .first()
        .map(|c| c.as_str())
        .unwrap_or("the protagonist");

    let inciting = beat(
        "inciting_incident",
        "Inciting Incident",
        format!("{} is pulled into the story: {}", lead, premise),
        10,
    );
    let climax = beat(
        "climax",
        "Climax",
        format!("{} faces the central conflict at its peak.", lead),
        85,
    );
    let resolution = beat(
        "resolution",
        "Resolution",
        format!("The consequences of the climax settle and {} is changed.", lead),
        95,
    );

    let mut acts = vec![
        act(
            1,
            "Setup",
            "Introduce the world, the cast and what is at stake.",
            inciting.clone(),
        ),
        act(
            2,
            "Confrontation",
            "Escalate obstacles until the conflict can no longer be avoided.",
            climax.clone(),
        ),
        act(
            3,
            "Resolution",
            "Resolve the conflict and show its aftermath.",
            resolution.clone(),
        ),
    ];
    apply_durations(&mut acts, request.target_length_or_default());

    let now = Utc::now();
    PlotStructure {
        id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        acts,
        climax: Some(climax),
        resolution: Some(resolution),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_target_splits_5_10_5() {
        assert_eq!(distribute_durations(20, 3), vec![5, 10, 5]);
    }

    #[test]
    fn test_even_split_remainder_goes_first() {
        assert_eq!(distribute_durations(22, 5), vec![5, 5, 4, 4, 4]);
        assert_eq!(distribute_durations(4, 0), Vec::<u32>::new());
    }

    #[test]
    fn test_template_shape() {
        let req = PlotGenerationRequest::new("X", "fantasy");
        let structure = template_structure("p1", &req);
        let names: Vec<&str> = structure.acts.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Setup", "Confrontation", "Resolution"]);
        assert_eq!(structure.total_duration(), 20);
        assert!(structure.climax.as_ref().is_some_and(|c| c.is_type("climax")));
        assert!(structure
            .resolution
            .as_ref()
            .is_some_and(|r| r.is_type("resolution")));
    }

    proptest! {
        #[test]
        fn durations_always_sum_to_target(target in 0u32..500, acts in 1usize..9) {
            let durations = distribute_durations(target, acts);
            prop_assert_eq!(durations.len(), acts);
            prop_assert_eq!(durations.iter().sum::<u32>(), target);
        }
    }
}
