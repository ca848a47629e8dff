//! Integration tests for project persistence.

mod common;

use plotweave::models::{PlotSuggestion, SuggestionType};
use plotweave::repository::{FilePlotRepository, InMemoryPlotRepository, PlotRepository};
use plotweave::services::CharacterGraphBuilder;
use plotweave::PlotweaveError;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::{chapter, plot_structure, CharacterBuilder};

fn suggestion(id: &str) -> PlotSuggestion {
    PlotSuggestion {
        id: id.to_string(),
        suggestion_type: SuggestionType::Subplot,
        title: "The smuggler's debt".to_string(),
        description: "Amara owes the harbor master.".to_string(),
        impact: Some("medium".to_string()),
    }
}

/// Store one of everything, then read it back through the trait.
async fn exercise(repo: &dyn PlotRepository) {
    let structure = plot_structure("novel");
    repo.save_plot_structure(&structure).await.unwrap();

    let graph = CharacterGraphBuilder::new()
        .build_character_graph(
            "novel",
            &[chapter("ch1", "Kael and Amara fought.")],
            &[
                CharacterBuilder::new("Kael").build(),
                CharacterBuilder::new("Amara").build(),
            ],
        )
        .unwrap();
    repo.save_character_graph(&graph).await.unwrap();

    repo.replace_suggestions("novel", vec![suggestion("s1"), suggestion("s2")])
        .await
        .unwrap();
    repo.replace_suggestions("novel", vec![suggestion("s3")])
        .await
        .unwrap();

    let stored = repo.get_plot_structure("novel").await.unwrap().unwrap();
    assert_eq!(stored.id, "plot-novel");
    assert_eq!(stored.acts, structure.acts);
    assert_eq!(stored.climax, structure.climax);

    let stored_graph = repo.get_character_graph("novel").await.unwrap().unwrap();
    assert_eq!(stored_graph.relationships, graph.relationships);

    // Suggestions are replaced wholesale.
    let ids: Vec<String> = repo
        .get_suggestions("novel")
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(ids, vec!["s3"]);

    assert!(repo.get_project("elsewhere").await.unwrap().is_none());
    assert!(repo.get_plot_holes("novel").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_in_memory_round_trip() {
    exercise(&InMemoryPlotRepository::new()).await;
}

#[tokio::test]
async fn test_file_round_trip() {
    let dir = TempDir::new().unwrap();
    exercise(&FilePlotRepository::new(dir.path())).await;
    assert!(dir.path().join("projects").join("novel.json").exists());
}

#[tokio::test]
async fn test_file_repository_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let repo = FilePlotRepository::new(dir.path());
        repo.save_plot_structure(&plot_structure("novel-2"))
            .await
            .unwrap();
        repo.save_plot_structure(&plot_structure("novel-1"))
            .await
            .unwrap();
    }

    let reopened = FilePlotRepository::new(dir.path());
    assert_eq!(
        reopened.list_projects().await.unwrap(),
        vec!["novel-1", "novel-2"]
    );
    let record = reopened.get_project("novel-1").await.unwrap().unwrap();
    assert_eq!(record.project_id, "novel-1");
    assert!(record.plot_structure.is_some());
}

#[tokio::test]
async fn test_unsafe_project_ids_are_rejected() {
    let dir = TempDir::new().unwrap();
    let repo = FilePlotRepository::new(dir.path());

    for id in ["../escape", "a/b", ".hidden", " "] {
        let err = repo
            .save_plot_structure(&plot_structure(id))
            .await
            .unwrap_err();
        assert!(
            matches!(err, PlotweaveError::Validation(_)),
            "{:?} should be rejected",
            id
        );
    }
    assert!(repo.list_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_file_is_a_storage_error() {
    let dir = TempDir::new().unwrap();
    let projects = dir.path().join("projects");
    std::fs::create_dir_all(&projects).unwrap();
    std::fs::write(projects.join("broken.json"), "{ not json").unwrap();

    let repo = FilePlotRepository::new(dir.path());
    let err = repo.get_project("broken").await.unwrap_err();
    assert!(matches!(err, PlotweaveError::Storage(_)));
}
