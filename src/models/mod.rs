pub mod character_graph;
pub mod manuscript;
pub mod plot;
pub mod plot_hole;

pub use character_graph::{
    CharacterGraph, CharacterNode, CharacterRelationship, EvolutionPattern, RelationshipSnapshot,
    RelationshipType,
};
pub use manuscript::{Chapter, Character, Manuscript, ProjectContext, Psychology};
pub use plot::{
    normalize_point_type, Act, GenerationSource, Importance, NarrativeStructure,
    PlotGenerationRequest, PlotGenerationResult, PlotPoint, PlotStructure, PlotSuggestion,
    SuggestionType, DEFAULT_TARGET_LENGTH,
};
pub use plot_hole::{PlotHole, PlotHoleAnalysis, PlotHoleType, Severity};
