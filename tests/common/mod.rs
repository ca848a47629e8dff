#![allow(dead_code)]

pub mod builders;
pub mod provider;

pub use builders::{chapter, plot_structure, ChapterBuilder, CharacterBuilder};
pub use provider::ScriptedProvider;
