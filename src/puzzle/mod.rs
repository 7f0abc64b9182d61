pub mod factory;
pub mod loader;
pub mod types;

pub use factory::{build_levels, LevelFactory};
pub use loader::{load_catalog, load_level, Catalog, ContentError};
pub use types::{
    AiConfig, CreativeConfig, Level, Puzzle, PuzzleKind, Submission, Validation,
};
