//! Escape the derelict ship: a level-by-level puzzle game whose free-text
//! answers can be judged by a language model.

pub mod config;
pub mod game;
pub mod presenter;
pub mod puzzle;
pub mod validation;

pub use config::Config;
pub use game::{GameController, GameEvent, GameState, Outcome, Scheduler, Screen, SubmitError};
pub use presenter::Presenter;
pub use puzzle::{load_catalog, Catalog, Level, LevelFactory, Puzzle, PuzzleKind, Submission};
pub use validation::{AnswerValidator, LanguageModel, Verdict};
