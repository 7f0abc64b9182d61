use std::collections::HashMap;

/// Which top-level view is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    Intro,
    StoryIntro,
    Playing,
    StoryOutro,
    Complete,
}

/// Progress through one playthrough. Rebuilt from scratch on restart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GameState {
    pub current_level_id: String,
    /// Index into the active level's puzzles; equal to its length between
    /// finishing the level and moving to the next one.
    pub current_puzzle_index: usize,
    pub completed_puzzles: Vec<String>,
    pub hints_used: HashMap<String, usize>,
    /// A validation is in flight.
    pub is_loading: bool,
    pub error: Option<String>,
}

impl GameState {
    pub fn new(first_level_id: &str) -> Self {
        Self {
            current_level_id: first_level_id.to_string(),
            ..Self::default()
        }
    }

    pub fn hints_for(&self, puzzle_id: &str) -> usize {
        self.hints_used.get(puzzle_id).copied().unwrap_or(0)
    }

    pub fn total_hints(&self) -> usize {
        self.hints_used.values().sum()
    }

    pub fn is_completed(&self, puzzle_id: &str) -> bool {
        self.completed_puzzles.iter().any(|id| id == puzzle_id)
    }
}
