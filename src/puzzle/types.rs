use serde::Deserialize;

/// Canonical answer of creative encounters in older content files.
pub const SURVIVAL_ANSWER: &str = "survival";
/// What the pattern presenter reports on a full match.
pub const MATCHED_ANSWER: &str = "matched";
/// What the timing presenter reports when the indicator stops in the window.
pub const ALIGNED_ANSWER: &str = "aligned";

pub const DEFAULT_PATTERN_LENGTH: usize = 4;
pub const DEFAULT_HEALTH: u32 = 100;

// =============================================================================
// Playable levels
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub id: String,
    pub name: String,
    pub description: String,
    pub puzzles: Vec<Puzzle>,
    pub story_intro: Option<String>,
    pub story_outro: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Puzzle {
    pub id: String,
    pub kind: PuzzleKind,
    pub question: String,
    pub answer: String,
    pub hints: Vec<String>,
    pub validation: Validation,
}

impl Puzzle {
    /// Hints the player has unlocked, never more than the puzzle has.
    pub fn revealed_hints(&self, used: usize) -> &[String] {
        &self.hints[..used.min(self.hints.len())]
    }

    pub fn has_hints_left(&self, used: usize) -> bool {
        used < self.hints.len()
    }

    /// Long free-text answers to these puzzles are judged as survival
    /// strategies rather than compared with the canonical answer.
    pub fn expects_strategy(&self) -> bool {
        matches!(self.kind, PuzzleKind::Creative(_)) || self.answer == SURVIVAL_ANSWER
    }

    pub fn type_label(&self) -> &'static str {
        self.kind.label()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PuzzleKind {
    Text,
    /// A scanned security badge; `clue` is what the scanner shows.
    Image { clue: Option<String> },
    Voice,
    Pattern { length: usize },
    Timing,
    Creative(CreativeConfig),
}

impl PuzzleKind {
    pub fn label(&self) -> &'static str {
        match self {
            PuzzleKind::Text => "Text Analysis",
            PuzzleKind::Image { .. } => "Visual Recognition",
            PuzzleKind::Voice => "Audio Verification",
            PuzzleKind::Pattern { .. } => "Pattern Matching",
            PuzzleKind::Timing => "Precision Timing",
            PuzzleKind::Creative(_) => "Survival Strategy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Exact,
    Ai(AiConfig),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreativeConfig {
    #[serde(default = "default_items")]
    pub available_items: Vec<String>,
    #[serde(default = "default_scenario")]
    pub scenario: String,
    #[serde(default = "default_health")]
    pub health: u32,
}

impl Default for CreativeConfig {
    fn default() -> Self {
        Self {
            available_items: default_items(),
            scenario: default_scenario(),
            health: DEFAULT_HEALTH,
        }
    }
}

fn default_items() -> Vec<String> {
    [
        "Broken pipe wrench",
        "Fire extinguisher",
        "Electrical wire",
        "Maintenance tool kit",
        "Broken glass shard",
        "Emergency flare",
        "Coolant canister",
        "Portable welding torch",
        "Medical kit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_scenario() -> String {
    "The creature has you cornered. Fight back with whatever is around you!".to_string()
}

fn default_health() -> u32 {
    DEFAULT_HEALTH
}

/// What a presenter hands to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Text(String),
    /// The pattern board saw a full match.
    PatternMatched,
    /// The timing indicator stopped inside the window.
    Aligned,
}

impl Submission {
    pub fn as_text(&self) -> &str {
        match self {
            Submission::Text(text) => text,
            Submission::PatternMatched => MATCHED_ANSWER,
            Submission::Aligned => ALIGNED_ANSWER,
        }
    }
}

// =============================================================================
// Content templates (what the TOML files hold)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LevelTemplate {
    pub meta: LevelMeta,
    #[serde(default)]
    pub story: Story,
    #[serde(rename = "puzzle", default)]
    pub puzzles: Vec<PuzzleSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LevelMeta {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default)]
    pub outro: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KindTag {
    Text,
    Image,
    Voice,
    Pattern,
    Timing,
    Creative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidateWith {
    Exact,
    Ai,
}

/// A puzzle position in a level. Fields left out are drawn from `pool`.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleSlot {
    pub id: String,
    pub kind: KindTag,
    #[serde(default)]
    pub pool: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub clue: Option<String>,
    #[serde(default)]
    pub pattern_length: Option<usize>,
    #[serde(default)]
    pub validate_with: Option<ValidateWith>,
    #[serde(default)]
    pub ai: Option<AiConfig>,
    #[serde(default)]
    pub creative: Option<CreativeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    #[serde(default)]
    pub question: Option<String>,
    pub answer: String,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub clue: Option<String>,
}
