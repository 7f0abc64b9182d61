//! Per-kind answer collectors. Presenters only turn player input into a
//! [`Submission`]; the controller decides what it means.

pub mod creative;
pub mod entry;
pub mod pattern;
pub mod timing;

use rand::Rng;

pub use creative::CreativeEncounter;
pub use entry::AnswerEntry;
pub use pattern::PatternBoard;
pub use timing::AlignmentGauge;

use crate::puzzle::{Puzzle, PuzzleKind};

#[derive(Debug, Clone, PartialEq)]
pub enum Presenter {
    Entry(AnswerEntry),
    Pattern(PatternBoard),
    Timing(AlignmentGauge),
    Creative(CreativeEncounter),
}

impl Presenter {
    pub fn for_puzzle<R: Rng + ?Sized>(puzzle: &Puzzle, rng: &mut R) -> Self {
        match &puzzle.kind {
            PuzzleKind::Text => Presenter::Entry(AnswerEntry::text()),
            PuzzleKind::Image { clue } => Presenter::Entry(AnswerEntry::image(clue.clone())),
            PuzzleKind::Voice => Presenter::Entry(AnswerEntry::voice()),
            PuzzleKind::Pattern { length } => {
                Presenter::Pattern(PatternBoard::generate(*length, rng))
            }
            PuzzleKind::Timing => Presenter::Timing(AlignmentGauge::new()),
            PuzzleKind::Creative(config) => {
                Presenter::Creative(CreativeEncounter::new(config.clone()))
            }
        }
    }

    /// Whether typed text goes into the answer box.
    pub fn takes_text(&self) -> bool {
        matches!(self, Presenter::Entry(_) | Presenter::Creative(_))
    }

    pub fn tick(&mut self) {
        if let Presenter::Timing(gauge) = self {
            gauge.tick();
        }
    }

    pub fn on_verdict(&mut self, correct: bool) {
        match self {
            Presenter::Creative(encounter) => encounter.on_verdict(correct),
            Presenter::Timing(gauge) if !correct => gauge.unlock(),
            Presenter::Pattern(board) if !correct => board.reset(),
            _ => {}
        }
    }

    /// The encounter has ended in failure; only a restart helps.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Presenter::Creative(encounter) if encounter.is_lost())
    }
}

/// Hints can be requested while some remain and nothing is being checked.
pub fn can_request_hint(puzzle: &Puzzle, used: usize, processing: bool) -> bool {
    !processing && puzzle.has_hints_left(used)
}
