use rand::seq::SliceRandom;
use rand::Rng;

use crate::puzzle::Submission;

pub const LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];
pub const DIGITS: [char; 5] = ['1', '2', '3', '4', '5'];

/// Reference sequence plus the player's picks so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternBoard {
    reference: Vec<char>,
    selected: Vec<char>,
    feedback: Option<&'static str>,
}

impl PatternBoard {
    /// Each position is a letter or a digit with equal odds.
    pub fn generate<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Self {
        let reference = (0..length.max(1))
            .map(|_| {
                let set = if rng.gen_bool(0.5) { &LETTERS } else { &DIGITS };
                *set.choose(rng).unwrap_or(&set[0])
            })
            .collect();
        Self::with_reference(reference)
    }

    pub fn with_reference(reference: Vec<char>) -> Self {
        Self {
            reference,
            selected: Vec::new(),
            feedback: None,
        }
    }

    pub fn symbols() -> impl Iterator<Item = char> {
        LETTERS.into_iter().chain(DIGITS)
    }

    pub fn reference(&self) -> &[char] {
        &self.reference
    }

    pub fn selected(&self) -> &[char] {
        &self.selected
    }

    pub fn feedback(&self) -> Option<&'static str> {
        self.feedback
    }

    pub fn is_matched(&self) -> bool {
        self.selected == self.reference
    }

    /// Adds a pick. The pick that completes a correct sequence yields
    /// [`Submission::PatternMatched`]; a wrong full sequence clears the picks.
    pub fn pick(&mut self, symbol: char, processing: bool) -> Option<Submission> {
        let symbol = symbol.to_ascii_uppercase();
        if processing || !Self::symbols().any(|s| s == symbol) {
            return None;
        }
        if self.selected.len() >= self.reference.len() {
            return None;
        }

        self.selected.push(symbol);
        if self.selected.len() < self.reference.len() {
            self.feedback = None;
            return None;
        }

        if self.is_matched() {
            self.feedback = Some("Pattern matched! Launching...");
            Some(Submission::PatternMatched)
        } else {
            self.feedback = Some("Pattern mismatch. Try again.");
            self.selected.clear();
            None
        }
    }

    pub fn reset(&mut self) {
        self.selected.clear();
        self.feedback = None;
    }
}
