//! Deferred transitions and background validations, all cancellable.
//!
//! Every task spawned here is tied to the current cancellation token and
//! stamped with the current generation. `cancel_all` cancels the token and
//! bumps the generation, so a task that already delivered its event before
//! the cancel is still recognised as stale by `is_current`.

use log::debug;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use super::state::Screen;
use crate::puzzle::{Puzzle, Submission};
use crate::validation::{AnswerValidator, Verdict};

/// Delay before a non-user-driven screen change.
pub const SCREEN_DELAY: Duration = Duration::from_millis(100);
/// Delay between finishing a level with no outro and advancing.
pub const ADVANCE_DELAY: Duration = Duration::from_millis(200);
/// Delay before showing the completion screen.
pub const COMPLETE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Show(Screen),
    AdvanceLevel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Transition {
        generation: u64,
        transition: Transition,
    },
    Verdict {
        generation: u64,
        puzzle_id: String,
        verdict: Verdict,
    },
}

impl GameEvent {
    pub fn generation(&self) -> u64 {
        match self {
            GameEvent::Transition { generation, .. } | GameEvent::Verdict { generation, .. } => {
                *generation
            }
        }
    }
}

#[derive(Debug)]
pub struct Scheduler {
    events: UnboundedSender<GameEvent>,
    token: CancellationToken,
    generation: u64,
}

impl Scheduler {
    pub fn new(events: UnboundedSender<GameEvent>) -> Self {
        Self {
            events,
            token: CancellationToken::new(),
            generation: 0,
        }
    }

    pub fn channel() -> (Self, UnboundedReceiver<GameEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, event: &GameEvent) -> bool {
        event.generation() == self.generation
    }

    /// Delivers `transition` after `delay` unless cancelled first.
    pub fn schedule(&self, delay: Duration, transition: Transition) {
        let token = self.token.clone();
        let events = self.events.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("deferred {transition:?} cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    if events.send(GameEvent::Transition { generation, transition }).is_err() {
                        debug!("event receiver gone; dropping deferred transition");
                    }
                }
            }
        });
    }

    /// Runs the validator in the background and delivers its verdict.
    pub fn spawn_validation(
        &self,
        validator: AnswerValidator,
        puzzle: Puzzle,
        submission: Submission,
    ) {
        let token = self.token.clone();
        let events = self.events.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("validation of {} cancelled", puzzle.id);
                }
                verdict = validator.validate(&puzzle, &submission) => {
                    let event = GameEvent::Verdict {
                        generation,
                        puzzle_id: puzzle.id.clone(),
                        verdict,
                    };
                    if events.send(event).is_err() {
                        debug!("event receiver gone; dropping verdict");
                    }
                }
            }
        });
    }

    /// Invalidates everything scheduled so far.
    pub fn cancel_all(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
        self.generation += 1;
        debug!("scheduler generation now {}", self.generation);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
