//! Owns the game state and the screen, and drives every transition.
//!
//! Flow per level: `Intro -> (StoryIntro) -> Playing -> (StoryOutro) ->`
//! next level or `Complete`. Transitions that follow from a state change
//! rather than a key press go through the scheduler with a short delay; the
//! state change is always committed before the transition is scheduled.

use log::{debug, error, info, warn};

use super::scheduler::{
    GameEvent, Scheduler, Transition, ADVANCE_DELAY, COMPLETE_DELAY, SCREEN_DELAY,
};
use super::state::{GameState, Screen};
use crate::puzzle::{ContentError, Level, LevelFactory, Puzzle, Submission};
use crate::validation::{is_valid_input, AnswerValidator, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("nothing to submit")]
    Empty,
    #[error("an answer is already being checked")]
    InFlight,
    #[error("answers are only accepted while playing")]
    NotPlaying,
    #[error("the level is changing")]
    Transitioning,
    #[error("there is no active puzzle")]
    NoActivePuzzle,
}

/// How a finished validation turned out for the puzzle on screen.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Solved { puzzle_id: String, verdict: Verdict },
    Rejected { puzzle_id: String, verdict: Verdict },
}

pub struct GameController {
    factory: LevelFactory,
    levels: Vec<Level>,
    level_index: usize,
    state: GameState,
    screen: Screen,
    scheduler: Scheduler,
    validator: AnswerValidator,
    /// A deferred screen change is on its way; blocks double advances.
    transition_pending: bool,
    /// Level whose outro is on screen.
    outro_level: Option<usize>,
}

impl GameController {
    pub fn new(
        mut factory: LevelFactory,
        validator: AnswerValidator,
        scheduler: Scheduler,
    ) -> Result<Self, ContentError> {
        let levels = factory.build()?;
        let first = levels
            .first()
            .ok_or_else(|| ContentError::NoLevels(Default::default()))?;
        let state = GameState::new(&first.id);

        Ok(Self {
            factory,
            levels,
            level_index: 0,
            state,
            screen: Screen::Intro,
            scheduler,
            validator,
            transition_pending: false,
            outro_level: None,
        })
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn level_index(&self) -> usize {
        self.level_index
    }

    pub fn total_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn current_level(&self) -> &Level {
        &self.levels[self.level_index]
    }

    /// `None` between finishing a level and the next one starting.
    pub fn current_puzzle(&self) -> Option<&Puzzle> {
        self.current_level()
            .puzzles
            .get(self.state.current_puzzle_index)
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_loading
    }

    /// Narrative for the story panel on screen.
    pub fn story_text(&self) -> Option<&str> {
        match self.screen {
            Screen::StoryIntro => self.current_level().story_intro.as_deref(),
            Screen::StoryOutro => {
                let level = self.outro_level.unwrap_or(self.level_index);
                self.levels.get(level)?.story_outro.as_deref()
            }
            Screen::Intro | Screen::Playing | Screen::Complete => None,
        }
    }

    pub fn start_game(&mut self) {
        if self.screen != Screen::Intro {
            debug!("start_game ignored on {:?}", self.screen);
            return;
        }
        self.screen = self.entry_screen();
        info!("game started on {:?}", self.screen);
    }

    pub fn continue_from_story_intro(&mut self) {
        if self.screen != Screen::StoryIntro {
            debug!("continue_from_story_intro ignored on {:?}", self.screen);
            return;
        }
        self.screen = Screen::Playing;
    }

    pub fn continue_from_story_outro(&mut self) {
        if self.screen != Screen::StoryOutro || self.transition_pending {
            debug!("continue_from_story_outro ignored on {:?}", self.screen);
            return;
        }
        self.advance_to_next_level();
    }

    /// Records `puzzle_id` as solved and finishes the level when it was the
    /// last one. Ids that are blank, already solved, or not the puzzle on
    /// screen are logged and ignored.
    pub fn handle_puzzle_solved(&mut self, puzzle_id: &str) {
        if puzzle_id.trim().is_empty() {
            error!("solve request without a puzzle id");
            return;
        }
        let Some(current) = self.current_puzzle() else {
            error!("solve request for {puzzle_id} with no active puzzle");
            return;
        };
        if current.id != puzzle_id {
            error!("solve request for {puzzle_id} but {} is active", current.id);
            return;
        }
        if self.state.is_completed(puzzle_id) {
            warn!("{puzzle_id} is already solved");
            return;
        }

        self.state.completed_puzzles.push(puzzle_id.to_string());
        self.state.current_puzzle_index += 1;
        info!(
            "solved {puzzle_id} ({}/{} in {})",
            self.state.current_puzzle_index,
            self.current_level().puzzles.len(),
            self.current_level().id
        );

        if self.state.current_puzzle_index >= self.current_level().puzzles.len() {
            self.transition_pending = true;
            if self.current_level().story_outro.is_some() {
                self.outro_level = Some(self.level_index);
                self.scheduler
                    .schedule(SCREEN_DELAY, Transition::Show(Screen::StoryOutro));
            } else {
                self.scheduler
                    .schedule(ADVANCE_DELAY, Transition::AdvanceLevel);
            }
        }
    }

    pub fn advance_to_next_level(&mut self) {
        self.transition_pending = true;
        if self.level_index + 1 < self.levels.len() {
            self.level_index += 1;
            self.state.current_level_id = self.current_level().id.clone();
            self.state.current_puzzle_index = 0;
            info!("advanced to level {}", self.current_level().id);

            let next = self.entry_screen();
            self.scheduler.schedule(SCREEN_DELAY, Transition::Show(next));
        } else {
            info!("last level finished");
            self.scheduler
                .schedule(COMPLETE_DELAY, Transition::Show(Screen::Complete));
        }
    }

    /// No cap here; presenters stop offering hints once all are shown.
    pub fn handle_hint_request(&mut self, puzzle_id: &str) {
        let used = self
            .state
            .hints_used
            .entry(puzzle_id.to_string())
            .or_insert(0);
        *used += 1;
        debug!("hint {used} requested for {puzzle_id}");
    }

    /// Hints used on the puzzle on screen.
    pub fn hints_used(&self) -> usize {
        self.current_puzzle()
            .map(|p| self.state.hints_for(&p.id))
            .unwrap_or(0)
    }

    /// Starts validating `submission` against the puzzle on screen. The
    /// verdict arrives later as a [`GameEvent::Verdict`].
    pub fn submit_answer(&mut self, submission: Submission) -> Result<(), SubmitError> {
        if self.screen != Screen::Playing {
            return Err(SubmitError::NotPlaying);
        }
        if let Submission::Text(text) = &submission {
            if !is_valid_input(text) {
                return Err(SubmitError::Empty);
            }
        }
        if self.state.is_loading {
            return Err(SubmitError::InFlight);
        }
        if self.transition_pending {
            return Err(SubmitError::Transitioning);
        }
        let puzzle = self
            .current_puzzle()
            .ok_or(SubmitError::NoActivePuzzle)?
            .clone();

        debug!("checking answer for {}", puzzle.id);
        self.state.is_loading = true;
        self.state.error = None;
        self.scheduler
            .spawn_validation(self.validator.clone(), puzzle, submission);
        Ok(())
    }

    /// Applies an event from the scheduler. Events from before the last
    /// restart are dropped.
    pub fn handle_event(&mut self, event: GameEvent) -> Option<Outcome> {
        if !self.scheduler.is_current(&event) {
            debug!("dropping stale event {event:?}");
            return None;
        }
        match event {
            GameEvent::Transition { transition, .. } => {
                self.apply_transition(transition);
                None
            }
            GameEvent::Verdict {
                puzzle_id, verdict, ..
            } => self.apply_verdict(puzzle_id, verdict),
        }
    }

    pub fn restart_game(&mut self) {
        self.scheduler.cancel_all();
        match self.factory.build() {
            Ok(levels) if !levels.is_empty() => self.levels = levels,
            Ok(_) => error!("level factory produced no levels; keeping the previous draw"),
            Err(e) => error!("could not rebuild levels ({e}); keeping the previous draw"),
        }
        self.level_index = 0;
        self.state = GameState::new(&self.levels[0].id);
        self.screen = Screen::Intro;
        self.transition_pending = false;
        self.outro_level = None;
        info!("game restarted");
    }

    fn apply_transition(&mut self, transition: Transition) {
        match transition {
            Transition::Show(screen) => {
                debug!("screen {:?} -> {:?}", self.screen, screen);
                self.screen = screen;
                if screen != Screen::StoryOutro {
                    self.outro_level = None;
                }
                self.transition_pending = false;
            }
            Transition::AdvanceLevel => self.advance_to_next_level(),
        }
    }

    fn apply_verdict(&mut self, puzzle_id: String, verdict: Verdict) -> Option<Outcome> {
        self.state.is_loading = false;
        if self.current_puzzle().map(|p| p.id.as_str()) != Some(puzzle_id.as_str()) {
            debug!("verdict for {puzzle_id} arrived after it left the screen");
            return None;
        }

        if verdict.correct {
            self.handle_puzzle_solved(&puzzle_id);
            Some(Outcome::Solved { puzzle_id, verdict })
        } else {
            self.state.error = Some("Incorrect".to_string());
            Some(Outcome::Rejected { puzzle_id, verdict })
        }
    }

    fn entry_screen(&self) -> Screen {
        if self.current_level().story_intro.is_some() {
            Screen::StoryIntro
        } else {
            Screen::Playing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::Catalog;
    use crate::validation::UnavailableModel;
    use std::sync::Arc;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn level(id: &str, intro: bool, outro: bool, puzzles: &[&str]) -> String {
        let mut text = format!(
            "[meta]\nid = \"{id}\"\nname = \"{id}\"\ndescription = \"{id}\"\n\n[story]\n"
        );
        if intro {
            text.push_str(&format!("intro = \"Entering {id}.\"\n"));
        }
        if outro {
            text.push_str(&format!("outro = \"Leaving {id}.\"\n"));
        }
        for p in puzzles {
            text.push_str(&format!(
                "\n[[puzzle]]\nid = \"{p}\"\nkind = \"text\"\nquestion = \"?\"\nanswer = \"{p}\"\nhints = [\"h1\", \"h2\"]\n"
            ));
        }
        text
    }

    fn controller(levels: &[String]) -> (GameController, UnboundedReceiver<GameEvent>) {
        let sources: Vec<&str> = levels.iter().map(String::as_str).collect();
        let catalog = Catalog::parse(&sources, "").unwrap();
        let (scheduler, rx) = Scheduler::channel();
        let validator = AnswerValidator::new(Arc::new(UnavailableModel));
        let controller =
            GameController::new(LevelFactory::seeded(catalog, 0), validator, scheduler).unwrap();
        (controller, rx)
    }

    async fn settle(controller: &mut GameController, rx: &mut UnboundedReceiver<GameEvent>) {
        let event = rx.recv().await.unwrap();
        controller.handle_event(event);
    }

    #[tokio::test(start_paused = true)]
    async fn start_goes_to_intro_story_when_present() {
        let (mut c, _rx) = controller(&[level("a", true, false, &["a1"])]);
        c.start_game();
        assert_eq!(c.screen(), Screen::StoryIntro);
        assert_eq!(c.story_text(), Some("Entering a."));
        c.continue_from_story_intro();
        assert_eq!(c.screen(), Screen::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn start_skips_missing_intro() {
        let (mut c, _rx) = controller(&[level("a", false, false, &["a1"])]);
        c.start_game();
        assert_eq!(c.screen(), Screen::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn solving_a_level_without_outro_advances_after_settling() {
        let (mut c, mut rx) = controller(&[
            level("a", false, false, &["a1"]),
            level("b", true, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");
        assert_eq!(c.state().current_puzzle_index, 1);
        assert_eq!(c.level_index(), 0);

        // AdvanceLevel
        settle(&mut c, &mut rx).await;
        assert_eq!(c.level_index(), 1);
        assert_eq!(c.state().current_level_id, "b");
        assert_eq!(c.state().current_puzzle_index, 0);

        // Show(StoryIntro)
        settle(&mut c, &mut rx).await;
        assert_eq!(c.screen(), Screen::StoryIntro);
    }

    #[tokio::test(start_paused = true)]
    async fn next_level_without_intro_goes_straight_to_playing() {
        let (mut c, mut rx) = controller(&[
            level("a", false, false, &["a1"]),
            level("b", false, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");
        settle(&mut c, &mut rx).await;
        settle(&mut c, &mut rx).await;
        assert_eq!(c.screen(), Screen::Playing);
        assert_eq!(c.current_puzzle().unwrap().id, "b1");
    }

    #[tokio::test(start_paused = true)]
    async fn outro_shows_before_advancing() {
        let (mut c, mut rx) = controller(&[
            level("a", false, true, &["a1", "a2"]),
            level("b", false, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");
        assert_eq!(c.state().current_puzzle_index, 1);
        assert!(rx.try_recv().is_err());

        c.handle_puzzle_solved("a2");
        settle(&mut c, &mut rx).await;
        assert_eq!(c.screen(), Screen::StoryOutro);
        assert_eq!(c.story_text(), Some("Leaving a."));

        c.continue_from_story_outro();
        assert_eq!(c.level_index(), 1);
        // Still the finished level's outro until the deferred change lands.
        assert_eq!(c.story_text(), Some("Leaving a."));
        settle(&mut c, &mut rx).await;
        assert_eq!(c.screen(), Screen::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_continue_does_not_skip_levels() {
        let (mut c, mut rx) = controller(&[
            level("a", false, true, &["a1"]),
            level("b", false, false, &["b1"]),
            level("c", false, false, &["c1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");
        settle(&mut c, &mut rx).await;

        c.continue_from_story_outro();
        c.continue_from_story_outro();
        assert_eq!(c.level_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn advancing_from_the_last_level_completes() {
        let (mut c, mut rx) = controller(&[level("only", false, false, &["o1"])]);
        c.start_game();
        c.advance_to_next_level();
        settle(&mut c, &mut rx).await;
        assert_eq!(c.screen(), Screen::Complete);
        assert_eq!(c.level_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_and_repeated_solves_are_ignored() {
        let (mut c, _rx) = controller(&[level("a", false, false, &["a1", "a2"])]);
        c.start_game();
        let before = c.state().clone();

        c.handle_puzzle_solved("");
        c.handle_puzzle_solved("a2");
        c.handle_puzzle_solved("nope");
        assert_eq!(c.state(), &before);

        c.handle_puzzle_solved("a1");
        c.handle_puzzle_solved("a1");
        assert_eq!(c.state().completed_puzzles, vec!["a1".to_string()]);
        assert_eq!(c.state().current_puzzle_index, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hint_counter_is_uncapped_but_rendering_clamps() {
        let (mut c, _rx) = controller(&[level("a", false, false, &["a1"])]);
        c.start_game();
        for _ in 0..3 {
            c.handle_hint_request("a1");
        }
        assert_eq!(c.state().hints_for("a1"), 3);
        assert_eq!(c.hints_used(), 3);
        let puzzle = c.current_puzzle().unwrap();
        assert_eq!(puzzle.revealed_hints(c.hints_used()).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_clears_progress_and_cancels_pending_transitions() {
        let (mut c, mut rx) = controller(&[
            level("a", false, false, &["a1"]),
            level("b", false, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_hint_request("a1");
        c.handle_puzzle_solved("a1");

        c.restart_game();
        assert_eq!(c.screen(), Screen::Intro);
        assert_eq!(c.level_index(), 0);
        assert_eq!(c.state(), &GameState::new("a"));

        tokio::time::sleep(COMPLETE_DELAY * 4).await;
        while let Ok(event) = rx.try_recv() {
            assert!(c.handle_event(event).is_none());
        }
        assert_eq!(c.screen(), Screen::Intro);
        assert_eq!(c.level_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_event_from_before_restart_is_dropped() {
        let (mut c, mut rx) = controller(&[
            level("a", false, false, &["a1"]),
            level("b", false, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");
        let stale = rx.recv().await.unwrap();

        c.restart_game();
        assert!(c.handle_event(stale).is_none());
        assert_eq!(c.level_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn submissions_are_guarded() {
        let (mut c, mut rx) = controller(&[level("a", false, false, &["a1", "a2"])]);
        assert_eq!(
            c.submit_answer(Submission::Text("a1".to_string())),
            Err(SubmitError::NotPlaying)
        );

        c.start_game();
        assert_eq!(
            c.submit_answer(Submission::Text("   ".to_string())),
            Err(SubmitError::Empty)
        );
        assert!(!c.is_processing());

        c.submit_answer(Submission::Text("wrong".to_string())).unwrap();
        assert!(c.is_processing());
        assert_eq!(
            c.submit_answer(Submission::Text("a1".to_string())),
            Err(SubmitError::InFlight)
        );

        let event = rx.recv().await.unwrap();
        let outcome = c.handle_event(event).unwrap();
        assert!(matches!(outcome, Outcome::Rejected { ref puzzle_id, .. } if puzzle_id == "a1"));
        assert!(!c.is_processing());
        assert_eq!(c.state().error.as_deref(), Some("Incorrect"));

        c.submit_answer(Submission::Text("A1!".to_string())).unwrap();
        let event = rx.recv().await.unwrap();
        let outcome = c.handle_event(event).unwrap();
        assert!(matches!(outcome, Outcome::Solved { .. }));
        assert_eq!(c.current_puzzle().unwrap().id, "a2");
        assert_eq!(c.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn answers_wait_for_the_next_level_to_appear() {
        let (mut c, mut rx) = controller(&[
            level("a", false, false, &["a1"]),
            level("b", true, false, &["b1"]),
        ]);
        c.start_game();
        c.handle_puzzle_solved("a1");

        // AdvanceLevel
        settle(&mut c, &mut rx).await;
        assert_eq!(c.level_index(), 1);
        assert_eq!(c.screen(), Screen::Playing);
        assert_eq!(
            c.submit_answer(Submission::Text("b1".to_string())),
            Err(SubmitError::Transitioning)
        );
        assert!(!c.is_processing());

        // Show(StoryIntro)
        settle(&mut c, &mut rx).await;
        c.continue_from_story_intro();
        c.submit_answer(Submission::Text("b1".to_string())).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_discards_in_flight_verdicts() {
        let (mut c, mut rx) = controller(&[level("a", false, false, &["a1"])]);
        c.start_game();
        c.submit_answer(Submission::Text("a1".to_string())).unwrap();
        c.restart_game();
        assert!(!c.is_processing());

        tokio::time::sleep(COMPLETE_DELAY).await;
        while let Ok(event) = rx.try_recv() {
            assert!(c.handle_event(event).is_none());
        }
        assert!(c.state().completed_puzzles.is_empty());
    }
}
