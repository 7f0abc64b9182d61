use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use derelict::game::{GameController, GameEvent, Outcome, Scheduler, Screen, SubmitError};
use derelict::puzzle::{load_catalog, LevelFactory, Puzzle, PuzzleKind, Submission};
use derelict::validation::{
    AnswerValidator, LanguageModel, LlmError, LlmRequest, UnavailableModel,
};
use tokio::sync::mpsc::UnboundedReceiver;

const PLAN: &str = "Tape the frayed cables to the shelf and wedge it into the doorway, then \
                    open the oxygen tank and spark the cables when the creature comes through.";

/// Replies with a fixed text and counts calls started and finished.
struct Scripted {
    reply: &'static str,
    delay: Duration,
    calls: AtomicUsize,
    finished: AtomicUsize,
}

impl Scripted {
    fn new(reply: &'static str) -> Arc<Self> {
        Self::slow(reply, Duration::ZERO)
    }

    fn slow(reply: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LanguageModel for Scripted {
    async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }
}

fn controller(model: Arc<dyn LanguageModel>) -> (GameController, UnboundedReceiver<GameEvent>) {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("content");
    let factory = LevelFactory::seeded(load_catalog(&dir).unwrap(), 7);
    let (scheduler, events) = Scheduler::channel();
    let controller = GameController::new(factory, AnswerValidator::new(model), scheduler).unwrap();
    (controller, events)
}

fn winning(puzzle: &Puzzle) -> Submission {
    match &puzzle.kind {
        PuzzleKind::Pattern { .. } => Submission::PatternMatched,
        PuzzleKind::Timing => Submission::Aligned,
        PuzzleKind::Creative(_) => Submission::Text(PLAN.to_string()),
        _ => Submission::Text(format!("  {}! ", puzzle.answer.to_uppercase())),
    }
}

async fn pump(
    controller: &mut GameController,
    events: &mut UnboundedReceiver<GameEvent>,
) -> Option<Outcome> {
    let event = events.recv().await.expect("scheduler is alive");
    controller.handle_event(event)
}

/// Plays every level with correct answers until the completion screen.
async fn play_through(controller: &mut GameController, events: &mut UnboundedReceiver<GameEvent>) {
    controller.start_game();
    for _ in 0..100 {
        match controller.screen() {
            Screen::StoryIntro => controller.continue_from_story_intro(),
            Screen::StoryOutro => {
                controller.continue_from_story_outro();
                pump(controller, events).await;
            }
            Screen::Playing => match controller.current_puzzle().cloned() {
                Some(puzzle) => {
                    controller.submit_answer(winning(&puzzle)).unwrap();
                    let outcome = pump(controller, events).await;
                    assert!(
                        matches!(&outcome, Some(Outcome::Solved { puzzle_id, .. }) if *puzzle_id == puzzle.id),
                        "{} not solved: {outcome:?}",
                        puzzle.id
                    );
                }
                None => {
                    pump(controller, events).await;
                }
            },
            Screen::Complete => return,
            Screen::Intro => panic!("fell back to the intro"),
        }
    }
    panic!("never reached the completion screen");
}

#[tokio::test(start_paused = true)]
async fn full_run_with_a_cooperative_model() {
    let model = Scripted::new("Yes.");
    let (mut game, mut events) = controller(model.clone());

    play_through(&mut game, &mut events).await;

    assert_eq!(game.state().completed_puzzles.len(), 7);
    assert_eq!(game.level_index(), 5);
    // riddle, sequence and survival plan go to the model
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn full_run_without_a_model() {
    let (mut game, mut events) = controller(Arc::new(UnavailableModel));
    play_through(&mut game, &mut events).await;
    assert_eq!(game.screen(), Screen::Complete);
}

#[tokio::test(start_paused = true)]
async fn restart_after_completion_starts_over() {
    let (mut game, mut events) = controller(Scripted::new("yes"));
    play_through(&mut game, &mut events).await;
    game.handle_hint_request("anything");

    game.restart_game();
    assert_eq!(game.screen(), Screen::Intro);
    assert_eq!(game.level_index(), 0);
    assert!(game.state().completed_puzzles.is_empty());
    assert_eq!(game.state().total_hints(), 0);

    play_through(&mut game, &mut events).await;
    assert_eq!(game.state().completed_puzzles.len(), 7);
}

#[tokio::test(start_paused = true)]
async fn a_skeptical_model_keeps_the_player_on_the_riddle() {
    let (mut game, mut events) = controller(Scripted::new("No, that is wrong."));
    game.start_game();
    game.continue_from_story_intro();
    let riddle = game.current_puzzle().cloned().unwrap();

    game.submit_answer(Submission::Text(riddle.answer.clone())).unwrap();
    assert_eq!(
        game.submit_answer(Submission::Text("again".into())),
        Err(SubmitError::InFlight)
    );
    let outcome = pump(&mut game, &mut events).await;

    assert!(matches!(outcome, Some(Outcome::Rejected { .. })));
    assert_eq!(game.current_puzzle().map(|p| p.id.as_str()), Some(riddle.id.as_str()));
    assert_eq!(game.state().error.as_deref(), Some("Incorrect"));
    assert!(!game.is_processing());
}

#[tokio::test(start_paused = true)]
async fn restart_discards_a_verdict_in_flight() {
    let (mut game, mut events) = controller(Scripted::slow("yes", Duration::from_secs(5)));
    game.start_game();
    game.continue_from_story_intro();
    let riddle = game.current_puzzle().cloned().unwrap();
    game.submit_answer(Submission::Text(riddle.answer)).unwrap();

    game.restart_game();
    let late = tokio::time::timeout(Duration::from_secs(30), events.recv()).await;
    if let Ok(Some(event)) = late {
        assert_eq!(game.handle_event(event), None);
    }

    assert_eq!(game.screen(), Screen::Intro);
    assert!(game.state().completed_puzzles.is_empty());
    assert!(!game.is_processing());
}

#[tokio::test(start_paused = true)]
async fn restart_aborts_the_model_call() {
    let model = Scripted::slow("yes", Duration::from_secs(5));
    let (mut game, _events) = controller(model.clone());
    game.start_game();
    game.continue_from_story_intro();
    game.submit_answer(Submission::Text("echo".to_string())).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);

    game.restart_game();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(model.finished.load(Ordering::SeqCst), 0);
}
