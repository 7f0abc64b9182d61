//! Decides whether a submission solves a puzzle.
//!
//! Order of checks:
//!
//! 1. Presenter-reported successes (`PatternMatched` on pattern puzzles,
//!    `Aligned` on timing puzzles) are correct without further checking.
//! 2. Puzzles with model validation go to the model. Long answers to
//!    strategy puzzles get the lenient strategy rubric and fail open; all
//!    others get a yes/no riddle check that falls back to exact comparison.
//! 3. Everything else is a normalized exact comparison.
//!
//! Model failures never escape: each path maps them to its fallback, and the
//! whole evaluation runs in its own task so a panic lands on exact comparison.
//! Dropping the `validate` future aborts that task along with its model call.

use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::task::AbortOnDropHandle;

use super::gemini::DEFAULT_MODEL;
use super::model::{LanguageModel, LlmError, LlmRequest, Turn};
use super::normalize::{are_equivalent, normalize};
use crate::puzzle::types::{
    AiConfig, Puzzle, PuzzleKind, Submission, Validation, ALIGNED_ANSWER, MATCHED_ANSWER,
};

/// Strategy answers must be longer than this (in characters) to be judged
/// with the strategy rubric.
pub const STRATEGY_MIN_CHARS: usize = 100;

pub const RIDDLE_TEMPERATURE: f32 = 0.2;
pub const RIDDLE_MAX_TOKENS: u32 = 100;
pub const STRATEGY_TEMPERATURE: f32 = 0.7;
pub const STRATEGY_MAX_TOKENS: u32 = 200;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgedBy {
    /// A presenter already confirmed the solution.
    Presenter,
    Exact,
    Riddle,
    /// The riddle check failed to reach the model.
    RiddleFallback,
    Strategy,
    /// The strategy check failed to reach the model and accepted the plan.
    StrategyFailOpen,
    /// The evaluation task itself died.
    Guard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub judged_by: JudgedBy,
}

impl Verdict {
    fn new(correct: bool, judged_by: JudgedBy) -> Self {
        Self { correct, judged_by }
    }

    fn exact(submitted: &str, canonical: &str, judged_by: JudgedBy) -> Self {
        Self::new(are_equivalent(submitted, canonical), judged_by)
    }
}

#[derive(Clone)]
pub struct AnswerValidator {
    model: Arc<dyn LanguageModel>,
    default_model: String,
    call_timeout: Duration,
}

impl AnswerValidator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            default_model: DEFAULT_MODEL.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Never fails; see the module docs for the fallback rules.
    pub async fn validate(&self, puzzle: &Puzzle, submission: &Submission) -> Verdict {
        let this = self.clone();
        let owned_puzzle = puzzle.clone();
        let owned_submission = submission.clone();
        let task = AbortOnDropHandle::new(tokio::spawn(async move {
            this.evaluate(&owned_puzzle, &owned_submission).await
        }));

        let verdict = match task.await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("validation of {} aborted: {e}; comparing exactly", puzzle.id);
                Verdict::exact(submission.as_text(), &puzzle.answer, JudgedBy::Guard)
            }
        };
        info!(
            "{}: {} ({:?})",
            puzzle.id,
            if verdict.correct { "correct" } else { "incorrect" },
            verdict.judged_by
        );
        verdict
    }

    async fn evaluate(&self, puzzle: &Puzzle, submission: &Submission) -> Verdict {
        if let Some(verdict) = presenter_verdict(puzzle, submission) {
            return verdict;
        }

        let submitted = submission.as_text();
        match &puzzle.validation {
            Validation::Ai(config) => {
                if puzzle.expects_strategy() && submitted.chars().count() > STRATEGY_MIN_CHARS {
                    self.judge_strategy(submitted, config).await
                } else {
                    self.judge_riddle(submitted, &puzzle.answer, config).await
                }
            }
            Validation::Exact => {
                debug!(
                    "exact comparison {:?} vs {:?}",
                    normalize(submitted),
                    normalize(&puzzle.answer)
                );
                Verdict::exact(submitted, &puzzle.answer, JudgedBy::Exact)
            }
        }
    }

    async fn judge_riddle(&self, submitted: &str, canonical: &str, config: &AiConfig) -> Verdict {
        let request = LlmRequest {
            model: self.model_name(config),
            history: vec![
                Turn::user("You're going to help me validate answers to riddles and puzzles."),
                Turn::model(
                    "I'll help you validate answers to riddles and puzzles! What would you like me to check?",
                ),
            ],
            prompt: format!(
                "Given the riddle answer \"{canonical}\", is \"{submitted}\" a correct answer? \
                 Please respond with only \"yes\" or \"no\"."
            ),
            temperature: config.temperature.unwrap_or(RIDDLE_TEMPERATURE),
            max_output_tokens: RIDDLE_MAX_TOKENS,
        };

        match self.ask(request).await {
            Ok(reply) => {
                debug!("riddle judge replied {reply:?}");
                Verdict::new(reply.to_lowercase().contains("yes"), JudgedBy::Riddle)
            }
            Err(e) => {
                warn!("riddle judge unavailable ({e}); comparing exactly");
                Verdict::exact(submitted, canonical, JudgedBy::RiddleFallback)
            }
        }
    }

    async fn judge_strategy(&self, strategy: &str, config: &AiConfig) -> Verdict {
        let request = LlmRequest {
            model: self.model_name(config),
            history: vec![
                Turn::user("You're going to evaluate a survival strategy in a horror scenario."),
                Turn::model(
                    "I'll evaluate the survival strategy in a horror scenario. What scenario should I consider?",
                ),
                Turn::user(
                    "A person is trapped in a maintenance alcove on a spaceship. A hostile alien \
                     creature is breaking through the door. The person needs to use items in the \
                     room to survive.",
                ),
                Turn::model(
                    "I understand the scenario. Please share the strategy, and I'll evaluate \
                     whether it shows creative or logical problem-solving.",
                ),
            ],
            prompt: format!(
                "Here's the survival strategy: \"{strategy}\". Does this show ANY creative or \
                 logical problem-solving? Be lenient. Respond with \"YES\" unless the plan \
                 makes no attempt at all, in which case respond \"NO\"."
            ),
            temperature: config.temperature.unwrap_or(STRATEGY_TEMPERATURE),
            max_output_tokens: STRATEGY_MAX_TOKENS,
        };

        match self.ask(request).await {
            Ok(reply) => {
                debug!("strategy judge replied {reply:?}");
                Verdict::new(!reply.to_lowercase().contains("no"), JudgedBy::Strategy)
            }
            Err(e) => {
                warn!("strategy judge unavailable ({e}); accepting the plan");
                Verdict::new(true, JudgedBy::StrategyFailOpen)
            }
        }
    }

    async fn ask(&self, request: LlmRequest) -> Result<String, LlmError> {
        match tokio::time::timeout(self.call_timeout, self.model.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.call_timeout)),
        }
    }

    fn model_name(&self, config: &AiConfig) -> String {
        config
            .model
            .clone()
            .unwrap_or_else(|| self.default_model.clone())
    }
}

/// Successes already established by the pattern and timing presenters. The
/// bare strings are honoured too so hand-typed content keeps working.
fn presenter_verdict(puzzle: &Puzzle, submission: &Submission) -> Option<Verdict> {
    let confirmed = match (&puzzle.kind, submission) {
        (PuzzleKind::Pattern { .. }, Submission::PatternMatched) => true,
        (PuzzleKind::Pattern { .. }, Submission::Text(text)) => text == MATCHED_ANSWER,
        (PuzzleKind::Timing, Submission::Aligned) => true,
        (PuzzleKind::Timing, Submission::Text(text)) => text == ALIGNED_ANSWER,
        _ => false,
    };
    confirmed.then_some(Verdict::new(true, JudgedBy::Presenter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::types::CreativeConfig;
    use crate::validation::model::MockLanguageModel;

    fn ai() -> Validation {
        Validation::Ai(AiConfig {
            model: Some("gemini-2.0-flash".to_string()),
            temperature: Some(0.3),
        })
    }

    fn puzzle(kind: PuzzleKind, answer: &str, validation: Validation) -> Puzzle {
        Puzzle {
            id: "p1".to_string(),
            kind,
            question: "?".to_string(),
            answer: answer.to_string(),
            hints: vec![],
            validation,
        }
    }

    fn failing_model() -> MockLanguageModel {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .returning(|_| Err(LlmError::RequestFailed("quota exceeded".to_string())));
        model
    }

    fn replying(reply: &'static str) -> MockLanguageModel {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .times(1)
            .returning(move |_| Ok(reply.to_string()));
        model
    }

    fn untouched() -> MockLanguageModel {
        let mut model = MockLanguageModel::new();
        model.expect_generate().never();
        model
    }

    fn validator(model: MockLanguageModel) -> AnswerValidator {
        AnswerValidator::new(Arc::new(model))
    }

    fn long_plan() -> String {
        "Wedge the hydraulic piston against the door, then tape the frayed cables to the \
         shelf and flood the floor with coolant so the creature is shocked when it enters."
            .to_string()
    }

    #[tokio::test]
    async fn pattern_match_needs_no_model() {
        let v = validator(untouched());
        let p = puzzle(PuzzleKind::Pattern { length: 4 }, "whatever", ai());

        assert!(v.validate(&p, &Submission::PatternMatched).await.correct);
        let verdict = v.validate(&p, &Submission::Text("matched".to_string())).await;
        assert_eq!(verdict, Verdict::new(true, JudgedBy::Presenter));
    }

    #[tokio::test]
    async fn sentinels_on_other_kinds_are_plain_text() {
        let v = validator(untouched());
        let p = puzzle(PuzzleKind::Text, "echo", Validation::Exact);
        assert!(!v.validate(&p, &Submission::PatternMatched).await.correct);
        assert!(!v.validate(&p, &Submission::Aligned).await.correct);
    }

    #[tokio::test]
    async fn timing_alignment_is_accepted() {
        let v = validator(untouched());
        let p = puzzle(PuzzleKind::Timing, "aligned", Validation::Exact);
        assert_eq!(
            v.validate(&p, &Submission::Aligned).await,
            Verdict::new(true, JudgedBy::Presenter)
        );
    }

    #[tokio::test]
    async fn exact_comparison_without_ai() {
        let v = validator(untouched());
        let p = puzzle(PuzzleKind::Voice, "blue", Validation::Exact);
        assert!(v.validate(&p, &Submission::Text(" BLUE! ".to_string())).await.correct);
        assert!(!v.validate(&p, &Submission::Text("red".to_string())).await.correct);
    }

    #[tokio::test]
    async fn riddle_judge_sends_priming_and_reads_yes() {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .withf(|req| {
                req.model == "gemini-2.0-flash"
                    && req.history.len() == 2
                    && req.temperature == 0.3
                    && req.max_output_tokens == RIDDLE_MAX_TOKENS
                    && req.prompt.contains("\"map\"")
                    && req.prompt.contains("\"an atlas page\"")
            })
            .times(1)
            .returning(|_| Ok("Yes.".to_string()));

        let p = puzzle(PuzzleKind::Text, "map", ai());
        let verdict = validator(model)
            .validate(&p, &Submission::Text("an atlas page".to_string()))
            .await;
        assert_eq!(verdict, Verdict::new(true, JudgedBy::Riddle));
    }

    #[tokio::test]
    async fn riddle_judge_saying_no_rejects() {
        let p = puzzle(PuzzleKind::Text, "map", ai());
        let verdict = validator(replying("No"))
            .validate(&p, &Submission::Text("globe".to_string()))
            .await;
        assert_eq!(verdict, Verdict::new(false, JudgedBy::Riddle));
    }

    #[tokio::test]
    async fn riddle_failure_falls_back_to_normalized_match() {
        let p = puzzle(PuzzleKind::Text, "map", ai());
        let v = validator(failing_model());

        let verdict = v.validate(&p, &Submission::Text("Map.".to_string())).await;
        assert_eq!(verdict, Verdict::new(true, JudgedBy::RiddleFallback));

        let verdict = v.validate(&p, &Submission::Text("globe".to_string())).await;
        assert_eq!(verdict, Verdict::new(false, JudgedBy::RiddleFallback));
    }

    #[tokio::test]
    async fn creative_failure_fails_open() {
        let p = puzzle(PuzzleKind::Text, "survival", ai());
        let plan = long_plan();
        assert!(plan.chars().count() > STRATEGY_MIN_CHARS);

        let verdict = validator(failing_model())
            .validate(&p, &Submission::Text(plan))
            .await;
        assert_eq!(verdict, Verdict::new(true, JudgedBy::StrategyFailOpen));
    }

    #[tokio::test]
    async fn strategy_judge_rejects_on_no() {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .withf(|req| req.history.len() == 4 && req.max_output_tokens == STRATEGY_MAX_TOKENS)
            .times(1)
            .returning(|_| Ok("NO. Hiding under the shelf does nothing.".to_string()));

        let p = puzzle(
            PuzzleKind::Creative(CreativeConfig::default()),
            "survival",
            Validation::Ai(AiConfig::default()),
        );
        let verdict = validator(model)
            .validate(&p, &Submission::Text(long_plan()))
            .await;
        assert_eq!(verdict, Verdict::new(false, JudgedBy::Strategy));
    }

    #[tokio::test]
    async fn strategy_judge_uses_default_temperature_and_model() {
        let mut model = MockLanguageModel::new();
        model
            .expect_generate()
            .withf(|req| req.temperature == STRATEGY_TEMPERATURE && req.model == "house-model")
            .times(1)
            .returning(|_| Ok("YES".to_string()));

        let p = puzzle(
            PuzzleKind::Creative(CreativeConfig::default()),
            "survival",
            Validation::Ai(AiConfig::default()),
        );
        let verdict = validator(model)
            .with_default_model("house-model")
            .validate(&p, &Submission::Text(long_plan()))
            .await;
        assert!(verdict.correct);
    }

    #[tokio::test]
    async fn short_strategy_goes_to_the_riddle_judge() {
        let p = puzzle(
            PuzzleKind::Creative(CreativeConfig::default()),
            "survival",
            Validation::Ai(AiConfig::default()),
        );
        let verdict = validator(failing_model())
            .validate(&p, &Submission::Text("run".to_string()))
            .await;
        assert_eq!(verdict, Verdict::new(false, JudgedBy::RiddleFallback));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out_into_fallback() {
        struct Stalled;

        #[async_trait::async_trait]
        impl LanguageModel for Stalled {
            async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("yes".to_string())
            }
        }

        let v = AnswerValidator::new(Arc::new(Stalled)).with_call_timeout(Duration::from_secs(5));
        let p = puzzle(PuzzleKind::Text, "map", ai());
        let verdict = v.validate(&p, &Submission::Text("globe".to_string())).await;
        assert_eq!(verdict, Verdict::new(false, JudgedBy::RiddleFallback));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_validation_aborts_the_model_call() {
        use std::sync::atomic::{AtomicBool, Ordering};

        struct Slow(Arc<AtomicBool>);

        #[async_trait::async_trait]
        impl LanguageModel for Slow {
            async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                self.0.store(true, Ordering::SeqCst);
                Ok("yes".to_string())
            }
        }

        let finished = Arc::new(AtomicBool::new(false));
        let v = AnswerValidator::new(Arc::new(Slow(finished.clone())));
        let p = puzzle(PuzzleKind::Text, "map", ai());
        let submission = Submission::Text("globe".to_string());

        let cut_short =
            tokio::time::timeout(Duration::from_secs(1), v.validate(&p, &submission)).await;
        assert!(cut_short.is_err());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn panicking_model_is_caught_by_the_guard() {
        struct Exploding;

        #[async_trait::async_trait]
        impl LanguageModel for Exploding {
            async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
                panic!("model exploded");
            }
        }

        let p = puzzle(PuzzleKind::Text, "map", ai());
        let verdict = AnswerValidator::new(Arc::new(Exploding))
            .validate(&p, &Submission::Text("MAP".to_string()))
            .await;
        assert_eq!(verdict, Verdict::new(true, JudgedBy::Guard));
    }
}
