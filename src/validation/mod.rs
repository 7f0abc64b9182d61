pub mod gemini;
pub mod model;
pub mod normalize;
pub mod pipeline;

pub use gemini::GeminiClient;
pub use model::{LanguageModel, LlmError, LlmRequest, Role, Turn, UnavailableModel};
pub use normalize::{are_equivalent, is_valid_input, normalize};
pub use pipeline::{AnswerValidator, JudgedBy, Verdict};
