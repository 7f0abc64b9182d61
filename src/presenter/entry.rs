use crate::puzzle::Submission;
use crate::validation::is_valid_input;

/// Free-text answer box shared by text, image and voice puzzles.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerEntry {
    pub placeholder: &'static str,
    pub action: &'static str,
    pub instructions: &'static [&'static str],
    /// Scanner read-out for image puzzles.
    pub clue: Option<String>,
}

impl AnswerEntry {
    pub fn text() -> Self {
        Self {
            placeholder: "Enter your answer...",
            action: "Submit",
            instructions: &[],
            clue: None,
        }
    }

    pub fn image(clue: Option<String>) -> Self {
        Self {
            placeholder: "Enter security code...",
            action: "Verify Access",
            instructions: &[
                "Find the security code in the scanner read-out",
                "Enter the code below",
                "Press ENTER to verify access",
            ],
            clue,
        }
    }

    pub fn voice() -> Self {
        Self {
            placeholder: "Speak (type) your answer...",
            action: "Transmit",
            instructions: &[
                "Decode each 8-bit group into a letter",
                "Answer the decoded question",
            ],
            clue: None,
        }
    }

    pub fn submit(&self, raw: &str) -> Option<Submission> {
        is_valid_input(raw).then(|| Submission::Text(raw.trim().to_string()))
    }
}
