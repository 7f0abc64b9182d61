//! Language-model port used by the answer validator.

use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("model request failed: {0}")]
    RequestFailed(String),
    #[error("invalid model response: {0}")]
    InvalidResponse(String),
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
    #[error("no model is available")]
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// One priming turn sent ahead of the prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub history: Vec<Turn>,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// Free-text generation. Callers interpret the returned text themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<String, LlmError>;
}

/// Stands in when no API key is configured; every call fails, so the
/// validator always takes its fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableModel;

#[async_trait]
impl LanguageModel for UnavailableModel {
    async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
        Err(LlmError::Unavailable)
    }
}
