//! Game configuration.
//!
//! Read from an optional TOML file, then overridden by environment variables
//! and finally by command-line flags:
//!
//! ```toml
//! [game]
//! content_dir = "content"
//! seed = 42
//!
//! [ai]
//! enabled = true
//! base_url = "https://generativelanguage.googleapis.com"
//! default_model = "gemini-2.0-flash"
//! api_key_env = "GEMINI_API_KEY"
//! timeout_secs = 20
//!
//! [logging]
//! file = "derelict.log"
//! level = "info"
//! ```

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::validation::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::validation::{AnswerValidator, GeminiClient, LanguageModel, UnavailableModel};

pub const DEFAULT_CONFIG_FILE: &str = "derelict.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub game: GameConfig,
    pub ai: AiSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub content_dir: PathBuf,
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    pub base_url: String,
    pub default_model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub file: PathBuf,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("derelict.log"),
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.level).unwrap_or(log::LevelFilter::Info)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Missing file means defaults; a broken file is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("DERELICT_CONTENT_DIR") {
            self.game.content_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("DERELICT_AI_BASE_URL") {
            self.ai.base_url = url;
        }
        if let Some(model) = lookup("DERELICT_AI_MODEL") {
            self.ai.default_model = model;
        }
    }

    pub fn api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        lookup(&self.ai.api_key_env).filter(|key| !key.trim().is_empty())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_secs.max(1))
    }

    /// The Gemini client when enabled and a key is present, otherwise the
    /// unavailable model.
    pub fn language_model(&self, api_key: Option<String>) -> Arc<dyn LanguageModel> {
        if !self.ai.enabled {
            info!("model validation disabled; answers are compared exactly");
            return Arc::new(UnavailableModel);
        }
        match api_key {
            Some(key) => {
                info!("model validation via {}", self.ai.base_url);
                Arc::new(GeminiClient::new(&self.ai.base_url, &key, self.call_timeout()))
            }
            None => {
                warn!(
                    "{} is not set; model-judged puzzles fall back to exact comparison",
                    self.ai.api_key_env
                );
                Arc::new(UnavailableModel)
            }
        }
    }

    pub fn validator(&self, api_key: Option<String>) -> AnswerValidator {
        AnswerValidator::new(self.language_model(api_key))
            .with_default_model(self.ai.default_model.clone())
            .with_call_timeout(self.call_timeout())
    }
}
