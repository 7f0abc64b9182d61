use crate::puzzle::{CreativeConfig, Submission};
use crate::validation::is_valid_input;

pub const MAX_ATTEMPTS: u32 = 2;

pub const FAILURE_MESSAGE: &str = "CRITICAL ERROR: Connection to Josh lost. Mission failed.";

/// Free-text survival plan with a health bar and a hard attempt limit.
#[derive(Debug, Clone, PartialEq)]
pub struct CreativeEncounter {
    config: CreativeConfig,
    health: u32,
    attempts: u32,
    show_items: bool,
    feedback: Option<&'static str>,
}

impl CreativeEncounter {
    pub fn new(config: CreativeConfig) -> Self {
        let health = config.health;
        Self {
            config,
            health,
            attempts: 0,
            show_items: false,
            feedback: None,
        }
    }

    pub fn scenario(&self) -> &str {
        &self.config.scenario
    }

    pub fn items(&self) -> &[String] {
        &self.config.available_items
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.config.health
    }

    pub fn attempts_remaining(&self) -> u32 {
        MAX_ATTEMPTS.saturating_sub(self.attempts)
    }

    pub fn show_items(&self) -> bool {
        self.show_items
    }

    pub fn toggle_items(&mut self) {
        self.show_items = !self.show_items;
    }

    pub fn feedback(&self) -> Option<&'static str> {
        if self.is_lost() {
            Some(FAILURE_MESSAGE)
        } else {
            self.feedback
        }
    }

    /// Out of attempts with no health left.
    pub fn is_lost(&self) -> bool {
        self.attempts >= MAX_ATTEMPTS && self.health == 0
    }

    /// Damage per rejected plan; two rejections empty the bar.
    fn damage(&self) -> u32 {
        self.config.health.div_ceil(MAX_ATTEMPTS)
    }

    pub fn submit(&mut self, strategy: &str, processing: bool) -> Option<Submission> {
        if processing || !is_valid_input(strategy) || self.attempts >= MAX_ATTEMPTS {
            return None;
        }
        self.attempts += 1;
        self.feedback = Some("Transmitting your plan to Josh...");
        Some(Submission::Text(strategy.trim().to_string()))
    }

    pub fn on_verdict(&mut self, correct: bool) {
        if correct {
            self.feedback = Some("The plan worked. Josh is still breathing.");
            return;
        }
        self.health = self.health.saturating_sub(self.damage());
        self.feedback = Some("The creature shrugs it off. Josh is hurt!");
    }

    /// Appends `item` to the plan unless it is already mentioned.
    pub fn add_item(strategy: &str, item: &str) -> String {
        if strategy.contains(item) {
            return strategy.to_string();
        }
        if strategy.is_empty() {
            return item.to_string();
        }
        let separator = match strategy.chars().last() {
            Some('.' | ',' | ' ') => " ",
            _ => ". ",
        };
        format!("{strategy}{separator}{item}")
    }
}
