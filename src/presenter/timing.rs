use crate::puzzle::Submission;

pub const MIN_POSITION: f32 = 0.0;
pub const MAX_POSITION: f32 = 100.0;
pub const CENTER: f32 = 50.0;
/// Full width of the target window, centred on [`CENTER`].
pub const WINDOW: f32 = 10.0;
pub const BASE_SPEED: f32 = 2.0;
pub const SPEED_STEP: f32 = 0.5;
pub const MAX_SPEED: f32 = 5.0;
/// Ticks the indicator stays frozen after a miss.
pub const MISS_PAUSE_TICKS: u32 = 40;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Motion {
    Moving,
    Paused { ticks_left: u32 },
    Locked,
}

/// Indicator bouncing across the coupling track.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentGauge {
    position: f32,
    direction: f32,
    speed: f32,
    attempts: u32,
    misses: u32,
    motion: Motion,
    last_stop: Option<f32>,
    feedback: Option<&'static str>,
}

impl Default for AlignmentGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignmentGauge {
    pub fn new() -> Self {
        Self {
            position: MIN_POSITION,
            direction: 1.0,
            speed: BASE_SPEED,
            attempts: 0,
            misses: 0,
            motion: Motion::Moving,
            last_stop: None,
            feedback: None,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_stop(&self) -> Option<f32> {
        self.last_stop
    }

    pub fn feedback(&self) -> Option<&'static str> {
        self.feedback
    }

    pub fn is_moving(&self) -> bool {
        self.motion == Motion::Moving
    }

    pub fn in_window(position: f32) -> bool {
        (position - CENTER).abs() <= WINDOW / 2.0
    }

    pub fn tick(&mut self) {
        match self.motion {
            Motion::Moving => {
                let mut next = self.position + self.direction * self.speed;
                if next >= MAX_POSITION {
                    next = MAX_POSITION;
                    self.direction = -1.0;
                } else if next <= MIN_POSITION {
                    next = MIN_POSITION;
                    self.direction = 1.0;
                }
                self.position = next;
            }
            Motion::Paused { ticks_left } if ticks_left > 1 => {
                self.motion = Motion::Paused {
                    ticks_left: ticks_left - 1,
                };
            }
            Motion::Paused { .. } => {
                self.motion = Motion::Moving;
                self.last_stop = None;
                self.feedback = None;
            }
            Motion::Locked => {}
        }
    }

    /// Stops the indicator. Inside the window this yields
    /// [`Submission::Aligned`]; outside it the indicator pauses, then resumes
    /// faster.
    pub fn stop(&mut self, processing: bool) -> Option<Submission> {
        if processing || self.motion != Motion::Moving {
            return None;
        }
        self.attempts += 1;
        self.last_stop = Some(self.position);

        if Self::in_window(self.position) {
            self.motion = Motion::Locked;
            self.feedback = Some("Power coupling aligned successfully!");
            return Some(Submission::Aligned);
        }

        let distance = (self.position - CENTER).abs();
        self.feedback = Some(if distance < 15.0 {
            "Close! Just a little adjustment needed."
        } else if distance < 25.0 {
            "Not quite aligned. Try again."
        } else {
            "Alignment failed. Recalibrating..."
        });
        self.misses += 1;
        self.speed = (BASE_SPEED + SPEED_STEP * self.misses as f32).min(MAX_SPEED);
        self.motion = Motion::Paused {
            ticks_left: MISS_PAUSE_TICKS,
        };
        None
    }

    /// Frees a locked gauge when the alignment was not accepted.
    pub fn unlock(&mut self) {
        if self.motion == Motion::Locked {
            self.motion = Motion::Moving;
            self.feedback = None;
        }
    }
}
