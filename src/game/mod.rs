pub mod controller;
pub mod scheduler;
pub mod state;

pub use controller::{GameController, Outcome, SubmitError};
pub use scheduler::{GameEvent, Scheduler, Transition};
pub use state::{GameState, Screen};
