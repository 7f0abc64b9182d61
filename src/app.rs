use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, info};
use rand::rngs::StdRng;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};
use std::time::{Duration, Instant};
use tui_textarea::{CursorMove, TextArea};

use derelict::game::{GameController, GameEvent, Outcome, Screen};
use derelict::presenter::creative::FAILURE_MESSAGE;
use derelict::presenter::{can_request_hint, CreativeEncounter, Presenter};
use derelict::puzzle::Submission;

pub const INCORRECT_FLASH: Duration = Duration::from_secs(2);

/// Keys that add items from the creative item list, in list order.
const ITEM_KEYS: &str = "1234567890abcdefghijklmnopqrstuvwxyz";

pub fn item_key(index: usize) -> Option<char> {
    ITEM_KEYS.chars().nth(index)
}

fn item_index(key: char) -> Option<usize> {
    ITEM_KEYS.find(key.to_ascii_lowercase())
}

pub enum MenuOption {
    NewMission,
    Quit,
}

impl MenuOption {
    fn next(&self) -> Self {
        match self {
            MenuOption::NewMission => MenuOption::Quit,
            MenuOption::Quit => MenuOption::NewMission,
        }
    }
}

pub struct App<'a> {
    pub controller: GameController,
    pub presenter: Option<Presenter>,
    /// Puzzle the presenter was built for.
    presenter_puzzle: Option<String>,
    pub input: TextArea<'a>,
    pub message: String,
    pub message_style: Style,
    incorrect_until: Option<Instant>,
    pub command_mode: bool,
    pub command_buffer: String,
    escape_armed: bool,
    pub menu_selection: MenuOption,
    rng: StdRng,
}

fn answer_box<'a>(title: &str, placeholder: &str, text: &str) -> TextArea<'a> {
    let mut input = TextArea::from([text.to_string()]);
    input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {title} [ENTER] ")),
    );
    input.set_placeholder_text(placeholder.to_string());
    input.set_cursor_line_style(Style::default());
    input.move_cursor(CursorMove::End);
    input
}

fn input_box<'a>(presenter: &Presenter, text: &str) -> TextArea<'a> {
    match presenter {
        Presenter::Entry(entry) => answer_box(entry.action, entry.placeholder, text),
        Presenter::Creative(_) => {
            answer_box("Transmit Plan", "Describe how Josh survives...", text)
        }
        Presenter::Pattern(_) | Presenter::Timing(_) => answer_box("Input", "", text),
    }
}

fn input_text(input: &TextArea) -> String {
    input.lines().join(" ")
}

fn instructions(presenter: &Presenter) -> &'static str {
    match presenter {
        Presenter::Entry(_) => "Type your answer and press ENTER. F1 reveals a hint.",
        Presenter::Pattern(_) => "Press the symbols in order. BACKSPACE clears. F1 reveals a hint.",
        Presenter::Timing(_) => "Press SPACE when the indicator is inside the green zone.",
        Presenter::Creative(_) => {
            "Describe Josh's plan and press ENTER. TAB shows the items he can use."
        }
    }
}

impl<'a> App<'a> {
    pub fn new(controller: GameController, rng: StdRng) -> Self {
        App {
            controller,
            presenter: None,
            presenter_puzzle: None,
            input: answer_box("Answer", "", ""),
            message: String::from("Awaiting orders..."),
            message_style: Style::default().fg(Color::Yellow),
            incorrect_until: None,
            command_mode: false,
            command_buffer: String::new(),
            escape_armed: false,
            menu_selection: MenuOption::NewMission,
            rng,
        }
    }

    fn set_message(&mut self, message: impl Into<String>, color: Color) {
        self.message = message.into();
        self.message_style = Style::default().fg(color);
    }

    /// Whether the "Incorrect" flash is still showing.
    pub fn flash_incorrect(&self) -> bool {
        self.incorrect_until.is_some() && self.controller.state().error.is_some()
    }

    /// Builds a fresh presenter when a new puzzle comes on screen.
    pub fn sync_presenter(&mut self) {
        if self.controller.screen() != Screen::Playing {
            return;
        }
        let Some(puzzle) = self.controller.current_puzzle() else {
            return;
        };
        if self.presenter_puzzle.as_deref() == Some(puzzle.id.as_str()) {
            return;
        }

        let presenter = Presenter::for_puzzle(puzzle, &mut self.rng);
        debug!("presenting {} as {}", puzzle.id, puzzle.type_label());
        self.presenter_puzzle = Some(puzzle.id.clone());
        self.input = input_box(&presenter, "");
        self.incorrect_until = None;
        self.set_message(instructions(&presenter), Color::Yellow);
        self.presenter = Some(presenter);
    }

    pub fn tick(&mut self) {
        if self.controller.screen() == Screen::Playing {
            if let Some(presenter) = self.presenter.as_mut() {
                presenter.tick();
            }
        }
        if self.incorrect_until.is_some_and(|until| Instant::now() >= until) {
            self.incorrect_until = None;
        }
    }

    pub fn on_event(&mut self, event: GameEvent) {
        let Some(outcome) = self.controller.handle_event(event) else {
            return;
        };
        let correct = matches!(outcome, Outcome::Solved { .. });
        if let Some(presenter) = self.presenter.as_mut() {
            presenter.on_verdict(correct);
        }

        match outcome {
            Outcome::Solved { puzzle_id, verdict } => {
                info!("{puzzle_id} solved ({:?})", verdict.judged_by);
                self.incorrect_until = None;
                self.set_message("Correct! Systems responding...", Color::Green);
            }
            Outcome::Rejected { puzzle_id, verdict } => {
                debug!("{puzzle_id} rejected ({:?})", verdict.judged_by);
                self.incorrect_until = Some(Instant::now() + INCORRECT_FLASH);
                if self.presenter.as_ref().is_some_and(Presenter::is_terminal) {
                    self.message = format!("{FAILURE_MESSAGE}\n\nPress ENTER or type :restart to try again.");
                    self.message_style = Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD);
                } else {
                    self.set_message("Incorrect. Try again.", Color::Red);
                }
            }
        }
    }

    pub fn restart(&mut self) {
        self.controller.restart_game();
        self.presenter = None;
        self.presenter_puzzle = None;
        self.incorrect_until = None;
        self.command_mode = false;
        self.command_buffer.clear();
        self.escape_armed = false;
        self.menu_selection = MenuOption::NewMission;
        self.set_message("Awaiting orders...", Color::Yellow);
    }

    /// Returns `true` when the player asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.controller.screen() {
            Screen::Intro => self.title_key(key),
            Screen::StoryIntro => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.controller.continue_from_story_intro();
                }
                false
            }
            Screen::StoryOutro => {
                if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                    self.controller.continue_from_story_outro();
                }
                false
            }
            Screen::Complete => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => {
                    self.restart();
                    false
                }
                KeyCode::Char('q') | KeyCode::Esc => true,
                _ => false,
            },
            Screen::Playing => self.playing_key(key),
        }
    }

    fn title_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('k') => {
                self.menu_selection = self.menu_selection.next();
                false
            }
            KeyCode::Enter => match self.menu_selection {
                MenuOption::NewMission => {
                    self.controller.start_game();
                    false
                }
                MenuOption::Quit => true,
            },
            KeyCode::Char('q') => true,
            _ => false,
        }
    }

    fn playing_key(&mut self, key: KeyEvent) -> bool {
        if self.command_mode {
            return self.command_key(key);
        }
        let takes_text = self.presenter.as_ref().is_some_and(Presenter::takes_text);
        let armed = std::mem::take(&mut self.escape_armed);
        if key.code == KeyCode::Char(':') && (armed || !takes_text) {
            self.command_mode = true;
            self.command_buffer.clear();
            return false;
        }

        match key.code {
            KeyCode::Esc => {
                self.escape_armed = true;
                self.set_message("Type :q to quit, :help for commands", Color::DarkGray);
            }
            KeyCode::F(1) => self.request_hint(),
            _ => self.presenter_key(key),
        }
        false
    }

    fn command_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.command_mode = false;
                self.command_buffer.clear();
            }
            KeyCode::Enter => {
                let command = std::mem::take(&mut self.command_buffer);
                self.command_mode = false;
                match command.trim() {
                    "q" | "quit" => return true,
                    "restart" => self.restart(),
                    "hint" => self.request_hint(),
                    "help" => self.set_message(
                        "Commands: :q (quit), :restart (new mission), :hint (reveal a hint)",
                        Color::Cyan,
                    ),
                    "" => {}
                    other => self.set_message(format!("Unknown command: {other}"), Color::Red),
                }
            }
            KeyCode::Backspace => {
                self.command_buffer.pop();
                if self.command_buffer.is_empty() {
                    self.command_mode = false;
                }
            }
            KeyCode::Char(c) => self.command_buffer.push(c),
            _ => {}
        }
        false
    }

    fn request_hint(&mut self) {
        let processing = self.controller.is_processing();
        let used = self.controller.hints_used();
        let Some(puzzle) = self.controller.current_puzzle() else {
            return;
        };
        if !can_request_hint(puzzle, used, processing) {
            if processing {
                self.set_message("Hold on, still checking...", Color::DarkGray);
            } else {
                self.set_message("No more hints. You're on your own...", Color::DarkGray);
            }
            return;
        }

        let id = puzzle.id.clone();
        let hint = puzzle.hints.get(used).cloned().unwrap_or_default();
        self.controller.handle_hint_request(&id);
        self.set_message(format!("HINT: {hint}"), Color::Cyan);
    }

    fn presenter_key(&mut self, key: KeyEvent) {
        let processing = self.controller.is_processing();
        let mut restart = false;
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };

        let submission = match presenter {
            Presenter::Entry(entry) => match key.code {
                KeyCode::Enter => entry.submit(&input_text(&self.input)),
                _ => {
                    self.input.input(key);
                    None
                }
            },
            Presenter::Pattern(board) => match key.code {
                KeyCode::Char(c) => board.pick(c, processing),
                KeyCode::Backspace if !processing => {
                    board.reset();
                    None
                }
                _ => None,
            },
            Presenter::Timing(gauge) => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => gauge.stop(processing),
                _ => None,
            },
            Presenter::Creative(encounter) => match key.code {
                KeyCode::Tab => {
                    encounter.toggle_items();
                    None
                }
                KeyCode::Enter if encounter.is_lost() => {
                    restart = true;
                    None
                }
                _ if encounter.is_lost() => None,
                KeyCode::Enter => encounter.submit(&input_text(&self.input), processing),
                KeyCode::Char(c) if encounter.show_items() => {
                    if let Some(item) = item_index(c).and_then(|i| encounter.items().get(i)) {
                        let plan = CreativeEncounter::add_item(&input_text(&self.input), item);
                        self.input = answer_box("Transmit Plan", "", &plan);
                    }
                    None
                }
                _ => {
                    self.input.input(key);
                    None
                }
            },
        };

        if restart {
            self.restart();
        } else if let Some(submission) = submission {
            self.submit(submission);
        }
    }

    fn submit(&mut self, submission: Submission) {
        match self.controller.submit_answer(submission) {
            Ok(()) => self.set_message("Processing...", Color::Yellow),
            Err(e) => self.set_message(format!("Not sent: {e}"), Color::DarkGray),
        }
    }
}
