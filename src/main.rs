//! Terminal front end for the derelict escape game.
//!
//! `derelict [--config PATH] [--content DIR] [--seed N] [--no-ai] [-v...]`
mod app;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use derelict::config::{Config, LoggingConfig, DEFAULT_CONFIG_FILE};
use derelict::game::{GameController, GameEvent, Scheduler, Screen};
use derelict::puzzle::{load_catalog, LevelFactory};

use app::App;

/// Input poll timeout; also the animation tick.
const TICK_RATE: Duration = Duration::from_millis(30);

#[derive(Parser)]
#[command(name = "derelict")]
#[command(about = "Guide a stranded explorer off a derelict spaceship, one puzzle at a time")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory holding level_*.toml and pools.toml
    #[arg(long)]
    content: Option<PathBuf>,

    /// Seed for puzzle selection (same seed, same puzzles)
    #[arg(long)]
    seed: Option<u64>,

    /// Never call the language model; model-judged puzzles use their fallbacks
    #[arg(long)]
    no_ai: bool,

    /// Verbose logging (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env();
    if let Some(dir) = cli.content {
        config.game.content_dir = dir;
    }
    if cli.seed.is_some() {
        config.game.seed = cli.seed;
    }
    if cli.no_ai {
        config.ai.enabled = false;
    }
    init_logging(&config.logging, cli.verbose);

    let catalog = load_catalog(&config.game.content_dir).with_context(|| {
        format!(
            "loading levels from {}",
            config.game.content_dir.display()
        )
    })?;
    let (factory, rng) = match config.game.seed {
        Some(seed) => (
            LevelFactory::seeded(catalog, seed),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        ),
        None => (
            LevelFactory::new(catalog, StdRng::from_entropy()),
            StdRng::from_entropy(),
        ),
    };
    let validator = config.validator(config.api_key(|key| std::env::var(key).ok()));
    let (scheduler, events) = Scheduler::channel();
    let controller = GameController::new(factory, validator, scheduler)?;
    info!(
        "starting with {} levels from {}",
        controller.total_levels(),
        config.game.content_dir.display()
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller, rng);
    let result = run(&mut terminal, &mut app, events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if app.controller.screen() == Screen::Complete {
        println!("\nJosh made it off the derelict. Thanks for guiding him home.\n");
    }
    Ok(())
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: UnboundedReceiver<GameEvent>,
) -> Result<()> {
    loop {
        app.sync_presenter();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    info!("player quit");
                    return Ok(());
                }
            }
        }

        app.tick();
        while let Ok(event) = events.try_recv() {
            app.on_event(event);
        }
    }
}

/// Logs go to the configured file; the terminal belongs to the UI.
fn init_logging(logging: &LoggingConfig, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    let level = match verbosity {
        0 => logging.level_filter(),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format(|fmt, record| {
        let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
    });

    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&logging.file)
    {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            eprintln!(
                "cannot open log file {}: {e}; logging disabled",
                logging.file.display()
            );
            builder.target(env_logger::Target::Pipe(Box::new(io::sink())));
        }
    }
    let _ = builder.try_init();
}
