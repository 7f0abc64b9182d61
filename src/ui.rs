use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use derelict::game::Screen;
use derelict::presenter::timing::{CENTER, MAX_POSITION, WINDOW};
use derelict::presenter::{
    AlignmentGauge, AnswerEntry, CreativeEncounter, PatternBoard, Presenter,
};

use crate::app::{item_key, App, MenuOption};

const TITLE_ART: &str = r#"
██████╗ ███████╗██████╗ ███████╗██╗     ██╗ ██████╗████████╗
██╔══██╗██╔════╝██╔══██╗██╔════╝██║     ██║██╔════╝╚══██╔══╝
██║  ██║█████╗  ██████╔╝█████╗  ██║     ██║██║        ██║   
██║  ██║██╔══╝  ██╔══██╗██╔══╝  ██║     ██║██║        ██║   
██████╔╝███████╗██║  ██║███████╗███████╗██║╚██████╗   ██║   
╚═════╝ ╚══════╝╚═╝  ╚═╝╚══════╝╚══════╝╚═╝ ╚═════╝   ╚═╝   

              D E E P   S P A C E   R E S C U E
"#;

const BRIEFING: &str = "URGENT TRANSMISSION: Explorer Josh Neeq lost contact with mission control \
after boarding an abandoned spacecraft at the edge of the Kepler system.\n\n\
You are Josh's assistant back on Earth and his only hope. Guide him through the ship's \
systems to the escape pods before whatever lurks aboard finds him.";

const TRANSMISSION: &str = "[TRANSMISSION BEGIN] \"I made it! The pod is on autopilot to the \
nearest outpost. I can't thank you enough.\n\n\
The data I pulled says that ship was studying extraterrestrial life. Something went wrong \
and the specimens got loose. I'm sending you its coordinates so it can be quarantined.\" \
[TRANSMISSION END]";

pub fn draw(f: &mut Frame, app: &App) {
    match app.controller.screen() {
        Screen::Intro => draw_title_screen(f, app),
        Screen::StoryIntro | Screen::StoryOutro => draw_story(f, app),
        Screen::Playing => draw_playing(f, app),
        Screen::Complete => draw_complete(f, app),
    }
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let controller = &app.controller;
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(30)])
        .split(area);

    let status = Line::from(vec![
        Span::styled(
            " DERELICT ",
            Style::default().fg(Color::Black).bg(Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" {} ", controller.current_level().name),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                " Mission {} of {} ",
                controller.level_index() + 1,
                controller.total_levels()
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" Hints: {} ", controller.state().total_hints()),
            Style::default().fg(Color::Yellow),
        ),
    ]);
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    let done = if controller.screen() == Screen::Complete {
        controller.total_levels()
    } else {
        controller.level_index()
    };
    let ratio = done as f64 / controller.total_levels().max(1) as f64;
    let progress = Gauge::default()
        .block(Block::default().borders(Borders::BOTTOM))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{done}/{} levels", controller.total_levels()));
    f.render_widget(progress, chunks[1]);
}

fn draw_title_screen(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(2),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(f.area());

    let title = Paragraph::new(TITLE_ART)
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let briefing_area = centered(chunks[1], 80);
    let briefing = Paragraph::new(BRIEFING)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" PRIORITY ALPHA ")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White));
    f.render_widget(briefing, briefing_area);

    let selected = Style::default()
        .fg(Color::Black)
        .bg(Color::Red)
        .add_modifier(Modifier::BOLD);
    let (begin_style, quit_style) = match app.menu_selection {
        MenuOption::NewMission => (selected, Style::default().fg(Color::White)),
        MenuOption::Quit => (Style::default().fg(Color::White), selected),
    };
    f.render_widget(
        Paragraph::new("  BEGIN MISSION  ")
            .style(begin_style)
            .alignment(Alignment::Center),
        chunks[2],
    );
    f.render_widget(
        Paragraph::new("  QUIT  ")
            .style(quit_style)
            .alignment(Alignment::Center),
        chunks[3],
    );

    let help = Paragraph::new("↑/↓ to select  •  ENTER to confirm  •  q to quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[4]);
}

fn draw_story(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(f.area());
    draw_status_bar(f, app, chunks[0]);

    let title = match app.controller.screen() {
        Screen::StoryOutro => " Mission Update ",
        _ => " Mission Log ",
    };
    let text = app.controller.story_text().unwrap_or_default();
    let story = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::White));
    f.render_widget(story, centered(chunks[1], 90));

    f.render_widget(
        Paragraph::new("Press ENTER to continue")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        chunks[2],
    );
}

fn draw_playing(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(12),
            Constraint::Length(5),
        ])
        .split(f.area());
    draw_status_bar(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);

    draw_puzzle_panel(f, app, main_chunks[0]);
    match &app.presenter {
        Some(Presenter::Entry(entry)) => draw_entry(f, app, entry, main_chunks[1]),
        Some(Presenter::Pattern(board)) => draw_pattern(f, board, main_chunks[1]),
        Some(Presenter::Timing(gauge)) => draw_timing(f, gauge, main_chunks[1]),
        Some(Presenter::Creative(encounter)) => {
            draw_creative(f, app, encounter, main_chunks[1])
        }
        None => {}
    }

    draw_message(f, app, chunks[2]);
}

fn draw_puzzle_panel(f: &mut Frame, app: &App, area: Rect) {
    let controller = &app.controller;
    let level = controller.current_level();
    let mut lines = vec![
        Line::from(Span::styled(
            level.description.as_str(),
            Style::default().fg(Color::DarkGray),
        )),
        Line::raw(""),
    ];

    if let Some(puzzle) = controller.current_puzzle() {
        lines.push(Line::from(Span::styled(
            format!("[ {} ]", puzzle.type_label()),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::raw(""));
        lines.push(Line::from(puzzle.question.as_str()));

        let used = controller.state().hints_for(&puzzle.id);
        let revealed = puzzle.revealed_hints(used);
        if !revealed.is_empty() {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("Hints ({}/{})", revealed.len(), puzzle.hints.len()),
                Style::default().fg(Color::Cyan),
            )));
            for hint in revealed {
                lines.push(Line::from(Span::styled(
                    format!("  • {hint}"),
                    Style::default().fg(Color::Cyan),
                )));
            }
        }
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", level.name)))
        .wrap(Wrap { trim: false });
    f.render_widget(panel, area);
}

fn draw_entry(f: &mut Frame, app: &App, entry: &AnswerEntry, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(3)])
        .split(area);

    let mut lines = Vec::new();
    if let Some(clue) = &entry.clue {
        lines.push(Line::from(Span::styled(
            "SCANNER READ-OUT",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            clue.as_str(),
            Style::default().fg(Color::Green),
        )));
        lines.push(Line::raw(""));
    }
    for (n, step) in entry.instructions.iter().enumerate() {
        lines.push(Line::from(format!("{}. {step}", n + 1)));
    }
    let title = if entry.clue.is_some() { " Scanner " } else { " Terminal " };
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false }),
        chunks[0],
    );
    f.render_widget(&app.input, chunks[1]);
}

fn symbol_spans(symbols: &[char], slots: usize, style: Style) -> Line<'static> {
    let spans: Vec<Span> = (0..slots)
        .map(|i| match symbols.get(i) {
            Some(c) => Span::styled(format!(" [{c}] "), style),
            None => Span::styled(" [ ] ", Style::default().fg(Color::DarkGray)),
        })
        .collect();
    Line::from(spans)
}

fn draw_pattern(f: &mut Frame, board: &PatternBoard, area: Rect) {
    let slots = board.reference().len();
    let mut lines = vec![
        Line::from("Security pattern:"),
        symbol_spans(
            board.reference(),
            slots,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::from("Your input:"),
        symbol_spans(board.selected(), slots, Style::default().fg(Color::Cyan)),
        Line::raw(""),
        Line::from(Span::styled(
            format!(
                "Keys: {}",
                PatternBoard::symbols()
                    .map(String::from)
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(feedback) = board.feedback() {
        let color = if board.is_matched() { Color::Green } else { Color::Red };
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(feedback, Style::default().fg(color))));
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Launch Control "),
        ),
        area,
    );
}

fn timing_track(gauge: &AlignmentGauge, width: usize) -> Line<'static> {
    let width = width.max(10);
    let scale = (width - 1) as f32 / MAX_POSITION;
    let cell = |position: f32| (position * scale).round() as usize;
    let window = cell(CENTER - WINDOW / 2.0)..=cell(CENTER + WINDOW / 2.0);
    let marker = cell(gauge.position());

    let spans: Vec<Span> = (0..width)
        .map(|i| {
            let in_window = window.contains(&i);
            if i == marker {
                let color = if in_window { Color::Green } else { Color::Red };
                Span::styled("█", Style::default().fg(color))
            } else if in_window {
                Span::styled("▒", Style::default().fg(Color::Green))
            } else {
                Span::styled("─", Style::default().fg(Color::DarkGray))
            }
        })
        .collect();
    Line::from(spans)
}

fn draw_timing(f: &mut Frame, gauge: &AlignmentGauge, area: Rect) {
    let inner_width = area.width.saturating_sub(2) as usize;
    let mut lines = vec![
        Line::from("Power coupling alignment"),
        Line::raw(""),
        timing_track(gauge, inner_width),
        Line::raw(""),
        Line::from(Span::styled(
            format!(
                "Attempts: {}   Speed: {:.1}",
                gauge.attempts(),
                gauge.speed()
            ),
            Style::default().fg(Color::DarkGray),
        )),
    ];
    if let Some(feedback) = gauge.feedback() {
        let aligned = gauge.last_stop().is_some_and(AlignmentGauge::in_window);
        let color = if aligned { Color::Green } else { Color::Yellow };
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(feedback, Style::default().fg(color))));
    }
    f.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Alignment Control [SPACE: lock] "),
        ),
        area,
    );
}

fn draw_creative(f: &mut Frame, app: &App, encounter: &CreativeEncounter, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    let mut lines = Vec::new();
    if encounter.show_items() {
        lines.push(Line::from(Span::styled(
            "Items in the alcove (press a key to add, TAB to hide):",
            Style::default().fg(Color::Cyan),
        )));
        for (i, item) in encounter.items().iter().enumerate() {
            let key = item_key(i).map(String::from).unwrap_or_default();
            lines.push(Line::from(format!("  [{key}] {item}")));
        }
    } else {
        lines.push(Line::from(encounter.scenario()));
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            "TAB shows the items Josh can use.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(feedback) = encounter.feedback() {
        let color = if encounter.is_lost() { Color::Red } else { Color::Yellow };
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(feedback, Style::default().fg(color))));
    }
    f.render_widget(
        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(" Maintenance Alcove "))
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    let ratio = encounter.health() as f64 / encounter.max_health().max(1) as f64;
    let color = match encounter.health() * 100 / encounter.max_health().max(1) {
        51.. => Color::Green,
        21..=50 => Color::Yellow,
        _ => Color::Red,
    };
    let health = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Josh's Health  (attempts left: {}) ",
            encounter.attempts_remaining()
        )))
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{}/{}", encounter.health(), encounter.max_health()));
    f.render_widget(health, chunks[1]);

    f.render_widget(&app.input, chunks[2]);
}

fn draw_message(f: &mut Frame, app: &App, area: Rect) {
    let (content, style, title) = if app.command_mode {
        (
            format!(":{}", app.command_buffer),
            Style::default().fg(Color::White).bg(Color::DarkGray),
            " Command ",
        )
    } else if app.controller.is_processing() {
        (
            "Processing...".to_string(),
            Style::default().fg(Color::Yellow),
            " Ship Computer ",
        )
    } else if app.flash_incorrect() {
        (
            app.controller.state().error.clone().unwrap_or_default(),
            Style::default()
                .fg(Color::White)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            " Ship Computer ",
        )
    } else {
        (app.message.clone(), app.message_style, " Ship Computer ")
    };

    f.render_widget(
        Paragraph::new(content)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .style(style),
        area,
    );
}

fn draw_complete(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .split(f.area());
    draw_status_bar(f, app, chunks[0]);

    f.render_widget(
        Paragraph::new("MISSION SUCCESSFUL")
            .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center),
        chunks[1],
    );

    f.render_widget(
        Paragraph::new(TRANSMISSION)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" josh_transmission.log "),
            )
            .wrap(Wrap { trim: true }),
        centered(chunks[2], 80),
    );

    let state = app.controller.state();
    let stats = format!(
        "╔══════════════════════════╗\n\
         ║  MISSION STATISTICS      ║\n\
         ╠══════════════════════════╣\n\
         ║  Status:      COMPLETED  ║\n\
         ║  Puzzles solved:   {:>4}  ║\n\
         ║  Hints used:       {:>4}  ║\n\
         ╚══════════════════════════╝",
        state.completed_puzzles.len(),
        state.total_hints()
    );
    f.render_widget(
        Paragraph::new(stats)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center),
        chunks[3],
    );

    f.render_widget(
        Paragraph::new("ENTER for a new mission (different puzzles each time)  •  q to quit")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        chunks[4],
    );
}

/// Horizontally centred slice of `area`, `percent` wide.
fn centered(area: Rect, percent: u16) -> Rect {
    let side = (100 - percent.min(100)) / 2;
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(side),
            Constraint::Percentage(percent),
            Constraint::Percentage(side),
        ])
        .split(area)[1]
}
