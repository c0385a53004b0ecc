//! TUI implementation for the restwatch workout timer.

use std::io::{self, Stdout};
use std::time::Duration as StdDuration;

use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Wrap};
use ratatui::{Frame, Terminal};

use restwatch::config::{self, Config};
use restwatch::duration::{format_mmss, parse_custom_seconds, WheelPick};
use restwatch::engine::TimerEngine;
use restwatch::error::TuiError;
use restwatch::notify::{AlertPolicy, DesktopNotifier, TerminalHaptics};
use restwatch::presets::{Preset, PresetList};
use restwatch::store::{Store, WeeklyMenu, WorkoutRecord, WorkoutSet, RECENT_DEFAULT_LIMIT};
use restwatch::timer::{TimerMode, TimerSession};

/// How long the finish flash and banner stay on screen.
const FINISH_ALERT_SECS: i64 = 5;

type Engine = TimerEngine<DesktopNotifier, TerminalHaptics>;

#[derive(Parser, Debug)]
#[command(version, about = "Workout rest timer", long_about = None)]
struct Args {
    /// Countdown length to load at startup, in seconds.
    #[arg(short, long)]
    duration: Option<u32>,

    /// Start on the stopwatch instead of the countdown.
    #[arg(long)]
    stopwatch: bool,
}

/// The tabs of the interface, mirroring the app's sibling screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Timer,
    Records,
    Menu,
}

impl View {
    fn next(self) -> Self {
        match self {
            View::Timer => View::Records,
            View::Records => View::Menu,
            View::Menu => View::Timer,
        }
    }

    fn title(self) -> &'static str {
        match self {
            View::Timer => "Timer",
            View::Records => "Records",
            View::Menu => "Weekly Menu",
        }
    }
}

enum InputMode {
    Idle,
    /// Typing into the custom seconds field.
    CustomSeconds {
        buffer: String,
        error: Option<String>,
    },
    /// Waiting for the digit of the preset to delete.
    DeletePreset,
    /// Spinning the minutes/seconds wheels. Confirming saves the pick as a
    /// preset and starts it right away.
    Wheel { pick: WheelPick, on_seconds: bool },
}

/// Highest minutes wheel position, one notch under the duration cap.
const WHEEL_MINUTES_MAX: u16 = 599;

struct App {
    engine: Engine,
    presets: PresetList,
    policy: AlertPolicy,
    view: View,
    input: InputMode,
    store: Store,
    records: Vec<WorkoutRecord>,
    recents: Vec<WorkoutSet>,
    menu: WeeklyMenu,
    finish_flash_until: Option<DateTime<Utc>>,
    finish_banner_until: Option<DateTime<Utc>>,
}

impl App {
    fn new(config: &Config, args: &Args) -> Result<Self, TuiError> {
        let duration = args.duration.unwrap_or(config.default_duration_sec);
        let mut session = TimerSession::new(duration);
        if args.stopwatch {
            session.switch_mode(TimerMode::Stopwatch);
        }

        let engine = TimerEngine::new(session, DesktopNotifier::new(), TerminalHaptics, config);
        let store = Store::open_default()?;

        let mut app = Self {
            engine,
            presets: PresetList::new(config.presets.clone()),
            policy: AlertPolicy::new(),
            view: View::Timer,
            input: InputMode::Idle,
            store,
            records: Vec::new(),
            recents: Vec::new(),
            menu: WeeklyMenu::new(),
            finish_flash_until: None,
            finish_banner_until: None,
        };
        app.focus_view(View::Timer);
        Ok(app)
    }

    /// Moves focus, keeping the alert policy in sync: the timer view shows
    /// its own finish flash, so the banner is suppressed while it is
    /// focused and restored when it blurs.
    fn focus_view(&mut self, next: View) {
        self.view = next;
        self.policy.set_banner_in_foreground(next != View::Timer);
        if matches!(next, View::Records | View::Menu) {
            self.refresh_store_views();
        }
    }

    /// Re-reads the record store. Read failures keep the previous snapshot;
    /// the store views are informational.
    fn refresh_store_views(&mut self) {
        if let Ok(records) = self.store.records(None) {
            self.records = records;
        }
        if let Ok(menu) = self.store.weekly_menu() {
            self.menu = menu;
        }
        self.recents = self.store.recent_sets(RECENT_DEFAULT_LIMIT);
    }

    /// One pass of the periodic poll.
    fn tick(&mut self, now: DateTime<Utc>) {
        if self.engine.tick(now) {
            let until = now + TimeDelta::seconds(FINISH_ALERT_SECS);
            if self.view == View::Timer {
                self.finish_flash_until = Some(until);
            } else if self.policy.banner_in_foreground() {
                self.finish_banner_until = Some(until);
            }
        }
        if self.finish_flash_until.is_some_and(|until| until <= now) {
            self.finish_flash_until = None;
        }
        if self.finish_banner_until.is_some_and(|until| until <= now) {
            self.finish_banner_until = None;
        }
    }

    /// Handles a key press. Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode, now: DateTime<Utc>) -> bool {
        match std::mem::replace(&mut self.input, InputMode::Idle) {
            InputMode::CustomSeconds { mut buffer, .. } => {
                match code {
                    KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => {
                        buffer.push(c);
                        self.input = InputMode::CustomSeconds {
                            buffer,
                            error: None,
                        };
                    }
                    KeyCode::Backspace => {
                        buffer.pop();
                        self.input = InputMode::CustomSeconds {
                            buffer,
                            error: None,
                        };
                    }
                    KeyCode::Enter => match parse_custom_seconds(&buffer) {
                        Ok(sec) => self.engine.apply_seconds(sec, now),
                        Err(err) => {
                            self.input = InputMode::CustomSeconds {
                                buffer,
                                error: Some(err.to_string()),
                            };
                        }
                    },
                    KeyCode::Esc => {}
                    _ => self.input = InputMode::CustomSeconds { buffer, error: None },
                }
                return false;
            }
            InputMode::DeletePreset => {
                if let KeyCode::Char(c) = code {
                    if let Some(index) = c.to_digit(10).map(|d| d as usize) {
                        if index >= 1 {
                            if let Some(sec) = self.presets.get(index - 1).map(|p| p.sec) {
                                self.presets.remove(sec);
                            }
                        }
                    }
                }
                return false;
            }
            InputMode::Wheel { pick, on_seconds } => {
                match code {
                    KeyCode::Left | KeyCode::Right => {
                        self.input = InputMode::Wheel {
                            pick,
                            on_seconds: !on_seconds,
                        };
                    }
                    KeyCode::Up | KeyCode::Down => {
                        let up = code == KeyCode::Up;
                        let pick = if on_seconds {
                            let seconds = match (up, pick.seconds) {
                                (true, s) => (s + 1) % 60,
                                (false, 0) => 59,
                                (false, s) => s - 1,
                            };
                            WheelPick::new(pick.minutes, seconds)
                        } else {
                            let minutes = if up {
                                pick.minutes.saturating_add(1).min(WHEEL_MINUTES_MAX)
                            } else {
                                pick.minutes.saturating_sub(1)
                            };
                            WheelPick::new(minutes, pick.seconds)
                        };
                        self.input = InputMode::Wheel { pick, on_seconds };
                    }
                    KeyCode::Enter => {
                        let sec = pick.total_sec();
                        if sec > 0 {
                            self.presets.add(Preset::new(format_mmss(sec), sec));
                            self.engine.force_start(TimerMode::Countdown, sec, now);
                            self.finish_flash_until = None;
                        }
                    }
                    KeyCode::Esc => {}
                    _ => self.input = InputMode::Wheel { pick, on_seconds },
                }
                return false;
            }
            InputMode::Idle => {}
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                let next = self.view.next();
                self.focus_view(next);
            }
            _ => {}
        }

        if self.view != View::Timer {
            return false;
        }

        match code {
            KeyCode::Char(' ') => {
                if self.engine.session().is_running() {
                    self.engine.pause(now);
                } else {
                    self.engine.start(now);
                }
            }
            KeyCode::Char('r') => self.engine.reset(),
            KeyCode::Char('m') => {
                let next = match self.engine.session().mode() {
                    TimerMode::Countdown => TimerMode::Stopwatch,
                    TimerMode::Stopwatch => TimerMode::Countdown,
                };
                self.engine.switch_mode(next);
            }
            KeyCode::Char('l') => self.engine.add_lap(now),
            KeyCode::Char('-') => self.engine.adjust(-10, now),
            KeyCode::Char('=') => self.engine.adjust(10, now),
            KeyCode::Char('+') => self.engine.adjust(30, now),
            KeyCode::Char('v') => self.engine.toggle_vibrate_on_finish(),
            KeyCode::Char('c') => {
                self.input = InputMode::CustomSeconds {
                    buffer: String::new(),
                    error: None,
                };
            }
            KeyCode::Char('x') => {
                if !self.presets.is_empty() {
                    self.input = InputMode::DeletePreset;
                }
            }
            KeyCode::Char('w') => {
                self.input = InputMode::Wheel {
                    pick: WheelPick::from_total_sec(self.engine.session().duration_sec()),
                    on_seconds: false,
                };
            }
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                if let Some(index) = c.to_digit(10).map(|d| d as usize - 1) {
                    if let Some(sec) = self.presets.get(index).map(|p| p.sec) {
                        self.engine.force_start(TimerMode::Countdown, sec, now);
                        self.finish_flash_until = None;
                    }
                }
            }
            _ => {}
        }

        false
    }
}

struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Restore terminal
        // ignoring errors and avoiding panics (we're in a drop)
        let _ = self.terminal.show_cursor();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        );
        let _ = disable_raw_mode();
    }
}

/// The main UI function.
///
/// Three bands: the key legend, the focused view, and the input/alert line.
fn ui(f: &mut Frame, app: &App, now: DateTime<Utc>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Max(3), Constraint::Min(10), Constraint::Max(3)].as_ref())
        .split(f.area());

    f.render_widget(legend_block(app.view), chunks[0]);

    match app.view {
        View::Timer => timer_view(f, app, now, chunks[1]),
        View::Records => f.render_widget(records_block(&app.records, &app.recents), chunks[1]),
        View::Menu => f.render_widget(menu_block(&app.menu), chunks[1]),
    }

    f.render_widget(status_block(app, now), chunks[2]);
}

/// The legend block.
///
/// Contains the keys legend for the focused view.
fn legend_block(view: View) -> Paragraph<'static> {
    let keys: &[(&str, &str)] = match view {
        View::Timer => &[
            ("space", ":Start/Pause"),
            ("r", ":Reset"),
            ("m", ":Mode"),
            ("1-9", ":Preset"),
            ("w", ":Wheel"),
            ("c", ":Custom"),
            ("l", ":Lap"),
            ("-/=/+", ":Nudge"),
            ("v", ":Bell"),
            ("x", ":Del preset"),
            ("Tab", ":View"),
            ("q", ":Quit"),
        ],
        View::Records | View::Menu => &[("Tab", ":View"), ("q", ":Quit")],
    };

    let mut spans = Vec::new();
    for (i, (key, action)) in keys.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            *key,
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(*action));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().title(view.title()).borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

/// The timer view: mode line, big readout, countdown gauge or lap ledger,
/// and the preset row.
fn timer_view(f: &mut Frame, app: &App, now: DateTime<Utc>, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Max(3),
                Constraint::Max(3),
                Constraint::Max(3),
                Constraint::Min(4),
            ]
            .as_ref(),
        )
        .split(area);

    let session = app.engine.session();

    f.render_widget(mode_block(session), chunks[0]);
    f.render_widget(readout_block(app, now), chunks[1]);
    match session.mode() {
        TimerMode::Countdown => {
            f.render_widget(gauge_block(session, now), chunks[2]);
            f.render_widget(presets_block(&app.presets), chunks[3]);
        }
        TimerMode::Stopwatch => {
            f.render_widget(lap_summary_block(session), chunks[2]);
            f.render_widget(laps_block(session), chunks[3]);
        }
    }
}

fn mode_block(session: &TimerSession) -> Paragraph<'static> {
    let mode = match session.mode() {
        TimerMode::Countdown => "Countdown",
        TimerMode::Stopwatch => "Stopwatch",
    };
    let (state, style) = if session.is_running() {
        ("running", Style::default().fg(Color::Green))
    } else {
        ("paused", Style::default().fg(Color::DarkGray))
    };

    Paragraph::new(Line::from(vec![
        Span::styled(mode, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(state, style),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
}

fn readout_block(app: &App, now: DateTime<Utc>) -> Paragraph<'static> {
    let session = app.engine.session();
    let bell = if app.engine.vibrate_on_finish() {
        "bell on"
    } else {
        "bell off"
    };

    Paragraph::new(Line::from(vec![
        Span::styled(
            format_mmss(session.display_sec(now)),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("   "),
        Span::styled(bell.to_string(), Style::default().fg(Color::DarkGray)),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
}

/// The countdown gauge.
///
/// Fills as the rest runs down; the label keeps the exact remaining time.
fn gauge_block(session: &TimerSession, now: DateTime<Utc>) -> Gauge<'static> {
    let percent = (session.progress(now) * 100.0).round() as u16;
    let label = Span::styled(
        format_mmss(session.remaining(now)),
        Style::default().fg(Color::DarkGray),
    );
    let style = if percent >= 70 {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };

    Gauge::default()
        .percent(percent.min(100))
        .gauge_style(style)
        .label(label)
        .block(Block::default().title("Progress").borders(Borders::ALL))
}

fn presets_block(presets: &PresetList) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (i, preset) in presets.as_slice().iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(
            format!("{})", i + 1),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {}", preset.label)));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "No presets. Apply a custom duration to get going.",
            Style::default().fg(Color::DarkGray),
        ));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().title("Presets").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

fn lap_summary_block(session: &TimerSession) -> Paragraph<'static> {
    let text = match session.laps().first() {
        Some(last) => format!(
            "{} laps   last split +{}",
            session.laps().len(),
            format_mmss(last.diff_sec)
        ),
        None => "No laps".to_string(),
    };

    Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::DarkGray),
    )))
    .alignment(Alignment::Center)
    .block(Block::default().title("Splits").borders(Borders::ALL))
}

fn laps_block(session: &TimerSession) -> Paragraph<'static> {
    let laps = session.laps();
    let text: Vec<Line> = if laps.is_empty() {
        vec![Line::from(Span::styled(
            "No laps yet. Press l while the stopwatch runs.",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        laps.iter()
            .enumerate()
            .map(|(i, lap)| {
                Line::from(vec![
                    Span::styled(
                        format!("Lap {:>2}  ", laps.len() - i),
                        Style::default().fg(Color::Green),
                    ),
                    Span::raw(format_mmss(lap.time_sec)),
                    Span::styled(
                        format!("  (+{})", format_mmss(lap.diff_sec)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            })
            .collect()
    };

    Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().title("Laps").borders(Borders::ALL))
}

fn describe_set(set: &WorkoutSet) -> String {
    let detail = match set.kind.as_str() {
        "cardio" => format!(
            "{} km in {} min",
            set.distance.as_deref().unwrap_or("-"),
            set.time.as_deref().unwrap_or("-"),
        ),
        _ => format!(
            "{} kg x {} reps",
            set.weight.as_deref().unwrap_or("-"),
            set.reps.as_deref().unwrap_or("-"),
        ),
    };
    format!(
        "{}  {} x {} sets",
        set.exercise,
        detail,
        set.sets.as_deref().unwrap_or("1"),
    )
}

/// The records view: the logged workout records and the recent-set history.
fn records_block(records: &[WorkoutRecord], recents: &[WorkoutSet]) -> Paragraph<'static> {
    let mut text = Vec::new();

    if records.is_empty() {
        text.push(Line::from(Span::styled(
            "No workout records yet.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for record in records {
        text.push(Line::from(vec![
            Span::styled(record.date.clone(), Style::default().fg(Color::Green)),
            Span::raw("  "),
            Span::raw(describe_set(&record.set)),
        ]));
    }

    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Recent sets",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if recents.is_empty() {
        text.push(Line::from(Span::styled(
            "Nothing logged recently.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for set in recents {
        text.push(Line::from(describe_set(set)));
    }

    Paragraph::new(text)
        .alignment(Alignment::Left)
        .block(Block::default().title("Workout records").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

/// The weekly menu view, one line per weekday.
fn menu_block(menu: &WeeklyMenu) -> Paragraph<'static> {
    let mut text = Vec::new();

    if menu.is_empty() {
        text.push(Line::from(Span::styled(
            "No weekly menu saved.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (day, sets) in menu {
        text.push(Line::from(Span::styled(
            day.clone(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        for set in sets {
            text.push(Line::from(format!("  {}", describe_set(set))));
        }
    }

    Paragraph::new(text)
        .alignment(Alignment::Left)
        .block(Block::default().title("Weekly menu").borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

/// The bottom line: custom input, delete prompt, or finish alerts.
fn status_block(app: &App, now: DateTime<Utc>) -> Paragraph<'static> {
    let line = match &app.input {
        InputMode::CustomSeconds { buffer, error } => {
            let mut spans = vec![
                Span::raw("Custom seconds: "),
                Span::styled(
                    format!("{buffer}_"),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
            ];
            if let Some(message) = error {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(
                    message.clone(),
                    Style::default().fg(Color::Red),
                ));
            }
            Line::from(spans)
        }
        InputMode::DeletePreset => Line::from(Span::styled(
            "Delete which preset? Press its digit, Esc to keep it.",
            Style::default().fg(Color::Yellow),
        )),
        InputMode::Wheel { pick, on_seconds } => {
            let focused = Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD);
            let blurred = Style::default();
            Line::from(vec![
                Span::raw("Pick duration: "),
                Span::styled(
                    format!("{:02}", pick.minutes),
                    if *on_seconds { blurred } else { focused },
                ),
                Span::raw(" min "),
                Span::styled(
                    format!("{:02}", pick.seconds),
                    if *on_seconds { focused } else { blurred },
                ),
                Span::raw(" sec   arrows spin, Enter starts, Esc cancels"),
            ])
        }
        InputMode::Idle => {
            if app
                .finish_flash_until
                .is_some_and(|until| now < until && app.view == View::Timer)
            {
                Line::from(Span::styled(
                    "Time's up! Rest is over.",
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                ))
            } else if app.finish_banner_until.is_some_and(|until| now < until) {
                Line::from(Span::styled(
                    "Timer finished while you were browsing.",
                    Style::default()
                        .fg(Color::Red)
                        .add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    "restwatch",
                    Style::default().fg(Color::DarkGray),
                ))
            }
        }
    };

    Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true })
}

/// Run the TUI.
///
/// This function will setup the terminal, run the main loop, and then
/// restore the terminal.
fn run(args: Args) -> Result<(), TuiError> {
    let mut guard = TerminalGuard::new()?;

    let config = config::load_or_initialize()?;
    let poll_timeout = StdDuration::from_millis(config.tick_interval_ms.clamp(50, 1_000));

    let mut app = App::new(&config, &args)?;

    // Main loop
    loop {
        let now = Utc::now();
        app.tick(now);

        guard.terminal_mut().draw(|f| ui(f, &app, now))?;

        // Poll for events
        if event::poll(poll_timeout)? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key.code, Utc::now()) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// The main function.
///
/// This function executes the main loop of the application
/// by calling the [`run`] function.
fn main() -> Result<(), TuiError> {
    let args = Args::parse();
    run(args)?;
    Ok(())
}
