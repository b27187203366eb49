use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use stirnubuks_feed::config::{FeedConfig, Preset};
use stirnubuks_feed::feed::{CycleReport, spawn_provider};
use stirnubuks_feed::state::{self, AppState, PollStatus, ProviderCommand, apply_delta};

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(state: AppState, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('s') => {
                if self.state.poll_status == PollStatus::Stopped {
                    self.send(ProviderCommand::StartPolling, "Start summary");
                } else {
                    self.state.push_log("[INFO] Summary updates already running");
                }
            }
            KeyCode::Char('x') => {
                if self.state.poll_status == PollStatus::Running {
                    self.state.poll_status = PollStatus::Stopping;
                    self.send(ProviderCommand::StopPolling, "Stop summary");
                }
            }
            KeyCode::Char('l') => self.send(ProviderCommand::FetchStartList, "Start list fetch"),
            KeyCode::Char('a') => self.send(ProviderCommand::FetchAwarding, "Awarding fetch"),
            KeyCode::Char('r') => self.send(ProviderCommand::ReloadPreset, "Preset reload"),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn send(&mut self, cmd: ProviderCommand, label: &str) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log(format!("[WARN] {label} request failed"));
        } else {
            self.state.push_log(format!("[INFO] {label} requested"));
        }
    }
}

fn main() -> io::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let config = FeedConfig::from_env();
    let mut state = AppState::new(config.stage.clone(), config.distances.clone());
    let preset = match config.load_preset() {
        Ok(preset) => preset,
        Err(err) => {
            state.push_log(format!("[WARN] Preset not loaded: {err:#}"));
            Preset::default()
        }
    };
    let missing = config.missing_requirements();
    if !missing.is_empty() {
        state.push_log(format!("[WARN] Missing configuration: {}", missing.join(", ")));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let worker = spawn_provider(tx, cmd_rx, config, preset);

    let mut app = App::new(state, cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if app.state.poll_status != PollStatus::Stopped {
        eprintln!("waiting for the current cycle to finish...");
    }
    let _ = app.cmd_tx.send(ProviderCommand::Shutdown);
    let _ = worker.join();

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(6),
            Constraint::Length(10),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[1]);
    render_distances(frame, body[0], &app.state);
    render_outputs(frame, body[1], &app.state);
    render_logs(frame, chunks[2], &app.state);

    let footer = Paragraph::new(
        "s Start summary | x Stop | l Start list | a Awarding | r Reload preset \
         | j/k Move | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let stage = if state.stage.is_empty() {
        "-"
    } else {
        state.stage.as_str()
    };
    format!(
        "STIRNU BUKS FEED | Stage: {} | Summary: {} | Cycles: {}",
        stage,
        poll_label(state.poll_status),
        state.cycles
    )
}

fn poll_label(status: PollStatus) -> &'static str {
    match status {
        PollStatus::Stopped => "Stopped",
        PollStatus::Running => "Running",
        PollStatus::Stopping => "Stopping",
    }
}

fn render_distances(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Distances").borders(Borders::ALL);
    if state.distances.is_empty() {
        let empty = Paragraph::new("No distances configured (STIRNUBUKS_DISTANCES)")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let lines: Vec<Line> = state
        .distances
        .iter()
        .enumerate()
        .map(|(idx, distance)| {
            let count = state
                .participants_for(distance)
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            let style = if idx == state.selected {
                Style::default()
                    .fg(Color::White)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(format!("{distance:<16} {count:>5}"), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_outputs(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut lines = Vec::new();
    push_report_lines(&mut lines, "Summary", state.last_cycle.as_ref());
    push_report_lines(&mut lines, "Start list", state.last_start_list.as_ref());
    push_report_lines(&mut lines, "Awarding", state.last_awarding.as_ref());
    let block = Block::default().title("Outputs").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn push_report_lines(lines: &mut Vec<Line<'static>>, label: &str, report: Option<&CycleReport>) {
    let Some(report) = report else {
        lines.push(Line::styled(
            format!("{label}: not run"),
            Style::default().fg(Color::DarkGray),
        ));
        return;
    };
    lines.push(Line::styled(
        format!("{label} @ {} ({} records)", report.finished_at, report.records),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    for path in &report.written {
        lines.push(Line::raw(format!("  {}", path.display())));
    }
}

fn render_logs(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let start = state.logs.len().saturating_sub(visible);
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(start)
        .map(|line| {
            let color = if line.starts_with("[WARN]") {
                Color::Yellow
            } else {
                Color::Gray
            };
            Line::styled(line.clone(), Style::default().fg(color))
        })
        .collect();
    let block = Block::default().title("Log").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let width = area.width.min(60);
    let height = area.height.min(12);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    let text = "s  start polling the summary results\n\
                x  stop polling (current cycle finishes)\n\
                l  fetch start lists for all distances\n\
                a  fetch the podium page\n\
                r  reload the preset file\n\
                j/k  move the distance cursor\n\
                q  quit";
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Help").borders(Borders::ALL)),
        popup,
    );
}
