//! Read-only terminal dashboard over a finished [`Session`].

use std::io;
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
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::backtest::BacktestResult;
use crate::report;
use crate::session::Session;

const DETAIL_ROWS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Summary,
    Detail,
    Picks,
}

pub struct Dashboard<'a> {
    pub session: Session<'a>,
    pub screen: Screen,
    pub selected: usize,
    pub approved_only: bool,
    pub help_overlay: bool,
    pub should_quit: bool,
}

impl<'a> Dashboard<'a> {
    pub fn new(session: Session<'a>) -> Self {
        Self {
            session,
            screen: Screen::Summary,
            selected: 0,
            approved_only: false,
            help_overlay: false,
            should_quit: false,
        }
    }

    /// Results shown in the summary list under the current filter.
    pub fn visible(&self) -> Vec<&BacktestResult> {
        self.session
            .report
            .results
            .iter()
            .filter(|r| !self.approved_only || r.approved)
            .collect()
    }

    pub fn selected_result(&self) -> Option<&BacktestResult> {
        self.visible().get(self.selected).copied()
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') | KeyCode::Char('b') | KeyCode::Esc => {
                self.screen = Screen::Summary
            }
            KeyCode::Char('2') | KeyCode::Char('d') | KeyCode::Enter => {
                self.screen = Screen::Detail
            }
            KeyCode::Char('3') | KeyCode::Char('p') => self.screen = Screen::Picks,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_prev(),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.approved_only = !self.approved_only;
                self.selected = 0;
                let label = if self.approved_only { "approved only" } else { "all strategies" };
                self.session.log.push(format!("[INFO] Showing {label}"));
            }
            KeyCode::Char('?') => self.help_overlay = !self.help_overlay,
            _ => {}
        }
    }

    fn select_next(&mut self) {
        let total = self.visible().len();
        if total > 0 {
            self.selected = (self.selected + 1).min(total - 1);
        }
    }

    fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Takes over the terminal until the user quits.
pub fn run(session: Session<'_>) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = Dashboard::new(session);
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut Dashboard<'_>) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
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

fn ui(frame: &mut Frame, app: &Dashboard<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.screen {
        Screen::Summary => render_summary(frame, chunks[1], app),
        Screen::Detail => render_detail(frame, chunks[1], app),
        Screen::Picks => render_picks(frame, chunks[1], app),
    }

    let console = Paragraph::new(console_text(app))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(app)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &Dashboard<'_>) -> String {
    let report = &app.session.report;
    let picks = app
        .session
        .picks
        .as_ref()
        .map(|p| p.picks.len().to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "ODDSLAB | history {} rows | strategies {} | approved {} | picks {}",
        report.history_rows,
        report.results.len(),
        report.approved_count(),
        picks
    )
}

fn footer_text(app: &Dashboard<'_>) -> String {
    let screen = match app.screen {
        Screen::Summary => "Summary",
        Screen::Detail => "Detail",
        Screen::Picks => "Picks",
    };
    let filter = if app.approved_only { "approved" } else { "all" };
    format!("{screen} | filter: {filter} | 1/2/3 screens  j/k move  a filter  ? help  q quit")
}

fn render_summary(frame: &mut Frame, area: Rect, app: &Dashboard<'_>) {
    let rows = app.visible();
    let block = Block::default().title("Strategies").borders(Borders::ALL);
    if rows.is_empty() {
        frame.render_widget(Paragraph::new("No strategies to show").block(block), area);
        return;
    }

    let visible = area.height.saturating_sub(3) as usize;
    let (start, end) = visible_range(app.selected, rows.len(), visible.max(1));
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "{:<16} {:<12} {:>6} {:>7} {:>9} {:>7} {:>9} {:>4}",
            "Page", "Strategy", "Games", "Hit8", "Profit8", "Hit40", "Profit40", "OK"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for (idx, r) in rows.iter().enumerate().take(end).skip(start) {
        let text = format!(
            "{:<16} {:<12} {:>6} {:>7} {:>9} {:>7} {:>9} {:>4}",
            report::truncate(&r.page, 16),
            report::truncate(&r.strategy, 12),
            r.overall.games,
            report::pct(r.short.hit_rate),
            report::signed(r.short.profit),
            report::pct(r.long.hit_rate),
            report::signed(r.long.profit),
            if r.approved { "yes" } else { "-" }
        );
        let mut style = if r.approved {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        if idx == app.selected {
            style = style.add_modifier(Modifier::REVERSED);
        }
        lines.push(Line::from(Span::styled(text, style)));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_detail(frame: &mut Frame, area: Rect, app: &Dashboard<'_>) {
    let block = Block::default().title("Detail").borders(Borders::ALL);
    let text = match app.selected_result() {
        Some(result) => {
            let mut text = String::new();
            if let Some(rule) = app.session.bank.get(&result.page, &result.strategy) {
                text.push_str(&rule.describe());
                text.push('\n');
            }
            text.push_str(&report::detail_table(result, DETAIL_ROWS));
            text
        }
        None => "Select a strategy on the summary screen".to_string(),
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_picks(frame: &mut Frame, area: Rect, app: &Dashboard<'_>) {
    let block = Block::default().title("Daily picks").borders(Borders::ALL);
    let text = match app.session.picks.as_ref() {
        Some(picks) => report::picks_table(picks),
        None => "No fixtures loaded".to_string(),
    };
    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(app: &Dashboard<'_>) -> String {
    let logs = &app.session.log;
    if logs.is_empty() {
        return "No messages".to_string();
    }
    logs[logs.len().saturating_sub(3)..].join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Oddslab - Help",
        "",
        "Screens:",
        "  1 / b / Esc  Summary",
        "  2 / Enter    Detail of selected strategy",
        "  3 / p        Daily picks",
        "",
        "Summary:",
        "  j/k or ↑/↓   Move",
        "  a            Toggle approved only",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
