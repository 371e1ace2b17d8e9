// Terminal front end
// Draws the board, status bar and dialogs, and turns key and mouse input into moves

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent,
    MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::msw_board::{Board, BoardStatus};
use crate::msw_color::{number_color, ColorDepth};
use crate::msw_config::{parse_custom, save_config, Config, ConfigError, CustomField, Difficulty};
use crate::msw_session::Session;

// Key bar entries (key, action)
const KEY_ITEMS: [(&str, &str); 3] = [("F2", "New"), ("F5", "Difficulty"), ("Esc", "Exit")];

// Narrowest layout that still fits the status bar and dialogs
const MIN_WIDTH: u16 = 48;

const GLYPH_HIDDEN: &str = "■";
const GLYPH_MINE: &str = "*";
const GLYPH_FLAG: &str = "F";
const GLYPH_WRONG_FLAG: &str = "x";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Text being typed into the custom difficulty form
#[derive(Debug, Clone, PartialEq)]
struct CustomForm {
    fields: [String; 3], // Rows, cols, mines
    focus: usize,
    error: Option<ConfigError>,
}

impl CustomForm {
    fn from_config(cfg: &Config) -> Self {
        CustomForm {
            fields: [
                cfg.custom_rows.to_string(),
                cfg.custom_cols.to_string(),
                cfg.custom_mines.to_string(),
            ],
            focus: 0,
            error: None,
        }
    }

    fn push_digit(&mut self, c: char) {
        let field = &mut self.fields[self.focus];
        if field.len() < 4 {
            field.push(c);
        }
        self.error = None;
    }

    fn backspace(&mut self) {
        self.fields[self.focus].pop();
        self.error = None;
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn prev_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    /// Validate the form; on failure the offending field takes focus
    fn submit(&mut self) -> Option<Difficulty> {
        match parse_custom(&self.fields[0], &self.fields[1], &self.fields[2]) {
            Ok(d) => Some(d),
            Err(e) => {
                debug!(error = %e, "custom difficulty rejected");
                self.focus = CustomField::ALL.iter().position(|f| *f == e.field()).unwrap_or(0);
                self.error = Some(e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Dialog {
    Closed,
    Difficulty,
    Custom(CustomForm),
    Outcome(BoardStatus),
}

// Runtime UI variables, kept apart from game state
#[derive(Debug)]
struct UiState {
    cursor: (usize, usize),   // Keyboard cursor (row, col)
    board_rect: Option<Rect>, // Last rendered board block, for mouse hit testing
    dialog: Dialog,
    notice: Option<String>, // One-line message in the status bar
    depth: ColorDepth,
}

impl UiState {
    fn new(depth: ColorDepth) -> Self {
        UiState {
            cursor: (0, 0),
            board_rect: None,
            dialog: Dialog::Closed,
            notice: None,
            depth,
        }
    }

    fn step_cursor(&mut self, dr: isize, dc: isize, board: &Board) {
        let r = (self.cursor.0 as isize + dr).clamp(0, board.rows() as isize - 1) as usize;
        let c = (self.cursor.1 as isize + dc).clamp(0, board.cols() as isize - 1) as usize;
        self.cursor = (r, c);
    }
}

/// Outer size of the board block: two columns per cell plus borders and a padding column
fn board_extent(rows: usize, cols: usize) -> (u16, u16) {
    ((cols * 2 + 3) as u16, (rows + 2) as u16)
}

/// Map a terminal position to the board cell drawn there
fn cell_at(area: Rect, rows: usize, cols: usize, x: u16, y: u16) -> Option<(usize, usize)> {
    let inner_x = area.x + 1;
    let inner_y = area.y + 1;
    if x < inner_x || y < inner_y {
        return None;
    }
    let row = usize::from(y - inner_y);
    let col = usize::from((x - inner_x) / 2);
    (row < rows && col < cols).then_some((row, col))
}

/// Three-digit counter display; negative values keep their sign
fn format_counter(value: i64) -> String {
    format!("{:03}", value)
}

fn face(status: BoardStatus) -> &'static str {
    match status {
        BoardStatus::InProgress => ":)",
        BoardStatus::Won => "B)",
        BoardStatus::Lost => "X(",
    }
}

pub fn run(cfg: &mut Config) -> Result<(), Box<dyn Error>> {
    let mut session = Session::new(cfg.difficulty)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut session, cfg);

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, terminal::LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    save_config(cfg);
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    session: &mut Session,
    cfg: &mut Config,
) -> Result<(), Box<dyn Error>> {
    let mut ui = UiState::new(ColorDepth::detect());
    // The tick only refreshes the timer display
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| draw(f, session, &mut ui))?;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            let flow = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(key, session, cfg, &mut ui),
                Event::Mouse(mouse) => handle_mouse(mouse, session, &mut ui),
                _ => Flow::Continue,
            };
            if flow == Flow::Exit {
                break;
            }
        }
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn handle_key(key: KeyEvent, session: &mut Session, cfg: &mut Config, ui: &mut UiState) -> Flow {
    match std::mem::replace(&mut ui.dialog, Dialog::Closed) {
        Dialog::Closed => return handle_board_key(key, session, ui),
        Dialog::Difficulty => match key.code {
            KeyCode::Char(c @ '1'..='3') => {
                let preset = Difficulty::PRESETS[usize::from(c as u8 - b'1')];
                apply_difficulty(preset, session, cfg, ui);
            }
            KeyCode::Char('4') => ui.dialog = Dialog::Custom(CustomForm::from_config(cfg)),
            KeyCode::Esc => {}
            _ => ui.dialog = Dialog::Difficulty,
        },
        Dialog::Custom(mut form) => match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                form.push_digit(c);
                ui.dialog = Dialog::Custom(form);
            }
            KeyCode::Backspace => {
                form.backspace();
                ui.dialog = Dialog::Custom(form);
            }
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                ui.dialog = Dialog::Custom(form);
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.prev_field();
                ui.dialog = Dialog::Custom(form);
            }
            KeyCode::Enter => match form.submit() {
                Some(d) => apply_difficulty(d, session, cfg, ui),
                None => ui.dialog = Dialog::Custom(form),
            },
            KeyCode::Esc => ui.dialog = Dialog::Difficulty,
            _ => ui.dialog = Dialog::Custom(form),
        },
        // Any key dismisses the result and deals a new board
        Dialog::Outcome(_) => start_new_game(session, ui),
    }
    Flow::Continue
}

fn handle_board_key(key: KeyEvent, session: &mut Session, ui: &mut UiState) -> Flow {
    match key.code {
        KeyCode::Esc => return Flow::Exit,
        KeyCode::F(2) => start_new_game(session, ui),
        KeyCode::F(5) => ui.dialog = Dialog::Difficulty,
        KeyCode::Left => ui.step_cursor(0, -1, session.board()),
        KeyCode::Right => ui.step_cursor(0, 1, session.board()),
        KeyCode::Up => ui.step_cursor(-1, 0, session.board()),
        KeyCode::Down => ui.step_cursor(1, 0, session.board()),
        KeyCode::Char(' ') => reveal_at(ui.cursor, session, ui),
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let (r, c) = ui.cursor;
            session.toggle_flag(r, c);
        }
        _ => {}
    }
    Flow::Continue
}

fn handle_mouse(mouse: MouseEvent, session: &mut Session, ui: &mut UiState) -> Flow {
    let MouseEventKind::Down(button) = mouse.kind else {
        return Flow::Continue;
    };
    // A click anywhere dismisses the result dialog
    if matches!(ui.dialog, Dialog::Outcome(_)) {
        start_new_game(session, ui);
        return Flow::Continue;
    }
    if ui.dialog != Dialog::Closed {
        return Flow::Continue;
    }
    let Some(area) = ui.board_rect else {
        return Flow::Continue;
    };
    let board = session.board();
    if let Some(cell) = cell_at(area, board.rows(), board.cols(), mouse.column, mouse.row) {
        ui.cursor = cell;
        match button {
            MouseButton::Left => reveal_at(cell, session, ui),
            MouseButton::Right => {
                session.toggle_flag(cell.0, cell.1);
            }
            MouseButton::Middle => {}
        }
    }
    Flow::Continue
}

fn reveal_at((row, col): (usize, usize), session: &mut Session, ui: &mut UiState) {
    session.reveal(row, col);
    let status = session.status();
    if status.is_finished() {
        ui.dialog = Dialog::Outcome(status);
    }
}

fn start_new_game(session: &mut Session, ui: &mut UiState) {
    match session.new_game() {
        Ok(()) => {
            ui.cursor = (0, 0);
            ui.notice = None;
        }
        Err(e) => {
            warn!(error = %e, "could not start a new game");
            ui.notice = Some(e.to_string());
        }
    }
}

fn apply_difficulty(difficulty: Difficulty, session: &mut Session, cfg: &mut Config, ui: &mut UiState) {
    match session.change_difficulty(difficulty) {
        Ok(()) => {
            cfg.set_difficulty(difficulty);
            save_config(cfg);
            ui.cursor = (0, 0);
            ui.notice = None;
        }
        Err(e) => {
            // Keep playing the previous board
            warn!(error = %e, difficulty = difficulty.name(), "difficulty change rejected");
            ui.notice = Some(e.to_string());
        }
    }
}

fn draw<B: Backend>(f: &mut Frame<B>, session: &Session, ui: &mut UiState) {
    let size = f.size();
    let board = session.board();
    let (board_w, board_h) = board_extent(board.rows(), board.cols());
    let min_w = board_w.max(MIN_WIDTH);
    let min_h = board_h + 6;
    if size.width < min_w || size.height < min_h {
        ui.board_rect = None;
        let warn_lines = vec![
            Spans::from(Span::raw("Terminal size too small.")),
            Spans::from(Span::raw(format!("Minimum required: {} x {}", min_w, min_h))),
        ];
        let warn = Paragraph::new(Text::from(warn_lines))
            .block(Block::default().borders(Borders::ALL).title("Resize Terminal"))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40u16.min(size.width), 4u16.min(size.height), size);
        f.render_widget(warn, area);
        return;
    }

    // layout: key bar, board, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(board_h), Constraint::Length(3)].as_ref())
        .split(size);

    draw_key_bar(f, chunks[0]);
    draw_status(f, chunks[2], session, ui);

    let area = center_rect(board_w, board_h, chunks[1]);
    ui.board_rect = Some(area);
    draw_board(f, area, session, ui);

    match &ui.dialog {
        Dialog::Closed => {}
        Dialog::Difficulty => draw_difficulty_dialog(f, size, session.difficulty()),
        Dialog::Custom(form) => draw_custom_dialog(f, size, form),
        Dialog::Outcome(status) => draw_outcome_dialog(f, size, *status, session.elapsed().as_secs()),
    }
}

fn key_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn draw_key_bar<B: Backend>(f: &mut Frame<B>, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, action)) in KEY_ITEMS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("   "));
        }
        spans.push(Span::styled(*key, key_style()));
        spans.push(Span::raw(format!(": {}", action)));
    }
    let bar = Paragraph::new(Spans::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(bar, area);
}

fn draw_status<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session, ui: &UiState) {
    let left = format!(
        " Mines: {}   {}   Time: {} ",
        format_counter(session.remaining_mines() as i64),
        face(session.status()),
        format_counter(session.elapsed().as_secs() as i64),
    );
    let right = ui.notice.clone().unwrap_or_default();
    let inner_w = area.width.saturating_sub(2) as usize;
    let gap = inner_w.saturating_sub(left.width() + right.width() + 1).max(1);
    let spans = vec![
        Span::raw(left),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(Color::Red)),
    ];
    let status = Paragraph::new(Spans::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn cell_span(board: &Board, row: usize, col: usize, cursor: (usize, usize), depth: ColorDepth) -> Span<'static> {
    let status = board.status();
    let hidden = Style::default().fg(Color::DarkGray).bg(Color::Gray);
    let open = Style::default().bg(Color::White);
    let marker = Style::default().fg(Color::Red).bg(Color::Gray).add_modifier(Modifier::BOLD);

    let (glyph, mut style) = if board.is_revealed(row, col) {
        if board.is_mine(row, col) {
            (GLYPH_MINE.to_string(), Style::default().fg(Color::Black).bg(Color::Red))
        } else {
            match board.adjacent_count(row, col) {
                0 => (" ".to_string(), open),
                n => (n.to_string(), open.fg(number_color(n, depth)).add_modifier(Modifier::BOLD)),
            }
        }
    } else if board.is_flagged(row, col) {
        if status == BoardStatus::Lost && !board.is_mine(row, col) {
            (GLYPH_WRONG_FLAG.to_string(), marker)
        } else {
            (GLYPH_FLAG.to_string(), marker)
        }
    } else if board.is_mine(row, col) && status == BoardStatus::Lost {
        (GLYPH_MINE.to_string(), hidden.fg(Color::Black))
    } else if board.is_mine(row, col) && status == BoardStatus::Won {
        (GLYPH_FLAG.to_string(), marker)
    } else {
        (GLYPH_HIDDEN.to_string(), hidden)
    };

    if cursor == (row, col) && !status.is_finished() {
        style = style.bg(Color::LightBlue);
    }
    Span::styled(format!(" {}", glyph), style)
}

fn draw_board<B: Backend>(f: &mut Frame<B>, area: Rect, session: &Session, ui: &UiState) {
    let board = session.board();
    let pad = Style::default().bg(Color::Gray);
    let lines: Vec<Spans> = (0..board.rows())
        .map(|row| {
            let mut spans: Vec<Span> = (0..board.cols())
                .map(|col| cell_span(board, row, col, ui.cursor, ui.depth))
                .collect();
            // Right padding column so both sides of the grid look the same
            spans.push(Span::styled(" ", pad));
            Spans::from(spans)
        })
        .collect();
    let paragraph = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(session.difficulty().name())
            .title_alignment(Alignment::Center),
    );
    f.render_widget(paragraph, area);
}

fn draw_modal<B: Backend>(f: &mut Frame<B>, area: Rect, title: &str, lines: Vec<Spans>, alignment: Alignment) {
    f.render_widget(Clear, area);
    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .alignment(alignment);
    f.render_widget(p, area);
}

fn draw_difficulty_dialog<B: Backend>(f: &mut Frame<B>, size: Rect, current: Difficulty) {
    let focus = Style::default().bg(Color::LightBlue).fg(Color::Black).add_modifier(Modifier::BOLD);
    let mut lines = vec![Spans::from(Span::raw(""))];
    for (i, d) in Difficulty::PRESETS.iter().enumerate() {
        let (rows, cols, mines) = d.params();
        let name = d.name();
        let pad = 8usize.saturating_sub(name.width());
        let text = format!(" {}) {}{} {:>2}x{:<2}  {:>2} mines ", i + 1, name, " ".repeat(pad), rows, cols, mines);
        if *d == current {
            lines.push(Spans::from(Span::styled(text, focus)));
        } else {
            lines.push(Spans::from(Span::raw(text)));
        }
    }
    let custom = " 4) Custom...";
    if matches!(current, Difficulty::Custom { .. }) {
        lines.push(Spans::from(Span::styled(custom, focus)));
    } else {
        lines.push(Spans::from(Span::raw(custom)));
    }
    lines.push(Spans::from(Span::raw("")));
    lines.push(Spans::from(vec![Span::styled(" Esc", key_style()), Span::raw(": Close")]));
    draw_modal(f, center_rect(40, 9, size), "Difficulty", lines, Alignment::Left);
}

fn draw_custom_dialog<B: Backend>(f: &mut Frame<B>, size: Rect, form: &CustomForm) {
    let mut lines = vec![Spans::from(Span::raw(""))];
    for (i, field) in CustomField::ALL.iter().enumerate() {
        let flagged = form.error.as_ref().map(|e| e.field()) == Some(*field);
        let label_style = if flagged {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let input_style = if form.focus == i {
            Style::default().bg(Color::Yellow).fg(Color::Black)
        } else {
            Style::default().bg(Color::DarkGray)
        };
        lines.push(Spans::from(vec![
            Span::raw(" "),
            Span::styled(format!("{:<10}", format!("{}:", field.label())), label_style),
            Span::styled(format!("{:<4}", form.fields[i]), input_style),
        ]));
    }
    lines.push(Spans::from(Span::raw("")));
    match &form.error {
        Some(e) => lines.push(Spans::from(Span::styled(format!(" {}", e), Style::default().fg(Color::Red)))),
        None => lines.push(Spans::from(Span::raw(""))),
    }
    lines.push(Spans::from(vec![
        Span::styled(" Enter", key_style()),
        Span::raw(": OK   "),
        Span::styled("Esc", key_style()),
        Span::raw(": Back"),
    ]));
    draw_modal(f, center_rect(64, 9, size), "Custom Difficulty", lines, Alignment::Left);
}

fn draw_outcome_dialog<B: Backend>(f: &mut Frame<B>, size: Rect, status: BoardStatus, secs: u64) {
    let (title, message) = match status {
        BoardStatus::Won => ("Success", "Mines Cleared - You Win!"),
        _ => ("Failure", "Mine Exploded - You Lose!"),
    };
    let lines = vec![
        Spans::from(Span::raw("")),
        Spans::from(Span::raw(message)),
        Spans::from(Span::raw(format!("Time: {} seconds", secs))),
        Spans::from(Span::raw("")),
        Spans::from(Span::raw("Press any key for a new game")),
    ];
    draw_modal(f, bottom_centered_rect(40, 7, size), title, lines, Alignment::Center);
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width - width) / 2;
    let y = r.y + (r.height - height) / 2;
    Rect::new(x, y, width, height)
}

fn bottom_centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width - width) / 2;
    let y = r.y + r.height - height;
    Rect::new(x, y, width, height)
}
