//! Layout and drawing: menu, board, sidebar, pause, quit menu, game over.

use crate::GameMode;
use crate::app::{MenuState, MenuTab, QuitOption, Screen};
use crate::game::GameState;
use crate::session::{EndReason, PowerUp, RemainingBudget};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal cells per block. Wide cells make the round "dot" glyph read as a
/// block and give the mouse a decent hit target.
pub const CELL_W: u16 = 4;
pub const CELL_H: u16 = 2;

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the white flash over freshly refilled cells.
const REMOVAL_FLASH_MS: u32 = 350;

/// Board size in terminal cells including the border.
fn board_pixel_size(cols: u16, rows: u16) -> (u16, u16) {
    (cols * CELL_W + 2, rows * CELL_H + 2)
}

fn board_outer_rect(area: Rect, cols: u16, rows: u16) -> Rect {
    let (pw, ph) = board_pixel_size(cols, rows);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    Rect {
        x,
        y,
        width: pw.min(area.width),
        height: ph.min(area.height),
    }
}

/// Board interior (no border). The app uses the same rect to translate mouse
/// coordinates, so drawing and hit-testing can never disagree.
pub fn board_inner_rect(area: Rect, cols: u16, rows: u16) -> Rect {
    let outer = board_outer_rect(area, cols, rows);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: (cols * CELL_W).min(outer.width.saturating_sub(2)),
        height: (rows * CELL_H).min(outer.height.saturating_sub(2)),
    }
}

/// Draw the current screen.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    state: &GameState,
    theme: &Theme,
    paused: bool,
    reason: Option<EndReason>,
    menu_state: &MenuState,
    quit_selected: Option<QuitOption>,
    best_score: u32,
    games_played: usize,
    top_scores: &[u32],
    flash_cells: &[usize],
    flash_effect: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
    now: Instant,
    no_animation: bool,
) {
    let area = frame.area();
    match screen {
        Screen::Menu => draw_menu(frame, theme, menu_state, best_score, games_played, area),
        Screen::Playing => {
            draw_game(frame, state, theme, best_score, area);
            if !flash_cells.is_empty() && !no_animation {
                apply_removal_flash(
                    frame,
                    theme,
                    state,
                    area,
                    flash_cells,
                    flash_effect,
                    flash_process_time,
                    now,
                );
            }
            if paused {
                draw_pause_overlay(frame, theme, area);
            }
        }
        Screen::QuitMenu => {
            draw_game(frame, state, theme, best_score, area);
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, theme, opt, area);
            }
        }
        Screen::GameOver => {
            draw_game_over(frame, state, theme, reason, best_score, top_scores, area);
        }
    }
}

fn draw_menu(
    frame: &mut Frame,
    theme: &Theme,
    menu: &MenuState,
    best_score: u32,
    games_played: usize,
    area: Rect,
) {
    let popup_w = 46u16;
    let popup_h = 18u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(" blocks ", Style::default().fg(theme.block_color(2)).bold()),
        Span::styled(" tui ", Style::default().fg(theme.main_fg).bold()),
    ]);

    let highlight_style = Style::default()
        .fg(Color::Black)
        .bg(theme.block_color(1))
        .bold();
    let selected_style = Style::default().fg(theme.block_color(1)).bold();
    let normal_style = Style::default().fg(theme.main_fg);

    let mode_span = |mode: GameMode, label: &str| {
        let style = if menu.current_tab == MenuTab::Mode && menu.selected_mode == mode {
            highlight_style
        } else if menu.selected_mode == mode {
            selected_style
        } else {
            normal_style
        };
        Span::styled(format!(" {label} "), style)
    };

    let start_btn = if menu.current_tab == MenuTab::Start {
        Span::styled(" [ START ] ", highlight_style)
    } else {
        Span::styled(" [ START ] ", normal_style)
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(Span::styled(
            " Link blocks. Close loops. ",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " ─ MODE ─ ",
            Style::default().fg(theme.div_line),
        )),
        Line::from(vec![
            mode_span(GameMode::Moves, "MOVES"),
            Span::from("  "),
            mode_span(GameMode::Timed, "TIMED"),
            Span::from("  "),
            mode_span(GameMode::Endless, "ENDLESS"),
        ]),
        Line::from(""),
        Line::from(start_btn),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Best score: {best_score}   Games: {games_played} "),
            Style::default().fg(theme.title),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(theme.block_color(3))),
            Span::from("SELECT   "),
            Span::styled(" ↔ ", Style::default().fg(theme.block_color(3))),
            Span::from("MODE   "),
            Span::styled(" ENTER ", Style::default().fg(theme.block_color(3))),
            Span::from("PLAY"),
        ]),
        Line::from(Span::styled(
            " Drag with the mouse to link blocks ",
            Style::default().fg(theme.inactive_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " [Q] QUIT ",
            Style::default().fg(Color::Rgb(255, 80, 80)),
        )),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Board + sidebar, centered in the full area.
fn draw_game(frame: &mut Frame, state: &GameState, theme: &Theme, best_score: u32, area: Rect) {
    let cols = state.grid.width() as u16;
    let rows = state.grid.height() as u16;
    let outer = board_outer_rect(area, cols, rows);

    let title = if state.loop_pending() {
        " blockstui ∘ LOOP ".to_string()
    } else {
        " blockstui ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    block.render(outer, frame.buffer_mut());

    let inner = board_inner_rect(area, cols, rows);
    draw_board(frame, state, theme, inner);

    let sidebar = Rect {
        x: outer.x + outer.width,
        y: outer.y,
        width: SIDEBAR_WIDTH.min(area.width.saturating_sub(outer.x + outer.width)),
        height: outer.height,
    };
    draw_sidebar(frame, state, theme, best_score, sidebar);
}

fn draw_board(frame: &mut Frame, state: &GameState, theme: &Theme, inner: Rect) {
    let cols = state.grid.width();
    let rows = state.grid.height();
    let buf = frame.buffer_mut();

    for row in 0..rows {
        for col in 0..cols {
            let index = col + cols * row;
            let color = theme.block_color(state.grid.color_at(index));
            let selected = state.is_selected(index);
            let x0 = inner.x + col as u16 * CELL_W;
            let y0 = inner.y + row as u16 * CELL_H;

            for dy in 0..CELL_H {
                for dx in 0..CELL_W {
                    let bx = x0 + dx;
                    let by = y0 + dy;
                    if bx >= inner.x + inner.width || by >= inner.y + inner.height {
                        continue;
                    }
                    if selected {
                        // Selected blocks fill their whole cell.
                        buf[(bx, by)]
                            .set_symbol(" ")
                            .set_style(Style::default().bg(color));
                    } else {
                        // Unselected blocks are a small centered dot.
                        let is_dot = dy == CELL_H / 2 && dx >= 1 && dx + 1 < CELL_W;
                        if is_dot {
                            buf[(bx, by)]
                                .set_symbol("█")
                                .set_style(Style::default().fg(color).bg(theme.bg));
                        } else {
                            buf[(bx, by)]
                                .set_symbol(" ")
                                .set_style(Style::default().bg(theme.bg));
                        }
                    }
                }
            }
        }
    }
}

fn remaining_line(state: &GameState) -> (String, String) {
    match state.session.remaining() {
        RemainingBudget::Moves { left } => ("Moves left".to_string(), left.to_string()),
        RemainingBudget::Time { remaining_ms } => {
            let secs = remaining_ms / 1000;
            ("Time".to_string(), format!("{:02}:{:02}", secs / 60, secs % 60))
        }
        RemainingBudget::Untracked => ("Moves".to_string(), state.session.moves().to_string()),
    }
}

fn draw_sidebar(frame: &mut Frame, state: &GameState, theme: &Theme, best_score: u32, area: Rect) {
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Fill(1),
        ])
        .split(area);

    let score = Paragraph::new(Line::from(Span::styled(
        format!(" {} ", state.session.score()),
        fg_style.bold(),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" Score ", title_style)),
    );
    score.render(chunks[0], frame.buffer_mut());

    let (label, value) = remaining_line(state);
    let remaining = Paragraph::new(Line::from(Span::styled(format!(" {value} "), fg_style)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(format!(" {label} "), title_style)),
        );
    remaining.render(chunks[1], frame.buffer_mut());

    let armed = state.session.armed();
    let power_line = |key: &str, name: &str, power: PowerUp| {
        let style = if armed == Some(power) {
            Style::default().fg(Color::Black).bg(theme.block_color(1)).bold()
        } else {
            fg_style
        };
        Line::from(Span::styled(format!(" {key} {name} "), style))
    };
    let powers = Paragraph::new(vec![
        power_line("1", "extra", PowerUp::Extra),
        power_line("2", "shrinker", PowerUp::Shrinker),
        power_line("3", "expander", PowerUp::Expander),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" Power-ups ", title_style)),
    );
    powers.render(chunks[2], frame.buffer_mut());

    let help = Paragraph::new(vec![
        Line::from(Span::styled(
            format!(" Best {best_score} "),
            fg_style,
        )),
        Line::from(""),
        Line::from(Span::styled(" Drag  link blocks ", Style::default().fg(theme.inactive_fg))),
        Line::from(Span::styled(" P     pause ", Style::default().fg(theme.inactive_fg))),
        Line::from(Span::styled(" Q     quit ", Style::default().fg(theme.inactive_fg))),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    help.render(chunks[3], frame.buffer_mut());
}

/// Buffer positions covered by the given cell indices.
fn cell_buffer_positions(inner: Rect, cols: usize, cells: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &index in cells {
        let col = (index % cols) as u16;
        let row = (index / cols) as u16;
        let x0 = inner.x + col * CELL_W;
        let y0 = inner.y + row * CELL_H;
        for bx in x0..(x0 + CELL_W).min(inner.x + inner.width) {
            for by in y0..(y0 + CELL_H).min(inner.y + inner.height) {
                set.insert((bx, by));
            }
        }
    }
    set
}

/// Create or update the removal flash (TachyonFX: white fade over the cells
/// that just changed, so committed removals read as a pop).
fn apply_removal_flash(
    frame: &mut Frame,
    theme: &Theme,
    state: &GameState,
    area: Rect,
    flash_cells: &[usize],
    flash_effect: &mut Option<Effect>,
    flash_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let inner = board_inner_rect(area, state.grid.width() as u16, state.grid.height() as u16);
    let delta = flash_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    let tfx_delta = TfxDuration::from_millis(delta_ms);
    *flash_process_time = Some(now);

    if flash_effect.is_none() {
        let flash_set = cell_buffer_positions(inner, state.grid.width(), flash_cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            flash_set.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(
            Color::White,
            theme.bg,
            (REMOVAL_FLASH_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(inner);
        *flash_effect = Some(effect);
    }

    if let Some(effect) = flash_effect {
        frame.render_effect(effect, inner, tfx_delta);
    }
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_quit_menu(frame: &mut Frame, theme: &Theme, selected: QuitOption, area: Rect) {
    let popup_w = 30u16;
    let popup_h = 9u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let option_line = |label: &str, option: QuitOption| {
        let style = if selected == option {
            Style::default().fg(Color::Black).bg(theme.block_color(1)).bold()
        } else {
            Style::default().fg(theme.main_fg)
        };
        Line::from(Span::styled(format!(" {label} "), style))
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Leave the game? ",
            Style::default().fg(theme.title),
        )),
        Line::from(""),
        option_line("Resume", QuitOption::Resume),
        option_line("Main menu", QuitOption::MainMenu),
        option_line("Exit", QuitOption::Exit),
        Line::from(""),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    state: &GameState,
    theme: &Theme,
    reason: Option<EndReason>,
    best_score: u32,
    top_scores: &[u32],
    area: Rect,
) {
    let popup_w = 34u16;
    let popup_h = (13 + top_scores.len() as u16).min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h,
    };

    let title = match reason {
        Some(EndReason::OutOfMoves) => " Out of moves! ",
        Some(EndReason::OutOfTime) => " Time's up! ",
        None => " Game over ",
    };
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", state.session.score()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Moves: {} ", state.session.moves()),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {best_score} "),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
    ];
    if !top_scores.is_empty() {
        lines.push(Line::from(Span::styled(
            " ─ TOP SCORES ─ ",
            Style::default().fg(theme.div_line),
        )));
        for (i, s) in top_scores.iter().enumerate() {
            let style = if *s == state.session.score() {
                Style::default().fg(theme.title).bold()
            } else {
                Style::default().fg(theme.inactive_fg)
            };
            lines.push(Line::from(Span::styled(
                format!(" {:2}. {s} ", i + 1),
                style,
            )));
        }
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        " R — Restart    Q — Quit ",
        Style::default().fg(theme.main_fg),
    )));

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" blockstui ", Style::default().fg(theme.title))),
    );
    p.render(popup, frame.buffer_mut());
}
