//! App: terminal init, main loop, key/mouse dispatch, screen transitions.

use crate::countdown::Countdown;
use crate::game::GameState;
use crate::input::{self, Action, Pointer};
use crate::path::CellLayout;
use crate::scores;
use crate::session::{ArmEffect, EndReason, PowerUp};
use crate::theme::Theme;
use crate::{Args, GameConfig, GameMode};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Mode,
    Start,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub selected_mode: GameMode,
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    state: GameState,
    screen: Screen,
    paused: bool,
    /// Present only in timed mode.
    countdown: Option<Countdown>,
    game_over_reason: Option<EndReason>,
    menu_state: MenuState,
    quit_selected: QuitOption,
    best_score: u32,
    games_played: usize,
    top_scores: Vec<u32>,
    /// The score is written at most once per game, no matter how it ends.
    score_saved: bool,
    /// Cells that changed in the last committed removal, for the flash.
    flash_cells: Vec<usize>,
    flash_effect: Option<Effect>,
    flash_process_time: Option<Instant>,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let mode = args.mode;
        let state = Self::make_game(mode, &config);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let now = Instant::now();
        let countdown = (screen == Screen::Playing && mode == GameMode::Timed).then(|| {
            let mut c = Countdown::new(u64::from(config.time_limit) * 1000, now);
            c.play(now);
            c
        });
        Ok(Self {
            args,
            config,
            theme,
            state,
            screen,
            paused: false,
            countdown,
            game_over_reason: None,
            menu_state: MenuState {
                current_tab: MenuTab::Mode,
                selected_mode: mode,
            },
            quit_selected: QuitOption::Resume,
            best_score: scores::best_score(),
            games_played: scores::all_scores().len(),
            top_scores: Vec::new(),
            score_saved: false,
            flash_cells: Vec::new(),
            flash_effect: None,
            flash_process_time: None,
        })
    }

    /// Build a game whose hit-test layout matches the drawn cell size.
    fn make_game(mode: GameMode, config: &GameConfig) -> GameState {
        let layout = CellLayout {
            cols: config.width as usize,
            rows: config.height as usize,
            width_px: u32::from(config.width) * u32::from(crate::ui::CELL_W),
            height_px: u32::from(config.height) * u32::from(crate::ui::CELL_H),
        };
        GameState::new(mode, config, layout)
    }

    fn start_game(&mut self, mode: GameMode) {
        let now = Instant::now();
        self.state = Self::make_game(mode, &self.config);
        self.countdown = (mode == GameMode::Timed).then(|| {
            let mut c = Countdown::new(u64::from(self.config.time_limit) * 1000, now);
            c.play(now);
            c
        });
        self.screen = Screen::Playing;
        self.paused = false;
        self.game_over_reason = None;
        self.score_saved = false;
        self.clear_flash();
    }

    fn clear_flash(&mut self) {
        self.flash_cells.clear();
        self.flash_effect = None;
        self.flash_process_time = None;
    }

    fn save_score_once(&mut self) {
        if !self.score_saved && self.state.session.moves() > 0 {
            // Storage failures never reach the game loop.
            let _ = scores::save_score(self.state.session.score());
            self.score_saved = true;
        }
    }

    fn end_game(&mut self) {
        self.game_over_reason = self.state.session.end_reason();
        self.save_score_once();
        if let Some(cd) = &mut self.countdown {
            cd.pause();
        }
        self.top_scores = scores::top_scores(10);
        self.best_score = self.top_scores.first().copied().unwrap_or(0);
        self.games_played = scores::all_scores().len();
        self.screen = Screen::GameOver;
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{DisableMouseCapture, EnableMouseCapture},
            execute,
            terminal::{
                EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
            },
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        execute!(std::io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
        disable_raw_mode()?;
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.state,
                    &self.theme,
                    self.paused,
                    self.game_over_reason,
                    &self.menu_state,
                    (self.screen == Screen::QuitMenu).then_some(self.quit_selected),
                    self.best_score,
                    self.games_played,
                    &self.top_scores,
                    &self.flash_cells,
                    &mut self.flash_effect,
                    &mut self.flash_process_time,
                    now,
                    self.args.no_animation,
                )
            })?;

            if self.flash_effect.as_ref().is_some_and(|e| e.done()) {
                self.clear_flash();
            }

            if self.screen == Screen::Playing && !self.paused {
                let tick = self.countdown.as_mut().and_then(|cd| cd.poll(now));
                if let Some(remaining) = tick {
                    self.state.on_countdown_tick(remaining);
                }
                if self.state.session.is_over() {
                    self.end_game();
                }
            }

            // ~60 FPS event polling.
            let timeout = Duration::from_millis(16);
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    match event::read()? {
                        Event::Key(key) => {
                            if key.kind != KeyEventKind::Press {
                                continue;
                            }
                            if self.on_key(input::key_to_action(key)) {
                                return Ok(());
                            }
                        }
                        Event::Mouse(mouse) => {
                            if let Some(pointer) = input::mouse_to_pointer(mouse) {
                                self.on_pointer(pointer);
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Handle one key action. Returns true when the app should exit.
    fn on_key(&mut self, action: Action) -> bool {
        let now = Instant::now();
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return true,
                Action::Left if self.menu_state.current_tab == MenuTab::Mode => {
                    self.menu_state.selected_mode = match self.menu_state.selected_mode {
                        GameMode::Moves => GameMode::Endless,
                        GameMode::Timed => GameMode::Moves,
                        GameMode::Endless => GameMode::Timed,
                    };
                }
                Action::Right if self.menu_state.current_tab == MenuTab::Mode => {
                    self.menu_state.selected_mode = match self.menu_state.selected_mode {
                        GameMode::Moves => GameMode::Timed,
                        GameMode::Timed => GameMode::Endless,
                        GameMode::Endless => GameMode::Moves,
                    };
                }
                Action::Up | Action::Down => {
                    self.menu_state.current_tab = match self.menu_state.current_tab {
                        MenuTab::Mode => MenuTab::Start,
                        MenuTab::Start => MenuTab::Mode,
                    };
                }
                Action::Confirm => {
                    if self.menu_state.current_tab == MenuTab::Start {
                        self.start_game(self.menu_state.selected_mode);
                    } else {
                        self.menu_state.current_tab = MenuTab::Start;
                    }
                }
                _ => {}
            },
            Screen::Playing => {
                if self.paused {
                    match action {
                        Action::Pause => {
                            self.paused = false;
                            if let Some(cd) = &mut self.countdown {
                                cd.play(now);
                            }
                        }
                        Action::Quit => self.open_quit_menu(),
                        _ => {}
                    }
                } else {
                    match action {
                        Action::Pause => {
                            self.paused = true;
                            if let Some(cd) = &mut self.countdown {
                                cd.pause();
                            }
                        }
                        Action::Quit => self.open_quit_menu(),
                        Action::PowerExtra => self.arm_power(PowerUp::Extra, now),
                        Action::PowerShrink => self.arm_power(PowerUp::Shrinker, now),
                        Action::PowerExpand => self.arm_power(PowerUp::Expander, now),
                        _ => {}
                    }
                }
            }
            Screen::QuitMenu => match action {
                Action::Down | Action::Right => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::MainMenu,
                        QuitOption::MainMenu => QuitOption::Exit,
                        QuitOption::Exit => QuitOption::Resume,
                    };
                }
                Action::Up | Action::Left => {
                    self.quit_selected = match self.quit_selected {
                        QuitOption::Resume => QuitOption::Exit,
                        QuitOption::MainMenu => QuitOption::Resume,
                        QuitOption::Exit => QuitOption::MainMenu,
                    };
                }
                Action::Confirm => match self.quit_selected {
                    QuitOption::Resume => self.resume_from_quit_menu(now),
                    QuitOption::MainMenu => {
                        self.save_score_once();
                        self.best_score = scores::best_score();
                        self.games_played = scores::all_scores().len();
                        self.screen = Screen::Menu;
                    }
                    QuitOption::Exit => {
                        self.save_score_once();
                        return true;
                    }
                },
                Action::Pause | Action::Quit => self.resume_from_quit_menu(now),
                _ => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return true,
                Action::Restart | Action::Confirm => {
                    let mode = self.state.session.mode();
                    self.start_game(mode);
                }
                _ => {}
            },
        }
        false
    }

    fn open_quit_menu(&mut self) {
        self.screen = Screen::QuitMenu;
        self.quit_selected = QuitOption::Resume;
        if let Some(cd) = &mut self.countdown {
            cd.pause();
        }
    }

    fn resume_from_quit_menu(&mut self, now: Instant) {
        self.screen = Screen::Playing;
        if !self.paused {
            if let Some(cd) = &mut self.countdown {
                if !cd.is_playing() {
                    cd.play(now);
                }
            }
        }
    }

    fn arm_power(&mut self, power: PowerUp, now: Instant) {
        if let ArmEffect::PauseTimer(ms) = self.state.arm(power) {
            if let Some(cd) = &mut self.countdown {
                cd.pause_for(Duration::from_millis(ms), now);
            }
        }
    }

    fn on_pointer(&mut self, pointer: Pointer) {
        if self.screen != Screen::Playing || self.paused {
            return;
        }
        match pointer {
            Pointer::Down { x, y } | Pointer::Drag { x, y } => {
                let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
                let area = Rect::new(0, 0, cols, rows);
                let inner = crate::ui::board_inner_rect(area, self.config.width, self.config.height);
                // Above or left of the board there is no cell; the layout
                // rejects the far sides itself.
                if x < inner.x || y < inner.y {
                    return;
                }
                let rel_x = u32::from(x - inner.x);
                let rel_y = u32::from(y - inner.y);
                match pointer {
                    Pointer::Down { .. } => self.state.pointer_down(rel_x, rel_y),
                    Pointer::Drag { .. } => self.state.pointer_drag(rel_x, rel_y),
                    Pointer::Up => {}
                }
            }
            Pointer::Up => self.state.pointer_up(),
        }
        self.collect_events();
        if self.state.session.is_over() {
            self.end_game();
        }
    }

    /// Drain core events; colour changes restart the removal flash.
    fn collect_events(&mut self) {
        let events = self.state.take_events();
        if !events.changed.is_empty() {
            self.flash_cells = events.changed.into_iter().map(|(i, _)| i).collect();
            self.flash_effect = None;
            self.flash_process_time = None;
        }
    }
}
