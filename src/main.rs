//! Blockstui — Dots-style block-linking puzzle game in the terminal.

mod app;
mod countdown;
mod game;
mod grid;
mod input;
mod path;
mod scores;
mod session;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};

/// Options that parameterize a game session.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub width: u16,
    pub height: u16,
    pub colors: u8,
    pub moves: u32,
    pub time_limit: u32,
    pub seed: Option<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = GameConfig {
        width: args.width.max(1),
        height: args.height.max(1),
        colors: args.colors.clamp(2, 6),
        moves: args.moves.max(1),
        time_limit: args.time_limit.max(1),
        seed: args.seed,
    };
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Dots-style block-linking puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "blockstui",
    version,
    about = "Dots-style block-linking puzzle in the terminal. Drag across same-coloured blocks to clear them; close a loop to clear the whole colour.",
    long_about = "Blockstui is a terminal puzzle game in the style of Dots.\n\n\
        Drag the mouse across adjacent blocks of one colour to link them; release to clear \
        the path. Link back into your own path to close a loop and clear every block of \
        that colour. Cleared blocks fall away, new ones drop in from the top.\n\n\
        MODES:\n  moves    30-move budget\n  timed    race a 60-second countdown\n  endless  no limit, play for score\n\n\
        CONTROLS:\n  Mouse drag  Link blocks   1/2/3      Power-ups\n  P           Pause         Q / Esc    Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Game mode: moves (move budget), timed (countdown), or endless.
    #[arg(short, long, default_value = "moves")]
    pub mode: GameMode,

    /// Board width in blocks.
    #[arg(long, default_value = "6", value_name = "COLS")]
    pub width: u16,

    /// Board height in blocks.
    #[arg(long, default_value = "6", value_name = "ROWS")]
    pub height: u16,

    /// Number of block colours in play (2-6).
    #[arg(short, long, default_value = "6", value_name = "N")]
    pub colors: u8,

    /// In mode 'moves': the move budget.
    #[arg(long, default_value = "30", value_name = "N")]
    pub moves: u32,

    /// In mode 'timed': time limit in seconds.
    #[arg(long, default_value = "60", value_name = "SECS")]
    pub time_limit: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Fixed seed for the colour generator (reproducible boards).
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Skip main menu and start the game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Disable the removal flash animation.
    #[arg(long)]
    pub no_animation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    #[default]
    Moves,
    Timed,
    Endless,
}
