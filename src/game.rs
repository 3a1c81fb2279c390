//! Composition root: grid + path tracker + session, driven by pointer events.

use crate::GameConfig;
use crate::GameMode;
use crate::grid::{ColorSource, Grid, GridListener, Lcg};
use crate::path::{CellLayout, HitTester, PathTracker, SelectionListener};
use crate::session::{ArmEffect, PowerUp, Session};

/// Per-frame cell updates, drained by the app to drive the removal flash.
#[derive(Debug, Default)]
pub struct FrameEvents {
    pub changed: Vec<(usize, u8)>,
    pub selected: Vec<(usize, bool)>,
}

impl GridListener for FrameEvents {
    fn on_cell_changed(&mut self, index: usize, color: u8) {
        self.changed.push((index, color));
    }
}

impl SelectionListener for FrameEvents {
    fn on_cell_selected(&mut self, index: usize, selected: bool) {
        self.selected.push((index, selected));
    }
}

/// One game in progress. The app feeds it board-relative pointer samples,
/// countdown ticks and power-up keys; the renderer reads grid colours and
/// selection state back out and drains [`FrameEvents`] each frame.
pub struct GameState {
    pub grid: Grid,
    tracker: PathTracker,
    pub session: Session,
    hits: HitTester,
    events: FrameEvents,
}

impl GameState {
    pub fn new(mode: GameMode, config: &GameConfig, layout: CellLayout) -> Self {
        let source: Box<dyn ColorSource> = match config.seed {
            Some(seed) => Box::new(Lcg::new(seed)),
            None => Box::new(Lcg::from_clock()),
        };
        Self::with_source(mode, config, layout, source)
    }

    pub fn with_source(
        mode: GameMode,
        config: &GameConfig,
        layout: CellLayout,
        source: Box<dyn ColorSource>,
    ) -> Self {
        let width = config.width as usize;
        let height = config.height as usize;
        Self {
            grid: Grid::new(width, height, config.colors, source),
            tracker: PathTracker::new(width),
            session: Session::new(mode, config.moves, u64::from(config.time_limit) * 1000),
            hits: HitTester::new(layout),
            events: FrameEvents::default(),
        }
    }

    /// Gesture begins. With a power-up armed this is the tap that spends it;
    /// otherwise it opens a path.
    pub fn pointer_down(&mut self, x: u32, y: u32) {
        if self.session.is_over() {
            return;
        }
        self.hits.reset();
        let Some(index) = self.hits.sample(x, y) else {
            return;
        };
        if let Some(power) = self.session.take_armed() {
            self.power_tap(power, index);
            return;
        }
        self.tracker.start(index, &self.grid, &mut self.events);
    }

    /// Pointer moved during a gesture. Samples inside the last cell's hit
    /// region and samples outside the board are ignored.
    pub fn pointer_drag(&mut self, x: u32, y: u32) {
        if self.session.is_over() {
            return;
        }
        if let Some(index) = self.hits.sample(x, y) {
            self.tracker.extend(index, &self.grid, &mut self.events);
        }
    }

    /// Gesture ended: commit the path or loop, score the removals.
    pub fn pointer_up(&mut self) {
        self.hits.reset();
        if self.session.is_over() {
            self.tracker.abort(&mut self.events);
            return;
        }
        let commit = self.tracker.finish(&mut self.grid, &mut self.events);
        let removed = commit.removed();
        if removed > 0 {
            self.session.on_cells_removed(removed);
        }
    }

    fn power_tap(&mut self, power: PowerUp, index: usize) {
        let removed = match power {
            PowerUp::Shrinker => {
                self.grid.remove_cell(index, &mut self.events);
                1
            }
            PowerUp::Expander => {
                let color = self.grid.color_at(index);
                self.grid.remove_color(color, &mut self.events)
            }
            // Extra is consumed at arming and never reaches a tap.
            PowerUp::Extra => 0,
        };
        if removed > 0 {
            self.session.on_cells_removed(removed);
        }
    }

    pub fn arm(&mut self, power: PowerUp) -> ArmEffect {
        self.session.arm(power)
    }

    /// Forward a countdown tick; aborts any in-flight gesture when the
    /// session just ended.
    pub fn on_countdown_tick(&mut self, remaining_ms: u64) {
        if self.session.on_countdown_tick(remaining_ms).is_some() {
            self.tracker.abort(&mut self.events);
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.tracker.is_selected(index)
    }

    pub fn loop_pending(&self) -> bool {
        self.tracker.loop_pending()
    }

    pub fn take_events(&mut self) -> FrameEvents {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::testing::SeqSource;

    // 3x3 board, one colour, 10 px cells.
    fn test_game(mode: GameMode, moves: u32) -> GameState {
        let config = GameConfig {
            width: 3,
            height: 3,
            colors: 6,
            moves,
            time_limit: 60,
            seed: None,
        };
        let layout = CellLayout {
            cols: 3,
            rows: 3,
            width_px: 30,
            height_px: 30,
        };
        let source = SeqSource::new(vec![1; 9]);
        GameState::with_source(mode, &config, layout, Box::new(source))
    }

    #[test]
    fn drag_across_two_cells_commits_a_path() {
        let mut g = test_game(GameMode::Endless, 0);
        g.pointer_down(5, 5);
        g.pointer_drag(7, 5); // still cell 0
        g.pointer_drag(15, 5); // cell 1
        assert!(g.is_selected(0));
        assert!(g.is_selected(1));
        g.pointer_up();
        assert_eq!(g.session.score(), 2);
        assert_eq!(g.session.moves(), 1);
        let events = g.take_events();
        assert!(!events.changed.is_empty());
    }

    #[test]
    fn pointer_down_outside_board_is_ignored() {
        let mut g = test_game(GameMode::Endless, 0);
        g.pointer_down(35, 5);
        g.pointer_up();
        assert_eq!(g.session.score(), 0);
        assert_eq!(g.session.moves(), 0);
    }

    #[test]
    fn expander_tap_clears_the_tapped_color() {
        let mut g = test_game(GameMode::Endless, 0);
        g.arm(PowerUp::Expander);
        g.pointer_down(15, 15);
        assert_eq!(g.session.score(), 9);
        assert_eq!(g.session.moves(), 1);
        assert_eq!(g.session.armed(), None);
        // The tap did not open a path.
        g.pointer_up();
        assert_eq!(g.session.moves(), 1);
    }

    #[test]
    fn shrinker_tap_removes_one_cell() {
        let mut g = test_game(GameMode::Endless, 0);
        g.arm(PowerUp::Shrinker);
        g.pointer_down(5, 25);
        assert_eq!(g.session.score(), 1);
        assert_eq!(g.session.armed(), None);
    }

    #[test]
    fn gestures_stop_once_the_budget_is_spent() {
        let mut g = test_game(GameMode::Moves, 1);
        g.pointer_down(5, 5);
        g.pointer_drag(15, 5);
        g.pointer_up();
        assert!(g.session.is_over());
        let score = g.session.score();
        g.pointer_down(5, 25);
        g.pointer_drag(15, 25);
        g.pointer_up();
        assert_eq!(g.session.score(), score);
        assert_eq!(g.session.moves(), 1);
    }

    #[test]
    fn countdown_expiry_aborts_an_open_gesture() {
        let mut g = test_game(GameMode::Timed, 0);
        g.pointer_down(5, 5);
        g.pointer_drag(15, 5);
        g.on_countdown_tick(0);
        assert!(g.session.is_over());
        assert!(!g.is_selected(0));
        g.pointer_up();
        assert_eq!(g.session.score(), 0);
    }
}
