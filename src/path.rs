//! Path tracking: turns a drag gesture into grid removal operations.
//!
//! The tracker is an explicit state machine. A gesture starts a path, each
//! move sample may extend it, backtrack it, or close it into a loop, and
//! releasing commits the result. Selection highlighting is reported through
//! [`SelectionListener`] so the renderer stays a passive subscriber.

use crate::grid::{Grid, GridListener};

/// Receives selection-highlight updates as the path grows and shrinks.
pub trait SelectionListener {
    fn on_cell_selected(&mut self, index: usize, selected: bool);
}

impl SelectionListener for () {
    fn on_cell_selected(&mut self, _index: usize, _selected: bool) {}
}

impl SelectionListener for Vec<(usize, bool)> {
    fn on_cell_selected(&mut self, index: usize, selected: bool) {
        self.push((index, selected));
    }
}

/// Outcome of a finished gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Nothing removed (no path, or a single-cell path).
    None,
    /// An open path was removed; carries the number of cells.
    Path(usize),
    /// A closed loop removed every cell of the path's colour.
    Loop(usize),
}

impl Commit {
    /// Cells removed by this commit.
    pub fn removed(self) -> usize {
        match self {
            Self::None => 0,
            Self::Path(n) | Self::Loop(n) => n,
        }
    }
}

enum TrackerState {
    Idle,
    /// A path is being drawn; the list is non-empty, ordered, distinct,
    /// colour-consistent and 4-connected in sequence.
    Building(Vec<usize>),
    /// The path closed back on itself; it is now a region, not a line.
    ClosingLoop(Vec<usize>),
}

pub struct PathTracker {
    width: usize,
    state: TrackerState,
}

impl PathTracker {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            state: TrackerState::Idle,
        }
    }

    /// Begin a path at `index`. Ignored unless idle and the index is valid.
    pub fn start(&mut self, index: usize, grid: &Grid, sel: &mut impl SelectionListener) {
        if !matches!(self.state, TrackerState::Idle) || index >= grid.len() {
            return;
        }
        sel.on_cell_selected(index, true);
        self.state = TrackerState::Building(vec![index]);
    }

    /// Feed the cell under the pointer. Callers only invoke this when the
    /// pointer has entered a different cell than the previous sample (see
    /// [`HitTester`]). Invalid extensions are ignored, never errors.
    pub fn extend(&mut self, index: usize, grid: &Grid, sel: &mut impl SelectionListener) {
        let TrackerState::Building(path) = &mut self.state else {
            // Nothing to extend, or the loop already closed.
            return;
        };
        if index >= grid.len() {
            return;
        }
        let Some(&last) = path.last() else { return };

        let close = if !path.contains(&index) {
            if grid.color_at(index) == grid.color_at(last) && adjacent(index, last, self.width) {
                path.push(index);
                sel.on_cell_selected(index, true);
            }
            false
        } else if path.len() >= 2 && index != last {
            if index == path[path.len() - 2] {
                // Backtracking: drop the most recent cell.
                path.pop();
                sel.on_cell_selected(last, false);
                false
            } else {
                // Revisiting a non-terminal member: the path encloses a loop.
                grid.color_at(index) == grid.color_at(last) && adjacent(index, last, self.width)
            }
        } else {
            false
        };

        if close {
            if let TrackerState::Building(path) =
                std::mem::replace(&mut self.state, TrackerState::Idle)
            {
                self.state = TrackerState::ClosingLoop(path);
            }
        }
    }

    /// End the gesture: commit a loop or a path, or discard a single cell.
    pub fn finish<L>(&mut self, grid: &mut Grid, out: &mut L) -> Commit
    where
        L: GridListener + SelectionListener,
    {
        match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::Idle => Commit::None,
            TrackerState::ClosingLoop(path) => {
                for &i in &path {
                    out.on_cell_selected(i, false);
                }
                let color = grid.color_at(path[0]);
                Commit::Loop(grid.remove_color(color, out))
            }
            TrackerState::Building(path) => {
                for &i in &path {
                    out.on_cell_selected(i, false);
                }
                if path.len() >= 2 {
                    Commit::Path(grid.remove_path(path, out))
                } else {
                    Commit::None
                }
            }
        }
    }

    /// Drop the gesture without touching the grid: deselect everything and
    /// return to idle. Used when the session ends mid-drag.
    pub fn abort(&mut self, sel: &mut impl SelectionListener) {
        match std::mem::replace(&mut self.state, TrackerState::Idle) {
            TrackerState::Idle => {}
            TrackerState::Building(path) | TrackerState::ClosingLoop(path) => {
                for &i in &path {
                    sel.on_cell_selected(i, false);
                }
            }
        }
    }

    /// Cells currently in the path, in draw order.
    pub fn path(&self) -> &[usize] {
        match &self.state {
            TrackerState::Idle => &[],
            TrackerState::Building(path) | TrackerState::ClosingLoop(path) => path,
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.path().contains(&index)
    }

    /// True once the current gesture has closed into a loop.
    pub fn loop_pending(&self) -> bool {
        matches!(self.state, TrackerState::ClosingLoop(_))
    }
}

/// 4-connectivity with row-wrap exclusion: horizontal neighbours must not
/// span a row boundary; vertical neighbours differ by exactly one row.
/// Diagonals are never adjacent.
pub fn adjacent(a: usize, b: usize, width: usize) -> bool {
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    (hi - lo == 1 && hi % width != 0) || hi - lo == width
}

/// Pixel geometry of the drawn board, used to map pointer coordinates to
/// cell indices. Supplied by the rendering layer.
#[derive(Debug, Clone, Copy)]
pub struct CellLayout {
    pub cols: usize,
    pub rows: usize,
    pub width_px: u32,
    pub height_px: u32,
}

impl CellLayout {
    /// Cell index under board-relative pixel coordinates, or `None` when the
    /// point falls outside the board.
    pub fn cell_at(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width_px || y >= self.height_px {
            return None;
        }
        let col = self.cols * x as usize / self.width_px as usize;
        let row = self.rows * y as usize / self.height_px as usize;
        Some(col + self.cols * row)
    }
}

/// Wraps [`CellLayout`] and suppresses repeated samples inside the same
/// cell's hit region, so the tracker only sees cell transitions.
pub struct HitTester {
    layout: CellLayout,
    last: Option<usize>,
}

impl HitTester {
    pub fn new(layout: CellLayout) -> Self {
        Self { layout, last: None }
    }

    /// Returns the cell under `(x, y)` only when it differs from the last
    /// sampled cell. Out-of-board samples yield `None` and keep the last
    /// cell, so a drag that leaves and re-enters the board resumes cleanly.
    pub fn sample(&mut self, x: u32, y: u32) -> Option<usize> {
        let cell = self.layout.cell_at(x, y)?;
        if self.last == Some(cell) {
            return None;
        }
        self.last = Some(cell);
        Some(cell)
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::testing::SeqSource;

    fn grid_from(width: usize, height: usize, fill: &[u8]) -> Grid {
        assert!(fill.len() >= width * height);
        Grid::new(width, height, 6, Box::new(SeqSource::new(fill.to_vec())))
    }

    fn uniform_grid(width: usize, height: usize) -> Grid {
        grid_from(width, height, &vec![1; width * height])
    }

    #[test]
    fn adjacency_is_symmetric() {
        let w = 4;
        for a in 0..16 {
            for b in 0..16 {
                assert_eq!(adjacent(a, b, w), adjacent(b, a, w), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn adjacency_excludes_row_wrap_and_diagonals() {
        let w = 4;
        assert!(adjacent(0, 1, w));
        assert!(adjacent(0, 4, w));
        assert!(!adjacent(3, 4, w), "end of row 0 does not touch start of row 1");
        assert!(!adjacent(0, 5, w), "diagonal");
        assert!(!adjacent(2, 2, w), "self");
    }

    #[test]
    fn extend_appends_matching_neighbour() {
        let g = uniform_grid(3, 3);
        let mut t = PathTracker::new(3);
        let mut sel: Vec<(usize, bool)> = Vec::new();
        t.start(4, &g, &mut sel);
        t.extend(5, &g, &mut sel);
        assert_eq!(t.path(), &[4, 5]);
        assert_eq!(sel, vec![(4, true), (5, true)]);
    }

    #[test]
    fn extend_ignores_wrong_color_and_non_adjacent() {
        let g = grid_from(3, 3, &[1, 2, 1, 1, 1, 1, 1, 1, 1]);
        let mut t = PathTracker::new(3);
        t.start(0, &g, &mut ());
        t.extend(1, &g, &mut ()); // different colour
        t.extend(6, &g, &mut ()); // not adjacent
        assert_eq!(t.path(), &[0]);
    }

    #[test]
    fn extend_without_start_is_a_noop() {
        let g = uniform_grid(3, 3);
        let mut t = PathTracker::new(3);
        t.extend(4, &g, &mut ());
        assert_eq!(t.path(), &[] as &[usize]);
    }

    #[test]
    fn backtrack_pops_to_second_to_last() {
        let g = uniform_grid(3, 3);
        let mut t = PathTracker::new(3);
        let mut sel: Vec<(usize, bool)> = Vec::new();
        t.start(4, &g, &mut sel);
        t.extend(5, &g, &mut sel);
        t.extend(4, &g, &mut sel);
        assert_eq!(t.path(), &[4]);
        assert_eq!(sel, vec![(4, true), (5, true), (5, false)]);
        // Re-extending restores the popped cell.
        t.extend(5, &g, &mut sel);
        assert_eq!(t.path(), &[4, 5]);
    }

    #[test]
    fn ring_closure_sets_loop_without_growing_path() {
        // Colour 2 at 0, 1, 3, 4 (a ring) and at 8; colour 1 elsewhere.
        let fill = [2, 2, 1, 2, 2, 1, 1, 1, 2];
        let g = grid_from(3, 3, &fill);
        let mut t = PathTracker::new(3);
        t.start(0, &g, &mut ());
        t.extend(1, &g, &mut ());
        t.extend(4, &g, &mut ());
        t.extend(3, &g, &mut ());
        assert!(!t.loop_pending());
        t.extend(0, &g, &mut ());
        assert!(t.loop_pending());
        assert_eq!(t.path().len(), 4);
    }

    #[test]
    fn finished_loop_clears_the_whole_color() {
        let fill = [2, 2, 1, 2, 2, 1, 1, 1, 2];
        let mut g = grid_from(3, 3, &fill);
        let mut t = PathTracker::new(3);
        t.start(0, &g, &mut ());
        t.extend(1, &g, &mut ());
        t.extend(4, &g, &mut ());
        t.extend(3, &g, &mut ());
        t.extend(0, &g, &mut ());
        let mut log = FinishLog::default();
        let commit = t.finish(&mut g, &mut log);
        // Cell 8 shared the colour without being on the ring.
        assert_eq!(commit, Commit::Loop(5));
        assert!(!t.loop_pending());
        assert_eq!(t.path(), &[] as &[usize]);
        for i in 0..g.len() {
            assert_ne!(g.color_at(i), 2, "colour 2 cleared everywhere");
        }
    }

    #[test]
    fn extend_after_closure_is_ignored() {
        let fill = [2, 2, 2, 2, 2, 2, 1, 1, 1];
        let g = grid_from(3, 3, &fill);
        let mut t = PathTracker::new(3);
        t.start(0, &g, &mut ());
        t.extend(1, &g, &mut ());
        t.extend(4, &g, &mut ());
        t.extend(3, &g, &mut ());
        t.extend(0, &g, &mut ());
        assert!(t.loop_pending());
        t.extend(5, &g, &mut ());
        assert_eq!(t.path().len(), 4);
        assert!(t.loop_pending());
    }

    #[test]
    fn single_cell_finish_removes_nothing() {
        let mut g = uniform_grid(3, 3);
        let before: Vec<u8> = (0..9).map(|i| g.color_at(i)).collect();
        let mut t = PathTracker::new(3);
        let mut log = FinishLog::default();
        t.start(4, &g, &mut ());
        let commit = t.finish(&mut g, &mut log);
        assert_eq!(commit, Commit::None);
        assert!(log.changed.is_empty());
        assert_eq!(log.selected, vec![(4, false)]);
        let after: Vec<u8> = (0..9).map(|i| g.color_at(i)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn open_path_commit_removes_its_cells() {
        let mut g = uniform_grid(2, 2);
        let mut t = PathTracker::new(2);
        t.start(2, &g, &mut ());
        t.extend(3, &g, &mut ());
        let mut log = FinishLog::default();
        let commit = t.finish(&mut g, &mut log);
        assert_eq!(commit, Commit::Path(2));
        assert!(!log.changed.is_empty());
    }

    #[test]
    fn abort_discards_without_grid_mutation() {
        let mut g = uniform_grid(3, 3);
        let before: Vec<u8> = (0..9).map(|i| g.color_at(i)).collect();
        let mut t = PathTracker::new(3);
        let mut sel: Vec<(usize, bool)> = Vec::new();
        t.start(0, &g, &mut sel);
        t.extend(1, &g, &mut sel);
        t.abort(&mut sel);
        assert_eq!(t.path(), &[] as &[usize]);
        assert_eq!(sel, vec![(0, true), (1, true), (0, false), (1, false)]);
        let after: Vec<u8> = (0..9).map(|i| g.color_at(i)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn hit_test_maps_pixels_and_rejects_outside() {
        let layout = CellLayout {
            cols: 6,
            rows: 6,
            width_px: 60,
            height_px: 60,
        };
        assert_eq!(layout.cell_at(0, 0), Some(0));
        assert_eq!(layout.cell_at(9, 9), Some(0));
        assert_eq!(layout.cell_at(10, 0), Some(1));
        assert_eq!(layout.cell_at(0, 10), Some(6));
        assert_eq!(layout.cell_at(59, 59), Some(35));
        assert_eq!(layout.cell_at(60, 0), None);
        assert_eq!(layout.cell_at(0, 60), None);
    }

    #[test]
    fn hit_tester_suppresses_same_cell_samples() {
        let layout = CellLayout {
            cols: 2,
            rows: 1,
            width_px: 20,
            height_px: 10,
        };
        let mut h = HitTester::new(layout);
        assert_eq!(h.sample(1, 1), Some(0));
        assert_eq!(h.sample(3, 4), None);
        assert_eq!(h.sample(12, 1), Some(1));
        // Leaving the board keeps the last cell.
        assert_eq!(h.sample(25, 1), None);
        assert_eq!(h.sample(13, 2), None);
        h.reset();
        assert_eq!(h.sample(13, 2), Some(1));
    }

    /// Records both change streams for finish() assertions.
    #[derive(Default)]
    struct FinishLog {
        changed: Vec<(usize, u8)>,
        selected: Vec<(usize, bool)>,
    }

    impl GridListener for FinishLog {
        fn on_cell_changed(&mut self, index: usize, color: u8) {
            self.changed.push((index, color));
        }
    }

    impl SelectionListener for FinishLog {
        fn on_cell_selected(&mut self, index: usize, selected: bool) {
            self.selected.push((index, selected));
        }
    }
}
