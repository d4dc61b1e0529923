use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Pointer position in the same pixel space as [`BoardLayout`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerPos {
    pub x: f32,
    pub y: f32,
}

impl PointerPos {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Where the grid sits on screen.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub origin_x: f32,
    pub origin_y: f32,
    pub cell_size: f32,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            cell_size: 48.0,
        }
    }
}

/// In-progress drag, for drawing on top of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct DragOverlay {
    pub color: Color,
    pub cells: Vec<CellIndex>,
    pub pointer: PointerPos,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct DragSession {
    color: Color,
    last: CellIndex,
    pointer: PointerPos,
}

/// Turns a stream of pointer positions into single-step engine moves.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    size: Coord2,
    layout: BoardLayout,
    mode: Option<ModeSwitch>,
    session: Option<DragSession>,
}

impl PointerTracker {
    pub fn new(height: Coord, width: Coord, layout: BoardLayout) -> Self {
        Self {
            size: (height, width),
            layout,
            mode: None,
            session: None,
        }
    }

    pub fn for_engine(engine: &GridEngine, layout: BoardLayout) -> Self {
        let (height, width) = engine.size();
        Self::new(height, width, layout)
    }

    /// Ignores pointer input whenever `mode` is not [`PlayMode::Manual`].
    pub fn gated_by(mut self, mode: ModeSwitch) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn layout(&self) -> BoardLayout {
        self.layout
    }

    pub fn set_layout(&mut self, layout: BoardLayout) {
        self.layout = layout;
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn dragged_color(&self) -> Option<Color> {
        self.session.map(|session| session.color)
    }

    pub fn hit_test(&self, pos: PointerPos) -> Option<CellIndex> {
        let BoardLayout {
            origin_x,
            origin_y,
            cell_size,
        } = self.layout;
        if cell_size.is_nan() || cell_size <= 0.0 {
            return None;
        }

        let rel_x = (pos.x - origin_x) / cell_size;
        let rel_y = (pos.y - origin_y) / cell_size;
        if rel_x.is_nan() || rel_y.is_nan() || rel_x < 0.0 || rel_y < 0.0 {
            return None;
        }

        let (height, width) = self.size;
        let (row, col) = (rel_y as u32, rel_x as u32);
        if row >= u32::from(height) || col >= u32::from(width) {
            return None;
        }
        Some(to_index((row as Coord, col as Coord), width))
    }

    /// Starts a drag on the flow under `pos`, grabbing it in the engine.
    pub fn begin(&mut self, engine: &mut GridEngine, pos: PointerPos) -> MoveOutcome {
        self.session = None;
        if !self.accepts_input() {
            return MoveOutcome::NoChange;
        }
        let Some(cell) = self.hit_test(pos) else {
            return MoveOutcome::NoChange;
        };

        match engine.select(cell) {
            Ok(Some(grab)) => {
                log::trace!("drag started on {:?} at {}", grab.color, cell);
                self.session = Some(DragSession {
                    color: grab.color,
                    last: cell,
                    pointer: pos,
                });
                grab.outcome
            }
            Ok(None) => MoveOutcome::NoChange,
            Err(err) => {
                log::warn!("pointer hit outside the engine grid: {}", err);
                MoveOutcome::NoChange
            }
        }
    }

    /// Follows the pointer to `pos`, replaying every cell it skipped over.
    ///
    /// Leaving the grid abandons the drag; the path drawn so far stays.
    pub fn move_to(&mut self, engine: &mut GridEngine, pos: PointerPos) -> MoveOutcome {
        let Some(mut session) = self.session else {
            return MoveOutcome::NoChange;
        };
        if !self.accepts_input() {
            self.session = None;
            return MoveOutcome::NoChange;
        }
        let Some(cell) = self.hit_test(pos) else {
            log::debug!("pointer left the grid, drag abandoned");
            self.session = None;
            return MoveOutcome::NoChange;
        };

        session.pointer = pos;
        let mut outcome = MoveOutcome::NoChange;
        for step in self.steps(session.last, cell) {
            match engine.extend_or_retract(session.color, step) {
                Ok(step_outcome) => outcome = outcome | step_outcome,
                Err(err) => {
                    log::warn!("drag step rejected by engine: {}", err);
                    break;
                }
            }
        }

        session.last = cell;
        self.session = Some(session);
        outcome
    }

    /// Ends the drag. Returns whether one was active.
    pub fn end(&mut self) -> bool {
        self.session.take().is_some()
    }

    pub fn overlay(&self, engine: &GridEngine) -> Option<DragOverlay> {
        let session = self.session?;
        let cells = engine
            .path(session.color)
            .map(|path| path.cells().to_vec())
            .unwrap_or_default();
        Some(DragOverlay {
            color: session.color,
            cells,
            pointer: session.pointer,
        })
    }

    fn accepts_input(&self) -> bool {
        self.mode
            .as_ref()
            .is_none_or(|mode| mode.get() == PlayMode::Manual)
    }

    /// Shortest orthogonal walk from `from` to `to`, excluding `from`.
    ///
    /// Advances along whichever axis is further from the target, rows on ties,
    /// which keeps the walk close to the straight line the pointer travelled.
    fn steps(&self, from: CellIndex, to: CellIndex) -> SmallVec<[CellIndex; 8]> {
        let width = self.size.1;
        let (mut row, mut col) = to_coords(from, width);
        let (target_row, target_col) = to_coords(to, width);

        let mut steps = SmallVec::new();
        while (row, col) != (target_row, target_col) {
            if row.abs_diff(target_row) >= col.abs_diff(target_col) {
                row = if row < target_row { row + 1 } else { row - 1 };
            } else {
                col = if col < target_col { col + 1 } else { col - 1 };
            }
            steps.push(to_index((row, col), width));
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use Color::*;

    const LAYOUT: BoardLayout = BoardLayout {
        origin_x: 10.0,
        origin_y: 20.0,
        cell_size: 10.0,
    };

    fn engine(height: Coord, width: Coord, endpoints: &[(CellIndex, Color)]) -> GridEngine {
        let endpoints = endpoints
            .iter()
            .map(|&(cell, color)| Endpoint::new(cell, color))
            .collect();
        GridEngine::new(Level::new(height, width, endpoints).unwrap())
    }

    /// Center of `cell` in screen space, on a grid `width` cells wide.
    fn at(width: Coord, cell: CellIndex) -> PointerPos {
        let (row, col) = to_coords(cell, width);
        PointerPos::new(
            LAYOUT.origin_x + (f32::from(col) + 0.5) * LAYOUT.cell_size,
            LAYOUT.origin_y + (f32::from(row) + 0.5) * LAYOUT.cell_size,
        )
    }

    #[test]
    fn hit_test_maps_pixels_to_cells() {
        let tracker = PointerTracker::new(2, 3, LAYOUT);

        assert_eq!(tracker.hit_test(PointerPos::new(10.0, 20.0)), Some(0));
        assert_eq!(tracker.hit_test(PointerPos::new(19.9, 29.9)), Some(0));
        assert_eq!(tracker.hit_test(PointerPos::new(20.0, 20.0)), Some(1));
        assert_eq!(tracker.hit_test(PointerPos::new(35.0, 35.0)), Some(5));
        assert!(tracker.hit_test(PointerPos::new(9.9, 25.0)).is_none());
        assert!(tracker.hit_test(PointerPos::new(40.0, 25.0)).is_none());
        assert!(tracker.hit_test(PointerPos::new(15.0, 40.0)).is_none());
        assert!(tracker.hit_test(PointerPos::new(f32::NAN, 25.0)).is_none());
    }

    #[test]
    fn skipped_cells_are_replayed_one_step_at_a_time() {
        let tracker = PointerTracker::new(3, 3, LAYOUT);

        assert_eq!(tracker.steps(0, 6).as_slice(), [3, 6]);
        assert_eq!(tracker.steps(6, 0).as_slice(), [3, 0]);
        assert_eq!(tracker.steps(0, 8).as_slice(), [3, 4, 7, 8]);
        assert_eq!(tracker.steps(0, 2).as_slice(), [1, 2]);
        assert!(tracker.steps(4, 4).is_empty());
    }

    #[test]
    fn fast_drag_two_rows_down_extends_twice() {
        let mut engine = engine(3, 3, &[(0, Red), (8, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);

        tracker.begin(&mut engine, at(width, 0));
        let revision = engine.revision();
        let outcome = tracker.move_to(&mut engine, at(width, 6));

        assert_eq!(outcome, MoveOutcome::Changed);
        assert_eq!(engine.revision(), revision + 2);
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 3, 6]);
    }

    #[test]
    fn dragging_the_two_by_two_flow() {
        let mut engine = engine(2, 2, &[(0, Red), (3, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);

        assert_eq!(tracker.begin(&mut engine, at(width, 0)), MoveOutcome::Changed);
        tracker.move_to(&mut engine, at(width, 1));
        tracker.move_to(&mut engine, at(width, 3));
        assert!(tracker.end());

        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1, 3]);
        assert!(engine.is_complete(Red));
    }

    #[test]
    fn moving_back_retracts() {
        let mut engine = engine(1, 4, &[(0, Red), (3, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);

        tracker.begin(&mut engine, at(width, 0));
        tracker.move_to(&mut engine, at(width, 2));
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1, 2]);

        tracker.move_to(&mut engine, at(width, 0));
        assert_eq!(engine.path(Red).unwrap().cells(), [0]);
    }

    #[test]
    fn blocked_steps_leave_the_path_alone() {
        let mut engine = engine(3, 3, &[(0, Red), (2, Red), (3, Blue), (5, Blue)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);
        tracker.begin(&mut engine, at(width, 3));
        tracker.move_to(&mut engine, at(width, 4));
        tracker.end();

        tracker.begin(&mut engine, at(width, 0));
        tracker.move_to(&mut engine, at(width, 1));
        assert_eq!(tracker.move_to(&mut engine, at(width, 4)), MoveOutcome::NoChange);
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1]);

        // back on the frontier and onwards
        tracker.move_to(&mut engine, at(width, 1));
        assert_eq!(tracker.move_to(&mut engine, at(width, 2)), MoveOutcome::Changed);
        assert!(engine.is_complete(Red));
    }

    #[test]
    fn leaving_the_grid_abandons_the_drag() {
        let mut engine = engine(2, 2, &[(0, Red), (3, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);

        tracker.begin(&mut engine, at(width, 0));
        tracker.move_to(&mut engine, at(width, 1));
        tracker.move_to(&mut engine, PointerPos::new(500.0, 500.0));
        assert!(!tracker.is_dragging());

        assert_eq!(tracker.move_to(&mut engine, at(width, 3)), MoveOutcome::NoChange);
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1]);
        assert!(!tracker.end());
    }

    #[test]
    fn begin_needs_a_flow_under_the_pointer() {
        let mut engine = engine(2, 2, &[(0, Red), (3, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);

        assert_eq!(tracker.begin(&mut engine, at(width, 1)), MoveOutcome::NoChange);
        assert!(!tracker.is_dragging());
        assert_eq!(tracker.begin(&mut engine, PointerPos::new(0.0, 0.0)), MoveOutcome::NoChange);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn grabbing_a_segment_continues_from_there() {
        let mut engine = engine(3, 3, &[(0, Red), (8, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT);
        tracker.begin(&mut engine, at(width, 0));
        tracker.move_to(&mut engine, at(width, 2));
        tracker.move_to(&mut engine, at(width, 5));
        tracker.end();

        tracker.begin(&mut engine, at(width, 1));
        assert_eq!(tracker.dragged_color(), Some(Red));
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1]);

        tracker.move_to(&mut engine, at(width, 7));
        assert_eq!(engine.path(Red).unwrap().cells(), [0, 1, 4, 7]);
        let overlay = tracker.overlay(&engine).unwrap();
        assert_eq!(overlay.color, Red);
        assert_eq!(overlay.cells, vec![0, 1, 4, 7]);
        assert_eq!(overlay.pointer, at(width, 7));
    }

    #[test]
    fn bot_mode_disables_pointer_input() {
        let mode = ModeSwitch::new(PlayMode::Bot);
        let mut engine = engine(2, 2, &[(0, Red), (3, Red)]);
        let width = engine.size().1;
        let mut tracker = PointerTracker::for_engine(&engine, LAYOUT).gated_by(mode.clone());

        assert_eq!(tracker.begin(&mut engine, at(width, 0)), MoveOutcome::NoChange);
        assert!(engine.path(Red).is_none());

        mode.set(PlayMode::Manual);
        tracker.begin(&mut engine, at(width, 0));
        assert!(tracker.is_dragging());

        mode.set(PlayMode::Bot);
        assert_eq!(tracker.move_to(&mut engine, at(width, 1)), MoveOutcome::NoChange);
        assert!(!tracker.is_dragging());
        assert_eq!(engine.path(Red).unwrap().cells(), [0]);
    }
}
