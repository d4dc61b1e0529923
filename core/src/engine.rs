use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::ops::BitOr;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// What currently occupies a grid cell.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellStatus {
    #[default]
    Empty,
    /// Fixed flow terminal, never overwritten.
    Endpoint(Color),
    /// Cell covered by a flow, `order` steps away from where its path starts.
    PathSegment(Color, u16),
}

impl CellStatus {
    pub const fn color(self) -> Color {
        match self {
            Self::Empty => Color::None,
            Self::Endpoint(color) | Self::PathSegment(color, _) => color,
        }
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    #[default]
    InProgress,
    Solved,
}

impl EngineState {
    pub const fn is_solved(self) -> bool {
        matches!(self, Self::Solved)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    NoChange,
    Changed,
    /// The move completed the puzzle. Reported once per puzzle.
    Solved,
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        use MoveOutcome::*;
        match self {
            NoChange => false,
            Changed => true,
            Solved => true,
        }
    }
}

impl BitOr for MoveOutcome {
    type Output = MoveOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use MoveOutcome::*;
        match (self, rhs) {
            (Solved, _) | (_, Solved) => Solved,
            (Changed, _) | (_, Changed) => Changed,
            (NoChange, NoChange) => NoChange,
        }
    }
}

/// Drawn path of one flow, starting at one of its endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPath {
    cells: Vec<CellIndex>,
    complete: bool,
}

impl FlowPath {
    fn new(origin: CellIndex) -> Self {
        Self {
            cells: alloc::vec![origin],
            complete: false,
        }
    }

    pub fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    pub fn origin(&self) -> CellIndex {
        self.cells[0]
    }

    pub fn frontier(&self) -> CellIndex {
        self.cells[self.cells.len() - 1]
    }

    /// Cell drawn right before the frontier.
    pub fn previous(&self) -> Option<CellIndex> {
        self.cells.len().checked_sub(2).map(|i| self.cells[i])
    }

    /// Whether the path reaches the flow's other endpoint.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }
}

/// Result of grabbing a cell, see [`GridEngine::select`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grab {
    pub color: Color,
    pub outcome: MoveOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSnapshot {
    pub color: Color,
    pub cells: Vec<CellIndex>,
    pub complete: bool,
}

/// Everything a renderer or a move agent needs to know about a puzzle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub level: Level,
    /// Row-major cell statuses.
    pub cells: Vec<CellStatus>,
    pub paths: Vec<PathSnapshot>,
    pub state: EngineState,
}

/// Owns the mutable puzzle state and is the only thing that changes it.
///
/// Illegal moves are not errors: they leave the state untouched and report
/// [`MoveOutcome::NoChange`]. Once solved the engine stops accepting moves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridEngine {
    level: Level,
    board: Array2<CellStatus>,
    paths: BTreeMap<Color, FlowPath>,
    state: EngineState,
    revision: u64,
}

impl GridEngine {
    pub fn new(level: Level) -> Self {
        let board = Self::initial_board(&level);
        Self {
            level,
            board,
            paths: BTreeMap::new(),
            state: Default::default(),
            revision: 0,
        }
    }

    fn initial_board(level: &Level) -> Array2<CellStatus> {
        let mut board = Array2::default(level.size().to_nd_index());
        for endpoint in level.endpoints() {
            let coords = to_coords(endpoint.cell, level.width());
            board[coords.to_nd_index()] = CellStatus::Endpoint(endpoint.color);
        }
        board
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn size(&self) -> Coord2 {
        self.level.size()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_solved(&self) -> bool {
        self.state.is_solved()
    }

    /// Bumped on every accepted mutation, so renderers can tell when to redraw.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn cell(&self, index: CellIndex) -> Result<CellStatus> {
        let index = self.validate_cell(index)?;
        Ok(self.status(index))
    }

    pub fn cell_at(&self, coords: Coord2) -> CellStatus {
        self.board[coords.to_nd_index()]
    }

    /// Every cell with its status, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellIndex, CellStatus)> + '_ {
        (0..).zip(self.board.iter().copied())
    }

    pub fn path(&self, color: Color) -> Option<&FlowPath> {
        self.paths.get(&color)
    }

    pub fn paths(&self) -> impl Iterator<Item = (Color, &FlowPath)> {
        self.paths.iter().map(|(&color, path)| (color, path))
    }

    pub fn frontier(&self, color: Color) -> Option<CellIndex> {
        self.path(color).map(FlowPath::frontier)
    }

    pub fn is_complete(&self, color: Color) -> bool {
        self.path(color).is_some_and(FlowPath::is_complete)
    }

    /// Cells `color` could be extended onto right now, for drag hints.
    pub fn legal_steps(&self, color: Color) -> SmallVec<[CellIndex; 4]> {
        let Some(path) = self.path(color) else {
            return SmallVec::new();
        };
        if path.complete || self.state.is_solved() {
            return SmallVec::new();
        }

        let width = self.level.width();
        let origin = path.origin();
        self.board
            .iter_neighbors(self.coords(path.frontier()))
            .map(|coords| (to_index(coords, width), self.board[coords.to_nd_index()]))
            .filter(|&(cell, status)| match status {
                CellStatus::Empty => true,
                CellStatus::Endpoint(other) => other == color && cell != origin,
                CellStatus::PathSegment(..) => false,
            })
            .map(|(cell, _)| cell)
            .collect()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            level: self.level.clone(),
            cells: self.board.iter().copied().collect(),
            paths: self
                .paths()
                .map(|(color, path)| PathSnapshot {
                    color,
                    cells: path.cells.clone(),
                    complete: path.complete,
                })
                .collect(),
            state: self.state,
        }
    }

    /// Single-step path drawing for `color` towards `target`.
    ///
    /// Starts the path when `target` is one of the color's endpoints and there is
    /// no path yet, retracts when `target` is the cell before the frontier, and
    /// extends when `target` is adjacent to the frontier and either empty or the
    /// color's other endpoint. Anything else is rejected.
    pub fn extend_or_retract(&mut self, color: Color, target: CellIndex) -> Result<MoveOutcome> {
        use MoveOutcome::*;

        let target = self.validate_cell(target)?;
        if self.state.is_solved() {
            return Ok(NoChange);
        }
        let Some(terminals) = self.level.terminals(color) else {
            return Ok(NoChange);
        };

        if !self.paths.contains_key(&color) {
            if terminals.contains(&target) {
                self.paths.insert(color, FlowPath::new(target));
                log::debug!("{:?} path started at {}", color, target);
                return Ok(self.mark_changed());
            }
            return Ok(NoChange);
        }

        let path = &self.paths[&color];
        let (origin, frontier, previous) = (path.origin(), path.frontier(), path.previous());
        let (order, complete) = (path.len(), path.complete);
        if target == frontier {
            return Ok(NoChange);
        }
        if previous == Some(target) {
            self.retract(color);
            return Ok(self.mark_changed());
        }
        if complete || !is_adjacent(self.coords(frontier), self.coords(target)) {
            log::trace!("{:?} rejected step {} -> {}", color, frontier, target);
            return Ok(NoChange);
        }

        match self.status(target) {
            CellStatus::Empty => {
                self.set_status(target, CellStatus::PathSegment(color, order as u16));
                self.push(color, target, false);
                Ok(self.mark_changed())
            }
            CellStatus::Endpoint(other) if other == color && target != origin => {
                self.push(color, target, true);
                log::debug!("{:?} connected", color);
                Ok(self.mark_changed())
            }
            _ => {
                log::trace!("{:?} blocked at {}", color, target);
                Ok(NoChange)
            }
        }
    }

    /// Grabs the flow under `cell` the way a pointer press does.
    ///
    /// On an endpoint without a path this starts one; on the path's own origin
    /// it cuts the path back to the origin; on the opposite endpoint it restarts
    /// the path from there; on a path segment it cuts off everything after it.
    /// Returns `None` for empty cells.
    pub fn select(&mut self, cell: CellIndex) -> Result<Option<Grab>> {
        let cell = self.validate_cell(cell)?;
        if self.state.is_solved() {
            return Ok(None);
        }

        let (color, changed) = match self.status(cell) {
            CellStatus::Empty => return Ok(None),
            CellStatus::Endpoint(color) => {
                let origin = self.paths.get(&color).map(FlowPath::origin);
                if origin == Some(cell) {
                    (color, self.truncate(color, 1))
                } else {
                    self.clear(color);
                    self.paths.insert(color, FlowPath::new(cell));
                    (color, true)
                }
            }
            CellStatus::PathSegment(color, order) => {
                (color, self.truncate(color, usize::from(order) + 1))
            }
        };

        let outcome = if changed {
            log::debug!("{:?} grabbed at {}", color, cell);
            self.mark_changed()
        } else {
            MoveOutcome::NoChange
        };
        Ok(Some(Grab { color, outcome }))
    }

    /// Drops every drawn path, starting the puzzle over.
    pub fn reset(&mut self) {
        self.board = Self::initial_board(&self.level);
        self.paths.clear();
        self.state = EngineState::InProgress;
        self.revision += 1;
    }

    fn push(&mut self, color: Color, cell: CellIndex, complete: bool) {
        if let Some(path) = self.paths.get_mut(&color) {
            path.cells.push(cell);
            path.complete = complete;
        }
    }

    fn retract(&mut self, color: Color) {
        let Some(path) = self.paths.get_mut(&color) else {
            return;
        };
        if path.cells.len() < 2 {
            return;
        }
        let removed = path.cells.pop();
        path.complete = false;
        if let Some(cell) = removed {
            if matches!(self.status(cell), CellStatus::PathSegment(..)) {
                self.set_status(cell, CellStatus::Empty);
            }
        }
    }

    /// Cuts `color`'s path down to its first `len` cells.
    fn truncate(&mut self, color: Color, len: usize) -> bool {
        let mut changed = false;
        while self.paths.get(&color).is_some_and(|path| path.len() > len) {
            self.retract(color);
            changed = true;
        }
        changed
    }

    fn clear(&mut self, color: Color) {
        if self.paths.contains_key(&color) {
            self.truncate(color, 1);
            self.paths.remove(&color);
        }
    }

    fn mark_changed(&mut self) -> MoveOutcome {
        self.revision += 1;

        let all_connected = self
            .level
            .colors()
            .all(|color| self.is_complete(color));
        let covered = self.board.iter().all(|status| !status.is_empty());

        if all_connected && covered {
            self.state = EngineState::Solved;
            log::info!("puzzle solved");
            MoveOutcome::Solved
        } else {
            MoveOutcome::Changed
        }
    }

    fn validate_cell(&self, index: CellIndex) -> Result<CellIndex> {
        if index < self.level.total_cells() {
            Ok(index)
        } else {
            Err(EngineError::InvalidCell { index })
        }
    }

    fn coords(&self, index: CellIndex) -> Coord2 {
        to_coords(index, self.level.width())
    }

    fn status(&self, index: CellIndex) -> CellStatus {
        self.board[self.coords(index).to_nd_index()]
    }

    fn set_status(&mut self, index: CellIndex, status: CellStatus) {
        let coords = self.coords(index);
        self.board[coords.to_nd_index()] = status;
    }
}
