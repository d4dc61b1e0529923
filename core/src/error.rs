use thiserror::Error;

use crate::{CellIndex, Color};

/// A level that breaks one of the structural invariants.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum LevelError {
    #[error("Grid dimensions {height}x{width} are outside the supported range")]
    InvalidDimensions { height: u8, width: u8 },
    #[error("Cell {index} lies outside the grid")]
    CellOutOfRange { index: CellIndex },
    #[error("Endpoint at cell {index} has no color")]
    UncoloredEndpoint { index: CellIndex },
    #[error("Cell {index} holds more than one endpoint")]
    SharedCell { index: CellIndex },
    #[error("{color:?} appears {count} times, flows need exactly two endpoints")]
    EndpointMultiplicity { color: Color, count: usize },
    #[error("Level has no flows")]
    NoFlows,
}

/// Why a level token could not be turned back into a level.
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty level token")]
    Empty,
    #[error("Invalid symbol {symbol:?} at position {position}")]
    InvalidSymbol { position: usize, symbol: char },
    #[error("Level token ends early")]
    Truncated,
    #[error("Level token has trailing data")]
    TrailingData,
    #[error(transparent)]
    Invalid(#[from] LevelError),
}

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Cell {index} lies outside the grid")]
    InvalidCell { index: CellIndex },
}

pub type Result<T, E = EngineError> = core::result::Result<T, E>;
