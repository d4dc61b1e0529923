use alloc::vec;
use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Largest supported height or width.
pub const MAX_SIDE: Coord = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub cell: CellIndex,
    pub color: Color,
}

impl Endpoint {
    pub const fn new(cell: CellIndex, color: Color) -> Self {
        Self { cell, color }
    }
}

/// Unvalidated level data, used as the serde representation of [`Level`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelParts {
    pub height: Coord,
    pub width: Coord,
    pub endpoints: Vec<Endpoint>,
}

/// A puzzle instance: grid dimensions and the terminals of every flow.
///
/// Always satisfies the level invariants: both sides in `1..=MAX_SIDE`, every
/// flow color on exactly two distinct cells, no shared cells, at least one flow.
/// Endpoint order is kept as given and takes part in equality.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LevelParts", into = "LevelParts")]
pub struct Level {
    height: Coord,
    width: Coord,
    endpoints: Vec<Endpoint>,
}

impl Level {
    pub fn new(
        height: Coord,
        width: Coord,
        endpoints: Vec<Endpoint>,
    ) -> Result<Self, LevelError> {
        validate(height, width, &endpoints)?;
        Ok(Self {
            height,
            width,
            endpoints,
        })
    }

    pub(crate) fn new_unchecked(height: Coord, width: Coord, endpoints: Vec<Endpoint>) -> Self {
        debug_assert_eq!(validate(height, width, &endpoints), Ok(()));
        Self {
            height,
            width,
            endpoints,
        }
    }

    /// Builds a level from a row-major per-cell color listing, where
    /// `Color::None` marks a plain cell.
    pub fn from_cells(height: Coord, width: Coord, cells: &[Color]) -> Result<Self, LevelError> {
        if cells.len() != usize::from(mult(height, width)) {
            return Err(LevelError::InvalidDimensions { height, width });
        }

        let endpoints = cells
            .iter()
            .zip(0..)
            .filter(|(color, _)| color.is_flow())
            .map(|(&color, cell)| Endpoint::new(cell, color))
            .collect();
        Self::new(height, width, endpoints)
    }

    pub fn to_cells(&self) -> Vec<Color> {
        let mut cells = vec![Color::None; self.total_cells().into()];
        for endpoint in &self.endpoints {
            cells[usize::from(endpoint.cell)] = endpoint.color;
        }
        cells
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn size(&self) -> Coord2 {
        (self.height, self.width)
    }

    pub fn total_cells(&self) -> CellIndex {
        mult(self.height, self.width)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn flow_count(&self) -> usize {
        self.endpoints.len() / 2
    }

    /// Distinct flow colors in order of first appearance.
    pub fn colors(&self) -> impl Iterator<Item = Color> + '_ {
        self.endpoints
            .iter()
            .enumerate()
            .filter(|(i, endpoint)| {
                !self.endpoints[..*i]
                    .iter()
                    .any(|other| other.color == endpoint.color)
            })
            .map(|(_, endpoint)| endpoint.color)
    }

    /// Both terminal cells of `color`, in endpoint order.
    pub fn terminals(&self, color: Color) -> Option<[CellIndex; 2]> {
        let mut cells = self
            .endpoints
            .iter()
            .filter(|endpoint| endpoint.color == color)
            .map(|endpoint| endpoint.cell);
        Some([cells.next()?, cells.next()?])
    }

    pub fn color_at(&self, cell: CellIndex) -> Color {
        self.endpoints
            .iter()
            .find(|endpoint| endpoint.cell == cell)
            .map_or(Color::None, |endpoint| endpoint.color)
    }
}

impl TryFrom<LevelParts> for Level {
    type Error = LevelError;

    fn try_from(parts: LevelParts) -> Result<Self, Self::Error> {
        Self::new(parts.height, parts.width, parts.endpoints)
    }
}

impl From<Level> for LevelParts {
    fn from(level: Level) -> Self {
        Self {
            height: level.height,
            width: level.width,
            endpoints: level.endpoints,
        }
    }
}

fn validate(height: Coord, width: Coord, endpoints: &[Endpoint]) -> Result<(), LevelError> {
    let side_range = 1..=MAX_SIDE;
    if !side_range.contains(&height) || !side_range.contains(&width) {
        return Err(LevelError::InvalidDimensions { height, width });
    }
    if endpoints.is_empty() {
        return Err(LevelError::NoFlows);
    }

    let total_cells = mult(height, width);
    let mut occupied = vec![false; total_cells.into()];
    let mut counts = [0usize; Color::FLOWS.len() + 1];

    for &Endpoint { cell, color } in endpoints {
        if cell >= total_cells {
            return Err(LevelError::CellOutOfRange { index: cell });
        }
        if !color.is_flow() {
            return Err(LevelError::UncoloredEndpoint { index: cell });
        }
        if core::mem::replace(&mut occupied[usize::from(cell)], true) {
            return Err(LevelError::SharedCell { index: cell });
        }
        counts[usize::from(color.id())] += 1;
    }

    for color in Color::FLOWS {
        let count = counts[usize::from(color.id())];
        if count != 0 && count != 2 {
            return Err(LevelError::EndpointMultiplicity { color, count });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use Color::*;

    fn ep(cell: CellIndex, color: Color) -> Endpoint {
        Endpoint::new(cell, color)
    }

    #[test]
    fn accepts_two_by_two_single_flow() {
        let level = Level::new(2, 2, vec![ep(0, Red), ep(3, Red)]).unwrap();

        assert_eq!(level.total_cells(), 4);
        assert_eq!(level.flow_count(), 1);
        assert_eq!(level.terminals(Red), Some([0, 3]));
        assert_eq!(level.terminals(Blue), Option::None);
        assert_eq!(level.to_cells(), [Red, None, None, Red]);
    }

    #[test]
    fn rejects_empty_and_oversized_levels() {
        assert_eq!(Level::new(3, 3, vec![]), Err(LevelError::NoFlows));
        assert_eq!(
            Level::new(0, 3, vec![ep(0, Red), ep(1, Red)]),
            Err(LevelError::InvalidDimensions {
                height: 0,
                width: 3
            })
        );
        assert_eq!(
            Level::new(17, 3, vec![ep(0, Red), ep(1, Red)]),
            Err(LevelError::InvalidDimensions {
                height: 17,
                width: 3
            })
        );
    }

    #[test]
    fn rejects_bad_multiplicity() {
        assert_eq!(
            Level::new(3, 3, vec![ep(0, Red)]),
            Err(LevelError::EndpointMultiplicity {
                color: Red,
                count: 1
            })
        );
        assert_eq!(
            Level::new(3, 3, vec![ep(0, Red), ep(1, Red), ep(2, Red)]),
            Err(LevelError::EndpointMultiplicity {
                color: Red,
                count: 3
            })
        );
    }

    #[test]
    fn rejects_shared_and_out_of_range_cells() {
        assert_eq!(
            Level::new(2, 2, vec![ep(1, Red), ep(1, Blue)]),
            Err(LevelError::SharedCell { index: 1 })
        );
        assert_eq!(
            Level::new(2, 2, vec![ep(0, Red), ep(4, Red)]),
            Err(LevelError::CellOutOfRange { index: 4 })
        );
        assert_eq!(
            Level::new(2, 2, vec![ep(0, None), ep(1, None)]),
            Err(LevelError::UncoloredEndpoint { index: 0 })
        );
    }

    #[test]
    fn cell_listing_round_trips() {
        let cells = [Red, None, Blue, None, None, Blue, Red, None, None];
        let level = Level::from_cells(3, 3, &cells).unwrap();

        assert_eq!(level.to_cells(), cells);
        assert_eq!(level.colors().collect::<Vec<_>>(), [Red, Blue]);
        assert_eq!(level.color_at(5), Blue);
        assert_eq!(level.color_at(4), None);
        assert!(Level::from_cells(3, 3, &cells[..8]).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let json = r#"{"height":2,"width":2,"endpoints":[{"cell":0,"color":"Red"}]}"#;
        assert!(serde_json::from_str::<Level>(json).is_err());

        let level = Level::new(2, 2, vec![ep(0, Red), ep(3, Red)]).unwrap();
        let json = serde_json::to_string(&level).unwrap();
        assert_eq!(serde_json::from_str::<Level>(&json).unwrap(), level);
    }
}
