use serde::{Deserialize, Serialize};

use crate::*;
pub use random::*;

mod random;

pub trait LevelGenerator {
    fn generate(self, config: GeneratorConfig) -> Level;
}

/// Bounds a generator draws level dimensions and flow counts from.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub min_side: Coord,
    pub max_side: Coord,
    pub max_colors: u8,
}

impl GeneratorConfig {
    pub const MIN_SIDE: Coord = 2;

    pub const fn new_unchecked(min_side: Coord, max_side: Coord, max_colors: u8) -> Self {
        Self {
            min_side,
            max_side,
            max_colors,
        }
    }

    pub fn new(min_side: Coord, max_side: Coord, max_colors: u8) -> Self {
        let min_side = min_side.clamp(Self::MIN_SIDE, MAX_SIDE);
        let max_side = max_side.clamp(min_side, MAX_SIDE);
        let max_colors = max_colors.clamp(1, Color::FLOWS.len() as u8);
        Self::new_unchecked(min_side, max_side, max_colors)
    }

    /// Upper bound on flows for a grid with `total_cells` cells.
    pub fn color_cap(&self, total_cells: CellIndex) -> u8 {
        let cap = CellIndex::from(self.max_colors).min(total_cells / 2);
        cap as u8
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new_unchecked(5, 8, 8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_clamps_into_supported_ranges() {
        assert_eq!(
            GeneratorConfig::new(0, 40, 20),
            GeneratorConfig::new_unchecked(2, 16, 8)
        );
        assert_eq!(
            GeneratorConfig::new(9, 4, 0),
            GeneratorConfig::new_unchecked(9, 9, 1)
        );
    }

    #[test]
    fn color_cap_is_half_the_cells() {
        let config = GeneratorConfig::default();
        assert_eq!(config.color_cap(4), 2);
        assert_eq!(config.color_cap(5), 2);
        assert_eq!(config.color_cap(64), 8);
    }
}
