use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Uniformly random dimensions, flow count and endpoint cells. The result is
/// always a valid level but not necessarily a solvable one.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLevelGenerator {
    seed: u64,
}

impl RandomLevelGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl LevelGenerator for RandomLevelGenerator {
    fn generate(self, config: GeneratorConfig) -> Level {
        let checked = GeneratorConfig::new(config.min_side, config.max_side, config.max_colors);
        if checked != config {
            log::warn!(
                "Generator config out of range, requested {:?} but using {:?}",
                config,
                checked
            );
        }

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let height = rng.random_range(checked.min_side..=checked.max_side);
        let width = rng.random_range(checked.min_side..=checked.max_side);
        let total_cells = mult(height, width);

        let cap = checked.color_cap(total_cells);
        let colors = rng.random_range((cap / 2).max(1)..=cap);

        // partial Fisher-Yates, the first `2 * colors` cells are the sample
        let mut cells: Vec<CellIndex> = (0..total_cells).collect();
        let picks = 2 * usize::from(colors);
        for i in 0..picks {
            let j = rng.random_range(i..cells.len());
            cells.swap(i, j);
        }

        let endpoints = Color::FLOWS
            .iter()
            .zip(cells[..picks].chunks_exact(2))
            .flat_map(|(&color, pair)| {
                [Endpoint::new(pair[0], color), Endpoint::new(pair[1], color)]
            })
            .collect();

        log::debug!(
            "generated {}x{} level with {} flows from seed {}",
            height,
            width,
            colors,
            self.seed
        );
        Level::new_unchecked(height, width, endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_level() {
        let config = GeneratorConfig::default();
        let a = RandomLevelGenerator::new(42).generate(config);
        let b = RandomLevelGenerator::new(42).generate(config);

        assert_eq!(a, b);
    }

    #[test]
    fn every_seed_gives_a_valid_level_within_bounds() {
        let config = GeneratorConfig::default();
        for seed in 0..500 {
            let level = RandomLevelGenerator::new(seed).generate(config);
            let (height, width) = level.size();

            assert!((config.min_side..=config.max_side).contains(&height));
            assert!((config.min_side..=config.max_side).contains(&width));
            assert!(level.flow_count() >= 1);
            assert!(level.flow_count() <= usize::from(level.total_cells() / 2));
            assert_eq!(
                Level::new(height, width, level.endpoints().to_vec()),
                Ok(level)
            );
        }
    }

    #[test]
    fn tiny_grids_stay_valid() {
        let config = GeneratorConfig::new(2, 2, 8);
        for seed in 0..100 {
            let level = RandomLevelGenerator::new(seed).generate(config);

            assert_eq!(level.size(), (2, 2));
            assert!((1..=2).contains(&level.flow_count()));
        }
    }

    #[test]
    fn out_of_range_config_is_clamped() {
        let level = RandomLevelGenerator::new(7).generate(GeneratorConfig::new_unchecked(1, 99, 0));

        assert!(level.height() >= GeneratorConfig::MIN_SIDE);
        assert!(level.width() <= MAX_SIDE);
        assert_eq!(level.flow_count(), 1);
    }
}
