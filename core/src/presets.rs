use alloc::vec::Vec;

use crate::*;

pub const PRESET_COUNT: u8 = 10;

const PRESET_SIDE: Coord = 6;

/// `(color id, first terminal, second terminal)` per flow, on a 6x6 grid.
const PRESETS: [&[(u8, CellIndex, CellIndex)]; PRESET_COUNT as usize] = [
    &[(1, 11, 22), (2, 20, 17), (3, 5, 31), (4, 7, 9), (5, 15, 35)],
    &[(1, 7, 28), (2, 9, 17), (3, 1, 15), (4, 5, 21)],
    &[(1, 25, 29), (2, 33, 35), (3, 0, 10), (4, 28, 1)],
    &[(1, 2, 35), (2, 13, 9), (3, 0, 12), (4, 25, 20), (5, 1, 27)],
    &[(1, 10, 14), (2, 28, 2), (3, 25, 5), (4, 34, 29), (5, 4, 19)],
    &[
        (1, 6, 10),
        (2, 25, 23),
        (3, 4, 11),
        (4, 18, 29),
        (5, 12, 21),
        (6, 7, 17),
    ],
    &[
        (1, 30, 13),
        (2, 7, 34),
        (3, 5, 35),
        (4, 21, 28),
        (5, 4, 22),
        (6, 24, 15),
    ],
    &[(1, 30, 16), (2, 1, 31), (3, 19, 28), (4, 25, 27), (5, 0, 10)],
    &[(1, 5, 28), (2, 21, 32), (3, 7, 11), (4, 13, 25)],
    &[
        (1, 20, 28),
        (2, 14, 16),
        (3, 0, 10),
        (4, 25, 33),
        (5, 6, 13),
        (6, 19, 32),
        (7, 2, 34),
    ],
];

/// Built-in level `number`, counted from 1.
pub fn preset(number: u8) -> Option<Level> {
    let flows = PRESETS.get(usize::from(number).checked_sub(1)?)?;
    let endpoints: Vec<_> = flows
        .iter()
        .flat_map(|&(id, first, second)| {
            let color = Color::from_id(id).unwrap_or_default();
            [Endpoint::new(first, color), Endpoint::new(second, color)]
        })
        .collect();

    match Level::new(PRESET_SIDE, PRESET_SIDE, endpoints) {
        Ok(level) => Some(level),
        Err(err) => {
            log::error!("preset {} is invalid: {}", number, err);
            None
        }
    }
}
