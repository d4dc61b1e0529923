use ndarray::Array2;

/// Single coordinate axis used for grid height, width, rows and columns.
pub type Coord = u8;

/// Row-major cell address in `[0, height * width)`.
pub type CellIndex = u16;

/// Two-dimensional position `(row, col)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellIndex {
    let a = a as CellIndex;
    let b = b as CellIndex;
    a.saturating_mul(b)
}

/// Splits a row-major index into `(row, col)` for a grid `width` cells wide.
pub const fn to_coords(index: CellIndex, width: Coord) -> Coord2 {
    let width = width as CellIndex;
    ((index / width) as Coord, (index % width) as Coord)
}

pub const fn to_index((row, col): Coord2, width: Coord) -> CellIndex {
    row as CellIndex * width as CellIndex + col as CellIndex
}

/// Manhattan distance between two positions.
pub const fn distance(a: Coord2, b: Coord2) -> u16 {
    a.0.abs_diff(b.0) as u16 + a.1.abs_diff(b.1) as u16
}

/// Whether `a` and `b` share an edge (diagonals do not count).
pub const fn is_adjacent(a: Coord2, b: Coord2) -> bool {
    distance(a, b) == 1
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let (rows, cols) = self.dim();
        let bounds = (
            rows.try_into().unwrap_or(Coord::MAX),
            cols.try_into().unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, bounds)
    }
}

/// Up, left, right, down.
const DISPLACEMENTS: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (row, col) = coords;
    let (d_row, d_col) = delta;
    let (max_row, max_col) = bounds;

    let next_row = row.checked_add_signed(d_row.try_into().ok()?)?;
    if next_row >= max_row {
        return None;
    }

    let next_col = col.checked_add_signed(d_col.try_into().ok()?)?;
    if next_col >= max_col {
        return None;
    }

    Some((next_row, next_col))
}

/// Orthogonal neighbors of a position that lie inside `bounds` (`(height, width)`).
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if usize::from(self.index) >= DISPLACEMENTS.len() {
                return None;
            }

            let next_item =
                apply_delta(self.center, DISPLACEMENTS[self.index as usize], self.bounds);
            self.index += 1;

            if next_item.is_some() {
                return next_item;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn corner_has_two_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((0, 0), (3, 3)).collect();
        assert_eq!(neighbors, [(0, 1), (1, 0)]);
    }

    #[test]
    fn center_has_four_orthogonal_neighbors() {
        let neighbors: Vec<_> = NeighborIter::new((1, 1), (3, 3)).collect();
        assert_eq!(neighbors, [(0, 1), (1, 0), (1, 2), (2, 1)]);
    }

    #[test]
    fn index_and_coords_convert_row_major() {
        assert_eq!(to_coords(7, 3), (2, 1));
        assert_eq!(to_index((2, 1), 3), 7);
        assert_eq!(to_coords(0, 1), (0, 0));
    }

    #[test]
    fn diagonal_is_not_adjacent() {
        assert!(is_adjacent((0, 0), (0, 1)));
        assert!(is_adjacent((1, 0), (0, 0)));
        assert!(!is_adjacent((0, 0), (1, 1)));
        assert!(!is_adjacent((2, 2), (2, 2)));
        assert_eq!(distance((0, 0), (255, 255)), 510);
    }
}
