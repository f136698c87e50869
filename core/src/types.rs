use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{GameError, Result};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

/// Neighbor list of a single cell, never longer than 8.
pub type Neighbors = SmallVec<[Coord2; 8]>;

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

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Fixed-size coordinate space, `[0, width) × [0, height)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridSize")]
pub struct Grid {
    width: Coord,
    height: Coord,
}

impl Grid {
    pub fn new((width, height): Coord2) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GameError::InvalidDimensions);
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> Coord {
        self.width
    }

    pub const fn height(&self) -> Coord {
        self.height
    }

    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.width, self.height)
    }

    pub const fn contains(&self, (x, y): Coord2) -> bool {
        x < self.width && y < self.height
    }

    pub fn validate(&self, coords: Coord2) -> Result<Coord2> {
        if self.contains(coords) {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    /// Up to 8 in-bounds neighbors of `coords`, clockwise starting north.
    pub fn neighbors(&self, coords: Coord2) -> Result<Neighbors> {
        let coords = self.validate(coords)?;
        Ok(self.iter_neighbors(coords).collect())
    }

    /// Unchecked variant of [`Grid::neighbors`] for coordinates already validated.
    pub(crate) fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    /// All coordinates in row-major order.
    pub fn iter_coords(&self) -> impl Iterator<Item = Coord2> + use<> {
        let (width, height) = self.size();
        (0..height).flat_map(move |y| (0..width).map(move |x| (x, y)))
    }
}

#[derive(Deserialize)]
struct GridSize {
    width: Coord,
    height: Coord,
}

impl TryFrom<GridSize> for Grid {
    type Error = GameError;

    fn try_from(size: GridSize) -> Result<Self> {
        Self::new((size.width, size.height))
    }
}

/// Shape of the `[x, y]`-indexed arrays backing a grid.
pub(crate) fn grid_dim(grid: Grid) -> (usize, usize) {
    (grid.width().into(), grid.height().into())
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx.try_into().ok()?)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy.try_into().ok()?)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    fn new(center: Coord2, bounds: Coord2) -> Self {
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
    use proptest::prelude::*;

    #[test]
    fn neighbors_run_clockwise_from_north() {
        let grid = Grid::new((3, 3)).unwrap();

        let neighbors = grid.neighbors((1, 1)).unwrap();

        assert_eq!(
            neighbors.as_slice(),
            &[
                (1, 0),
                (2, 0),
                (2, 1),
                (2, 2),
                (1, 2),
                (0, 2),
                (0, 1),
                (0, 0)
            ]
        );
    }

    #[test]
    fn corner_has_three_neighbors() {
        let grid = Grid::new((4, 3)).unwrap();

        assert_eq!(grid.neighbors((0, 0)).unwrap().as_slice(), &[(1, 0), (1, 1), (0, 1)]);
        assert_eq!(grid.neighbors((3, 2)).unwrap().len(), 3);
    }

    #[test]
    fn single_cell_grid_has_no_neighbors() {
        let grid = Grid::new((1, 1)).unwrap();

        assert!(grid.neighbors((0, 0)).unwrap().is_empty());
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let grid = Grid::new((4, 3)).unwrap();

        assert_eq!(grid.neighbors((4, 0)), Err(GameError::OutOfBounds));
        assert_eq!(grid.validate((0, 3)), Err(GameError::OutOfBounds));
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert_eq!(Grid::new((0, 5)), Err(GameError::InvalidDimensions));
        assert_eq!(Grid::new((5, 0)), Err(GameError::InvalidDimensions));
    }

    #[test]
    fn empty_grid_does_not_deserialize() {
        let restored: Grid = serde_json::from_str(r#"{"width": 3, "height": 2}"#).unwrap();
        assert_eq!(restored.size(), (3, 2));

        assert!(serde_json::from_str::<Grid>(r#"{"width": 0, "height": 2}"#).is_err());
    }

    #[test]
    fn iter_coords_is_row_major() {
        let grid = Grid::new((2, 2)).unwrap();

        let coords: Vec<_> = grid.iter_coords().collect();

        assert_eq!(coords, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    fn grid_and_cell() -> impl Strategy<Value = (Coord2, Coord2)> {
        (1..40u8, 1..40u8).prop_flat_map(|(width, height)| {
            (Just((width, height)), (0..width, 0..height))
        })
    }

    proptest! {
        #[test]
        fn neighbors_stay_in_bounds(((width, height), (x, y)) in grid_and_cell()) {
            let grid = Grid::new((width, height)).unwrap();

            let neighbors = grid.neighbors((x, y)).unwrap();

            prop_assert!(neighbors.len() <= 8);
            for &pos in &neighbors {
                prop_assert!(grid.contains(pos));
                prop_assert_ne!(pos, (x, y));
                prop_assert!(pos.0.abs_diff(x) <= 1 && pos.1.abs_diff(y) <= 1);
            }
            let mut sorted = neighbors.to_vec();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), neighbors.len());
        }
    }
}
