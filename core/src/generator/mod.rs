use core::ops::Index;

use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;
pub use fixed::*;
pub use random::*;

mod fixed;
mod random;

/// Chooses where the mines go once the first cell has been opened.
pub trait MinefieldGenerator {
    /// Returns exactly `mine_count` distinct coordinates, none of them in the
    /// 3×3 safe zone centered on `safe_center`.
    fn place(
        &mut self,
        grid: Grid,
        mine_count: CellCount,
        safe_center: Coord2,
    ) -> Result<HashSet<Coord2>>;
}

/// Checks the preconditions every generator shares.
pub(crate) fn check_placement(
    grid: Grid,
    mine_count: CellCount,
    safe_center: Coord2,
) -> Result<()> {
    grid.validate(safe_center)?;
    if mine_count == 0 || mine_count > GameConfig::mine_limit(grid.size()) {
        return Err(GameError::InvalidMineCount);
    }
    Ok(())
}

/// Whether `coords` falls in the 3×3 block centered on `center`.
pub(crate) const fn in_safe_zone(center: Coord2, coords: Coord2) -> bool {
    center.0.abs_diff(coords.0) <= 1 && center.1.abs_diff(coords.1) <= 1
}

/// Mine positions of one game, kept as a dense mask for constant-time lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredLayout")]
pub struct MineLayout {
    grid: Grid,
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    fn empty(grid: Grid) -> Self {
        Self {
            grid,
            mine_mask: Array2::default(grid.size().to_nd_index()),
            mine_count: 0,
        }
    }

    pub fn from_mine_coords<I>(grid: Grid, mine_coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = Coord2>,
    {
        let mut layout = Self::empty(grid);

        for coords in mine_coords {
            let coords = grid.validate(coords)?;
            let slot = &mut layout.mine_mask[coords.to_nd_index()];
            if !*slot {
                *slot = true;
                layout.mine_count += 1;
            }
        }

        Ok(layout)
    }

    /// Runs `generator` and folds the result into a layout, checking that it
    /// honors the mine count and the safe zone.
    pub fn generate<G>(
        generator: &mut G,
        config: &GameConfig,
        safe_center: Coord2,
    ) -> Result<Self>
    where
        G: MinefieldGenerator + ?Sized,
    {
        let grid = config.validate()?;
        check_placement(grid, config.mines, safe_center)?;

        let mines = generator.place(grid, config.mines, safe_center)?;
        if mines.iter().any(|&coords| in_safe_zone(safe_center, coords)) {
            log::warn!("Generator put a mine next to the starting cell {safe_center:?}");
            return Err(GameError::InvalidMineCount);
        }

        let layout = Self::from_mine_coords(grid, mines)?;
        if layout.mine_count != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count,
                config.mines
            );
            return Err(GameError::InvalidMineCount);
        }

        log::debug!(
            "Placed {} mines on a {}x{} board around {:?}",
            layout.mine_count,
            grid.width(),
            grid.height(),
            safe_center
        );
        Ok(layout)
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.grid.iter_coords().filter(|&coords| self[coords])
    }
}

#[derive(Deserialize)]
struct StoredLayout {
    grid: Grid,
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl TryFrom<StoredLayout> for MineLayout {
    type Error = GameError;

    fn try_from(stored: StoredLayout) -> Result<Self> {
        if stored.mine_mask.dim() != grid_dim(stored.grid) {
            return Err(GameError::InconsistentState("mine mask does not match the grid"));
        }
        let mines = stored.mine_mask.iter().filter(|&&mine| mine).count();
        if mines != usize::from(stored.mine_count) {
            return Err(GameError::InconsistentState("mine count does not match the mask"));
        }
        Ok(Self {
            grid: stored.grid,
            mine_mask: stored.mine_mask,
            mine_count: stored.mine_count,
        })
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.mine_mask[(x as usize, y as usize)]
    }
}
