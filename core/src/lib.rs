use serde::{Deserialize, Serialize};

pub use config::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use reveal::*;
pub use store::*;
pub use tile::*;
pub use types::*;

mod config;
mod engine;
mod error;
mod generator;
mod reveal;
mod store;
mod tile;
mod types;

/// Cells reserved around the first opened cell, which never hold a mine.
pub const SAFE_ZONE_CELLS: CellCount = 9;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    /// Validated configuration. The mine count is never adjusted: anything
    /// outside `1..=width*height - 9` is rejected.
    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<Grid> {
        let grid = Grid::new(self.size)?;
        if self.mines == 0 || self.mines > Self::mine_limit(self.size) {
            return Err(GameError::InvalidMineCount);
        }
        Ok(grid)
    }

    /// Largest mine count a board of `size` accepts.
    pub const fn mine_limit((size_x, size_y): Coord2) -> CellCount {
        mult(size_x, size_y).saturating_sub(SAFE_ZONE_CELLS)
    }

    /// Option-form clamp applied by callers before building a config: values
    /// below 1 become 1 and values above [`GameConfig::mine_limit`] become the limit.
    pub fn clamp_mines(size: Coord2, requested: i32) -> CellCount {
        let limit = Self::mine_limit(size).max(1);
        let clamped = requested.clamp(1, i32::from(limit));
        CellCount::try_from(clamped).unwrap_or(limit)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn safe_cell_count(&self) -> CellCount {
        self.total_cells().saturating_sub(self.mines)
    }
}
