use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// A cell opened by one operation, with the adjacency count cached on it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedCell {
    pub coords: Coord2,
    pub adjacent_mines: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenResult {
    pub revealed: Vec<OpenedCell>,
    pub is_mine: bool,
}

impl OpenResult {
    pub fn is_empty(&self) -> bool {
        self.revealed.is_empty()
    }
}

/// Per-cell state of one board plus the counters the win check needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredCells")]
pub struct CellStore {
    grid: Grid,
    cells: Array2<Cell>,
    mine_count: CellCount,
    opened_safe: CellCount,
    flag_count: CellCount,
    flagged_mines: CellCount,
}

impl CellStore {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            cells: Array2::default(grid.size().to_nd_index()),
            mine_count: 0,
            opened_safe: 0,
            flag_count: 0,
            flagged_mines: 0,
        }
    }

    pub fn with_layout(layout: &MineLayout) -> Self {
        let mut store = Self::new(layout.grid());
        for coords in layout.iter_mines() {
            store.cells[coords.to_nd_index()].mine = true;
        }
        store.mine_count = layout.mine_count();
        store
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    pub fn flagged_mine_count(&self) -> CellCount {
        self.flagged_mines
    }

    pub fn all_safe_opened(&self) -> bool {
        self.opened_safe == self.grid.total_cells() - self.mine_count
    }

    pub fn cell(&self, coords: Coord2) -> Result<Cell> {
        let coords = self.grid.validate(coords)?;
        Ok(self.cell_at(coords))
    }

    pub fn visibility(&self, coords: Coord2) -> Result<Visibility> {
        self.cell(coords).map(Cell::visibility)
    }

    pub fn iter_mines(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.grid
            .iter_coords()
            .filter(|&coords| self.cell_at(coords).mine)
    }

    /// Mines among the neighbors of `coords`, flagged or not.
    pub fn adjacent_mine_count(&self, coords: Coord2) -> Result<u8> {
        let coords = self.grid.validate(coords)?;
        Ok(self.count_adjacent_mines(coords))
    }

    /// Opens a single covered cell. Opening an opened cell is a no-op with an
    /// empty result; a flag has to be removed before the cell can be opened.
    pub fn open(&mut self, coords: Coord2) -> Result<OpenResult> {
        let coords = self.grid.validate(coords)?;

        match self.cell_at(coords).state {
            CellState::Opened(_) => Ok(OpenResult::default()),
            CellState::Flagged => Err(GameError::CellFlagged),
            CellState::Covered => {
                let opened = self.reveal(coords);
                Ok(OpenResult {
                    revealed: opened.into_iter().collect(),
                    is_mine: self.cell_at(coords).mine,
                })
            }
        }
    }

    /// Cycles `Covered → Flagged → Covered` and returns the new visibility.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<Visibility> {
        let coords = self.grid.validate(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];

        match cell.state {
            CellState::Opened(_) => return Err(GameError::CellAlreadyOpen),
            CellState::Covered => {
                cell.state = CellState::Flagged;
                self.flag_count += 1;
                if cell.mine {
                    self.flagged_mines += 1;
                }
            }
            CellState::Flagged => {
                cell.state = CellState::Covered;
                self.flag_count -= 1;
                if cell.mine {
                    self.flagged_mines -= 1;
                }
            }
        }

        Ok(cell.visibility())
    }

    /// Opens the cell regardless of a flag on it, clearing the flag.
    /// Returns `None` when the cell was already open.
    pub(crate) fn reveal(&mut self, coords: Coord2) -> Option<OpenedCell> {
        let cell = self.cell_at(coords);
        match cell.state {
            CellState::Opened(_) => return None,
            CellState::Flagged => {
                self.flag_count -= 1;
                if cell.mine {
                    self.flagged_mines -= 1;
                }
            }
            CellState::Covered => {}
        }

        let adjacent_mines = self.count_adjacent_mines(coords);
        self.cells[coords.to_nd_index()].state = CellState::Opened(adjacent_mines);
        if !cell.mine {
            self.opened_safe += 1;
        }

        Some(OpenedCell {
            coords,
            adjacent_mines,
        })
    }

    /// Counters recomputed from the cells alone.
    fn recount(&mut self) {
        self.mine_count = 0;
        self.opened_safe = 0;
        self.flag_count = 0;
        self.flagged_mines = 0;
        for cell in &self.cells {
            match (cell.state, cell.mine) {
                (CellState::Opened(_), false) => self.opened_safe += 1,
                (CellState::Flagged, mine) => {
                    self.flag_count += 1;
                    self.flagged_mines += CellCount::from(mine);
                }
                _ => {}
            }
            self.mine_count += CellCount::from(cell.mine);
        }
    }

    pub(crate) fn cell_at(&self, coords: Coord2) -> Cell {
        self.cells[coords.to_nd_index()]
    }

    fn count_adjacent_mines(&self, coords: Coord2) -> u8 {
        self.grid
            .iter_neighbors(coords)
            .filter(|&pos| self.cell_at(pos).mine)
            .fold(0, |count, _| count + 1)
    }
}

#[derive(Deserialize)]
struct StoredCells {
    grid: Grid,
    cells: Array2<Cell>,
    mine_count: CellCount,
    opened_safe: CellCount,
    flag_count: CellCount,
    flagged_mines: CellCount,
}

impl TryFrom<StoredCells> for CellStore {
    type Error = GameError;

    fn try_from(stored: StoredCells) -> Result<Self> {
        if stored.cells.dim() != grid_dim(stored.grid) {
            return Err(GameError::InconsistentState("cell array does not match the grid"));
        }

        let mut store = Self::new(stored.grid);
        store.cells = stored.cells;
        store.recount();

        let counters = (
            stored.mine_count,
            stored.opened_safe,
            stored.flag_count,
            stored.flagged_mines,
        );
        if counters
            != (
                store.mine_count,
                store.opened_safe,
                store.flag_count,
                store.flagged_mines,
            )
        {
            return Err(GameError::InconsistentState("counters do not match the cells"));
        }
        Ok(store)
    }
}
