use serde::{Deserialize, Serialize};

/// Player-side state of one cell. The adjacency count is cached in `Opened`
/// the moment the cell is opened.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Covered,
    Flagged,
    Opened(u8),
}

/// One board position: whether it holds a mine plus its player-side state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) mine: bool,
    pub(crate) state: CellState,
}

impl Cell {
    pub const fn is_mine(self) -> bool {
        self.mine
    }

    pub const fn state(self) -> CellState {
        self.state
    }

    pub const fn is_opened(self) -> bool {
        matches!(self.state, CellState::Opened(_))
    }

    pub const fn adjacent_mine_count(self) -> Option<u8> {
        match self.state {
            CellState::Opened(count) => Some(count),
            _ => None,
        }
    }

    pub const fn visibility(self) -> Visibility {
        match (self.state, self.mine) {
            (CellState::Covered, _) => Visibility::Covered,
            (CellState::Opened(_), _) => Visibility::Opened,
            (CellState::Flagged, false) => Visibility::FlaggedEmpty,
            (CellState::Flagged, true) => Visibility::FlaggedMine,
        }
    }
}

/// Four-state visibility tag: a flag is either on an empty cell or on a mine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Covered,
    Opened,
    FlaggedEmpty,
    FlaggedMine,
}

/// What the view layer draws for a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellView {
    Covered,
    Opened(u8),
    FlaggedEmpty,
    FlaggedMine,
    Detonated,
}

impl From<Cell> for CellView {
    fn from(cell: Cell) -> Self {
        match (cell.state, cell.mine) {
            (CellState::Covered, _) => Self::Covered,
            (CellState::Opened(_), true) => Self::Detonated,
            (CellState::Opened(count), false) => Self::Opened(count),
            (CellState::Flagged, false) => Self::FlaggedEmpty,
            (CellState::Flagged, true) => Self::FlaggedMine,
        }
    }
}
