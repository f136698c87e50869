use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Coordinates outside of the board")]
    OutOfBounds,
    #[error("Board width and height must be at least 1")]
    InvalidDimensions,
    #[error("Mine count must be between 1 and the cell count minus 9")]
    InvalidMineCount,
    #[error("Cell is flagged, remove the flag before opening it")]
    CellFlagged,
    #[error("Cell is already open")]
    CellAlreadyOpen,
    #[error("Game has not started yet, open a cell first")]
    NotStarted,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
    #[error("Could not load level configuration: {0}")]
    ConfigLoadFailed(String),
    #[error("Unknown level {0:?}")]
    UnknownLevel(String),
    #[error("Saved game is inconsistent: {0}")]
    InconsistentState(&'static str),
}

pub type Result<T> = core::result::Result<T, GameError>;
