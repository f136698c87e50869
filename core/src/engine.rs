use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Won,
    Lost,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No mines yet, the options can still be changed.
    #[default]
    Ready,
    Playing,
    Ended(GameOutcome),
}

impl SessionStatus {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_playing(self) -> bool {
        matches!(self, Self::Playing)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Ended(_))
    }
}

/// One cell whose visible state changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub coords: Coord2,
    pub view: CellView,
}

/// Delta returned by every move: the view re-renders these cells and nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub changes: Vec<CellChange>,
    pub status: SessionStatus,
    /// Set when a chord-open was refused without touching the board.
    pub rejection: Option<ChordRejection>,
}

impl Update {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// A single game, from the first click until it is won or lost.
///
/// Every move takes `&mut self`, so a session has one owner and a move always
/// completes before the next one can start.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "", deserialize = "G: Default"))]
#[serde(try_from = "SavedSession")]
pub struct GameSession<G = RandomMinefieldGenerator> {
    config: GameConfig,
    store: CellStore,
    layout: Option<MineLayout>,
    status: SessionStatus,
    #[serde(skip)]
    generator: G,
}

impl GameSession {
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::with_generator(config, RandomMinefieldGenerator::from_entropy())
    }
}

impl<G: MinefieldGenerator> GameSession<G> {
    pub fn with_generator(config: GameConfig, generator: G) -> Result<Self> {
        let grid = config.validate()?;
        Ok(Self {
            config,
            store: CellStore::new(grid),
            layout: None,
            status: SessionStatus::Ready,
            generator,
        })
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn grid(&self) -> Grid {
        self.store.grid()
    }

    /// Mine positions, known once the first cell has been opened.
    pub fn mine_layout(&self) -> Option<&MineLayout> {
        self.layout.as_ref()
    }

    pub fn flagged_mine_count(&self) -> CellCount {
        self.store.flagged_mine_count()
    }

    /// Mine counter shown to the player, negative when over-flagged.
    pub fn mines_left(&self) -> i32 {
        i32::from(self.config.mines) - i32::from(self.store.flag_count())
    }

    /// Whether the options form may change the board.
    pub fn can_configure(&self) -> bool {
        self.status.is_ready()
    }

    pub fn cell_view(&self, coords: Coord2) -> Result<CellView> {
        let cell = self.store.cell(coords)?;
        Ok(self.view_of(cell))
    }

    /// Every cell as the view should currently draw it, indexed `[x, y]`.
    pub fn snapshot(&self) -> Array2<CellView> {
        let mut views = Array2::from_elem(self.size().to_nd_index(), CellView::Covered);
        for coords in self.grid().iter_coords() {
            views[coords.to_nd_index()] = self.view_of(self.store.cell_at(coords));
        }
        views
    }

    /// Opens a cell. The first open of a session places the mines around it.
    pub fn open_cell(&mut self, coords: Coord2) -> Result<Update> {
        let coords = self.grid().validate(coords)?;
        log::trace!("open {coords:?}");

        match self.status {
            SessionStatus::Ended(_) => return Err(GameError::AlreadyEnded),
            SessionStatus::Ready => self.start(coords)?,
            SessionStatus::Playing => {}
        }

        let result = self.store.open(coords)?;
        if result.is_empty() {
            return Ok(self.update(Vec::new()));
        }
        if result.is_mine {
            log::debug!("Mine opened at {coords:?}");
            return Ok(self.lose(Vec::new()));
        }

        let mut opened = result.revealed;
        if opened[0].adjacent_mines == 0 {
            opened.extend(RevealEngine::new(&mut self.store).flood_open(coords)?);
        }
        Ok(self.settle(opened))
    }

    /// Chord-opens around an opened cell. A wrong flag next to it loses the game.
    pub fn chord_cell(&mut self, coords: Coord2) -> Result<Update> {
        let coords = self.grid().validate(coords)?;
        log::trace!("chord {coords:?}");
        self.check_playing()?;

        let result = RevealEngine::new(&mut self.store).chord_open(coords)?;
        Ok(match result {
            ChordResult::Rejected(rejection) => Update {
                rejection: Some(rejection),
                ..self.update(Vec::new())
            },
            ChordResult::GameOver => self.lose(Vec::new()),
            ChordResult::Opened(opened) => self.settle(opened),
        })
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<Update> {
        let coords = self.grid().validate(coords)?;
        log::trace!("flag {coords:?}");
        self.check_playing()?;

        let view = match self.store.toggle_flag(coords)? {
            Visibility::Covered => CellView::Covered,
            Visibility::FlaggedEmpty => CellView::FlaggedEmpty,
            Visibility::FlaggedMine => CellView::FlaggedMine,
            Visibility::Opened => return Err(GameError::CellAlreadyOpen),
        };

        self.check_won();
        Ok(self.update(vec![CellChange { coords, view }]))
    }

    /// Gives up the running game, ending it as a loss.
    pub fn forfeit(&mut self) -> Result<Update> {
        self.check_playing()?;
        log::debug!("Game given up");
        Ok(self.lose(Vec::new()))
    }

    /// Throws the board away and starts over in `Ready` with a new configuration.
    ///
    /// The delta covers every cell that was not covered before. When the board
    /// changes size, every cell of the new board is reported.
    pub fn reset(&mut self, config: GameConfig) -> Result<Update> {
        let grid = config.validate()?;
        log::debug!(
            "Reset to {}x{} with {} mines",
            grid.width(),
            grid.height(),
            config.mines
        );

        let resized = grid != self.grid();
        let previous = self.snapshot();

        self.config = config;
        self.store = CellStore::new(grid);
        self.layout = None;
        self.status = SessionStatus::Ready;

        let changes = grid
            .iter_coords()
            .filter(|&coords| resized || previous[coords.to_nd_index()] != CellView::Covered)
            .map(|coords| CellChange {
                coords,
                view: CellView::Covered,
            })
            .collect();
        Ok(self.update(changes))
    }

    fn start(&mut self, first_open: Coord2) -> Result<()> {
        let layout = MineLayout::generate(&mut self.generator, &self.config, first_open)?;
        self.store = CellStore::with_layout(&layout);
        self.layout = Some(layout);
        self.status = SessionStatus::Playing;
        Ok(())
    }

    /// Turns freshly opened cells into a delta and checks for the end of the game.
    fn settle(&mut self, opened: Vec<OpenedCell>) -> Update {
        let mut changes = Vec::with_capacity(opened.len());
        let mut hit_mine = false;
        for cell in opened {
            let mine = self.store.cell_at(cell.coords).is_mine();
            hit_mine |= mine;
            if !mine {
                changes.push(CellChange {
                    coords: cell.coords,
                    view: CellView::Opened(cell.adjacent_mines),
                });
            }
        }

        if hit_mine {
            return self.lose(changes);
        }

        self.check_won();
        self.update(changes)
    }

    /// Ends the game as lost and marks every mine, flagged or not, as detonated.
    fn lose(&mut self, mut changes: Vec<CellChange>) -> Update {
        self.status = SessionStatus::Ended(GameOutcome::Lost);
        changes.extend(self.store.iter_mines().map(|coords| CellChange {
            coords,
            view: CellView::Detonated,
        }));
        log::debug!("Game lost");
        self.update(changes)
    }

    /// Won once every mine carries a flag and every other cell is open.
    fn check_won(&mut self) {
        if self.store.flagged_mine_count() == self.config.mines && self.store.all_safe_opened() {
            self.status = SessionStatus::Ended(GameOutcome::Won);
            log::debug!("Game won");
        }
    }

    fn check_playing(&self) -> Result<()> {
        if self.status.is_playing() {
            Ok(())
        } else if self.status.is_ready() {
            Err(GameError::NotStarted)
        } else {
            Err(GameError::AlreadyEnded)
        }
    }

    fn update(&self, changes: Vec<CellChange>) -> Update {
        Update {
            changes,
            status: self.status,
            rejection: None,
        }
    }

    fn view_of(&self, cell: Cell) -> CellView {
        match self.status {
            SessionStatus::Ended(GameOutcome::Lost) if cell.is_mine() => CellView::Detonated,
            _ => cell.into(),
        }
    }
}

#[derive(Deserialize)]
struct SavedSession {
    config: GameConfig,
    store: CellStore,
    layout: Option<MineLayout>,
    status: SessionStatus,
}

impl<G: Default> TryFrom<SavedSession> for GameSession<G> {
    type Error = GameError;

    fn try_from(saved: SavedSession) -> Result<Self> {
        let grid = saved.config.validate()?;
        if saved.store.grid() != grid {
            return Err(GameError::InconsistentState("board does not match the config"));
        }

        match (&saved.layout, saved.status) {
            (None, SessionStatus::Ready) => {
                if saved.store != CellStore::new(grid) {
                    return Err(GameError::InconsistentState("unstarted game has moves"));
                }
            }
            (Some(layout), SessionStatus::Playing | SessionStatus::Ended(_)) => {
                if layout.grid() != grid
                    || layout.mine_count() != saved.config.mines
                    || !layout.iter_mines().eq(saved.store.iter_mines())
                {
                    return Err(GameError::InconsistentState("mines do not match the board"));
                }
            }
            _ => return Err(GameError::InconsistentState("status does not match the mines")),
        }

        Ok(Self {
            config: saved.config,
            store: saved.store,
            layout: saved.layout,
            status: saved.status,
            generator: G::default(),
        })
    }
}
