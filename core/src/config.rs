use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::*;

/// Level selected when nothing else was chosen.
pub const DEFAULT_LEVEL: &str = "easy";

/// One difficulty preset as found in the level document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub height: Coord,
    pub width: Coord,
    pub mines: CellCount,
}

impl Level {
    pub const fn new(width: Coord, height: Coord, mines: CellCount) -> Self {
        Self {
            height,
            width,
            mines,
        }
    }

    pub fn config(&self) -> Result<GameConfig> {
        GameConfig::new((self.width, self.height), self.mines)
    }
}

/// Difficulty presets keyed by name, e.g.
/// `{"easy": {"height": 10, "width": 10, "mines": 15}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelTable {
    levels: BTreeMap<String, Level>,
}

impl LevelTable {
    pub fn builtin() -> Self {
        Self {
            levels: BTreeMap::from([
                ("easy".into(), Level::new(10, 10, 15)),
                ("normal".into(), Level::new(16, 16, 40)),
                ("hard".into(), Level::new(30, 16, 99)),
            ]),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json)
            .map_err(|err| GameError::ConfigLoadFailed(err.to_string()))?;
        table.check()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let table: Self = serde_json::from_reader(reader)
            .map_err(|err| GameError::ConfigLoadFailed(err.to_string()))?;
        table.check()
    }

    pub fn get(&self, name: &str) -> Result<Level> {
        self.levels
            .get(name)
            .copied()
            .ok_or_else(|| GameError::UnknownLevel(name.into()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    fn check(self) -> Result<Self> {
        if self.levels.is_empty() {
            return Err(GameError::ConfigLoadFailed("no levels defined".into()));
        }
        for (name, level) in &self.levels {
            if let Err(err) = level.config() {
                return Err(GameError::ConfigLoadFailed(format!("level {name:?}: {err}")));
            }
        }
        if !self.levels.contains_key(DEFAULT_LEVEL) {
            log::warn!("Level table has no {DEFAULT_LEVEL:?} preset");
        }
        Ok(self)
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Result of the one-time level load at startup. A failed load is kept as a
/// message for the player instead of an error, the game then stays disabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelLoad {
    Ready(LevelTable),
    Unavailable { message: String },
}

impl LevelLoad {
    pub fn from_reader<R: Read>(reader: R) -> Self {
        LevelTable::from_reader(reader).into()
    }

    pub fn from_json_str(json: &str) -> Self {
        LevelTable::from_json_str(json).into()
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn levels(&self) -> Option<&LevelTable> {
        match self {
            Self::Ready(levels) => Some(levels),
            Self::Unavailable { .. } => None,
        }
    }
}

impl From<Result<LevelTable>> for LevelLoad {
    fn from(result: Result<LevelTable>) -> Self {
        match result {
            Ok(levels) => Self::Ready(levels),
            Err(err) => {
                log::warn!("Level configuration unavailable: {err}");
                Self::Unavailable {
                    message: err.to_string(),
                }
            }
        }
    }
}

/// State of the options form: a selected level whose values seed the custom
/// width, height, and mine fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsPanel {
    levels: LevelTable,
    level: String,
    width: Coord,
    height: Coord,
    mines: CellCount,
}

impl OptionsPanel {
    pub fn new(levels: LevelTable, level: &str) -> Result<Self> {
        let preset = levels.get(level)?;
        Ok(Self {
            levels,
            level: level.into(),
            width: preset.width,
            height: preset.height,
            mines: preset.mines,
        })
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn level(&self) -> &str {
        &self.level
    }

    pub fn width(&self) -> Coord {
        self.width
    }

    pub fn height(&self) -> Coord {
        self.height
    }

    pub fn mines(&self) -> CellCount {
        self.mines
    }

    /// The form is only editable before the first cell is opened.
    pub fn is_editable(status: SessionStatus) -> bool {
        status.is_ready()
    }

    /// Switches level and overwrites the custom fields with its preset.
    pub fn select_level(&mut self, level: &str) -> Result<GameConfig> {
        let preset = self.levels.get(level)?;
        self.level = level.into();
        self.width = preset.width;
        self.height = preset.height;
        self.mines = preset.mines;
        self.config()
    }

    pub fn set_width(&mut self, width: Coord) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: Coord) {
        self.height = height;
    }

    /// Stores the requested mine count clamped to what the current size allows.
    pub fn set_mines(&mut self, requested: i32) -> CellCount {
        self.mines = GameConfig::clamp_mines((self.width, self.height), requested);
        self.mines
    }

    pub fn config(&self) -> Result<GameConfig> {
        GameConfig::new((self.width, self.height), self.mines)
    }
}
