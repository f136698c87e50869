use super::*;

/// Generation strategy that always hands out the same mine positions, for
/// replays and deterministic scenarios.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedMinefieldGenerator {
    mines: HashSet<Coord2>,
}

impl FixedMinefieldGenerator {
    pub fn new<I>(mines: I) -> Self
    where
        I: IntoIterator<Item = Coord2>,
    {
        Self {
            mines: mines.into_iter().collect(),
        }
    }
}

impl MinefieldGenerator for FixedMinefieldGenerator {
    fn place(
        &mut self,
        grid: Grid,
        mine_count: CellCount,
        safe_center: Coord2,
    ) -> Result<HashSet<Coord2>> {
        check_placement(grid, mine_count, safe_center)?;

        for &coords in &self.mines {
            grid.validate(coords)?;
        }

        if self.mines.len() != usize::from(mine_count)
            || self
                .mines
                .iter()
                .any(|&coords| in_safe_zone(safe_center, coords))
        {
            return Err(GameError::InvalidMineCount);
        }

        Ok(self.mines.clone())
    }
}
