use rand::prelude::*;
use rand::rngs::StdRng;

use super::*;

/// Purely random generation that keeps the 3×3 block around the starting cell free.
///
/// Mines are sampled uniformly without replacement from the cells outside the
/// safe zone. Every placement derives its RNG from the seed and the number of
/// games placed so far, so resetting a session yields a new layout while a
/// fixed seed still replays the same sequence of games.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    games: u64,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed, games: 0 }
    }

    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }
}

impl Default for RandomMinefieldGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn place(
        &mut self,
        grid: Grid,
        mine_count: CellCount,
        safe_center: Coord2,
    ) -> Result<HashSet<Coord2>> {
        check_placement(grid, mine_count, safe_center)?;

        let mut candidates: Vec<Coord2> = grid
            .iter_coords()
            .filter(|&coords| !in_safe_zone(safe_center, coords))
            .collect();
        let wanted = usize::from(mine_count);
        if wanted > candidates.len() {
            return Err(GameError::InvalidMineCount);
        }

        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.games));
        self.games += 1;

        // partial Fisher-Yates, the first `wanted` slots end up as the sample
        for i in 0..wanted {
            let j = rng.random_range(i..candidates.len());
            candidates.swap(i, j);
        }
        candidates.truncate(wanted);

        Ok(candidates.into_iter().collect())
    }
}
