use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::*;

/// Why a chord-open left the board untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordRejection {
    /// Chording only works on an opened cell.
    NotYetOpened,
    /// The correctly placed flags around the cell do not add up to its count yet.
    FlagMismatch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChordResult {
    Rejected(ChordRejection),
    /// A flag next to the cell sits on a non-mine. Chording through a wrong
    /// flag counts as detonating a mine.
    GameOver,
    Opened(Vec<OpenedCell>),
}

/// Flood-fill and chord-open over a borrowed [`CellStore`].
#[derive(Debug)]
pub struct RevealEngine<'a> {
    store: &'a mut CellStore,
}

impl<'a> RevealEngine<'a> {
    pub fn new(store: &'a mut CellStore) -> Self {
        Self { store }
    }

    /// Breadth-first expansion from `start`.
    ///
    /// Every dequeued cell opens its neighbors, skipping opened cells and cells
    /// flagged as mines; neighbors that turn out to have no adjacent mines are
    /// queued in turn. `start` itself is not opened here, only expanded. Cells
    /// come back in the order they were opened, which is non-decreasing in
    /// distance from `start`.
    pub fn flood_open(&mut self, start: Coord2) -> Result<Vec<OpenedCell>> {
        let start = self.store.grid().validate(start)?;
        let grid = self.store.grid();

        let mut opened = Vec::new();
        let mut to_visit = VecDeque::from([start]);

        while let Some(visit_coords) = to_visit.pop_front() {
            for pos in grid.iter_neighbors(visit_coords) {
                if matches!(
                    self.store.cell_at(pos).visibility(),
                    Visibility::Opened | Visibility::FlaggedMine
                ) {
                    continue;
                }

                let Some(cell) = self.store.reveal(pos) else {
                    continue;
                };
                opened.push(cell);

                if cell.adjacent_mines == 0 {
                    to_visit.push_back(pos);
                }
            }
        }

        log::trace!("Flood from {:?} opened {} cells", start, opened.len());
        Ok(opened)
    }

    /// Opens the unflagged neighbors of an opened cell once its flags are consistent.
    pub fn chord_open(&mut self, coords: Coord2) -> Result<ChordResult> {
        let cell = self.store.cell(coords)?;
        let Some(count) = cell.adjacent_mine_count() else {
            return Ok(ChordResult::Rejected(ChordRejection::NotYetOpened));
        };

        let mut wrong_flags = 0u8;
        let mut right_flags = 0u8;
        for pos in self.store.grid().iter_neighbors(coords) {
            match self.store.cell_at(pos).visibility() {
                Visibility::FlaggedEmpty => wrong_flags += 1,
                Visibility::FlaggedMine => right_flags += 1,
                Visibility::Covered | Visibility::Opened => {}
            }
        }

        Ok(if wrong_flags > 0 {
            log::debug!("Chord at {coords:?} ran into {wrong_flags} wrong flags");
            ChordResult::GameOver
        } else if right_flags == count {
            ChordResult::Opened(self.flood_open(coords)?)
        } else {
            ChordResult::Rejected(ChordRejection::FlagMismatch)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store(size: Coord2, mines: &[Coord2]) -> CellStore {
        let grid = Grid::new(size).unwrap();
        let layout = MineLayout::from_mine_coords(grid, mines.iter().copied()).unwrap();
        CellStore::with_layout(&layout)
    }

    fn open_and_flood(store: &mut CellStore, coords: Coord2) -> Vec<OpenedCell> {
        let mut opened = store.open(coords).unwrap().revealed;
        if opened[0].adjacent_mines == 0 {
            opened.extend(RevealEngine::new(store).flood_open(coords).unwrap());
        }
        opened
    }

    fn distance(a: Coord2, b: Coord2) -> u8 {
        a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
    }

    #[test]
    fn flood_opens_zero_region_and_its_border() {
        // column x = 2 is a wall of mines
        let mut store = store((5, 3), &[(2, 0), (2, 1), (2, 2)]);

        let opened = open_and_flood(&mut store, (0, 1));

        assert_eq!(opened.len(), 6);
        for y in 0..3 {
            assert!(store.cell_at((0, y)).is_opened());
            assert!(store.cell_at((1, y)).is_opened());
            assert!(!store.cell_at((3, y)).is_opened());
            assert!(!store.cell_at((4, y)).is_opened());
        }
        assert_eq!(store.cell_at((1, 1)).adjacent_mine_count(), Some(3));
    }

    #[test]
    fn flood_order_is_breadth_first() {
        let mut store = store((9, 9), &[(8, 8)]);

        let opened = open_and_flood(&mut store, (0, 0));

        assert_eq!(opened[0].coords, (0, 0));
        let distances: Vec<_> = opened
            .iter()
            .map(|cell| distance((0, 0), cell.coords))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(opened.len(), 80);
    }

    #[test]
    fn flood_skips_mine_flags_but_opens_wrong_flags() {
        let mut store = store((4, 4), &[(3, 3)]);
        store.toggle_flag((3, 3)).unwrap();
        store.toggle_flag((0, 3)).unwrap();

        open_and_flood(&mut store, (0, 0));

        assert_eq!(store.visibility((3, 3)).unwrap(), Visibility::FlaggedMine);
        assert_eq!(store.visibility((0, 3)).unwrap(), Visibility::Opened);
        assert_eq!(store.flag_count(), 1);
        assert!(store.all_safe_opened());
    }

    #[test]
    fn flood_rejects_out_of_bounds_start() {
        let mut store = store((3, 3), &[(0, 0)]);

        assert_eq!(
            RevealEngine::new(&mut store).flood_open((5, 5)),
            Err(GameError::OutOfBounds)
        );
    }

    #[test]
    fn chord_opens_remaining_neighbors_when_flags_match() {
        let mut store = store((3, 3), &[(0, 1), (2, 1)]);
        store.open((1, 1)).unwrap();
        store.toggle_flag((0, 1)).unwrap();
        store.toggle_flag((2, 1)).unwrap();

        let result = RevealEngine::new(&mut store).chord_open((1, 1)).unwrap();

        let opened = match result {
            ChordResult::Opened(opened) => opened,
            other => panic!("expected chord to open cells, got {other:?}"),
        };
        assert_eq!(opened.len(), 6);
        assert_eq!(store.cell_at((1, 0)).adjacent_mine_count(), Some(2));
        assert_eq!(store.cell_at((1, 2)).adjacent_mine_count(), Some(2));
        assert!(store.all_safe_opened());
    }

    #[test]
    fn chord_with_wrong_flag_is_game_over() {
        let mut store = store((3, 3), &[(0, 1)]);
        store.open((1, 1)).unwrap();
        store.toggle_flag((0, 1)).unwrap();
        store.toggle_flag((2, 2)).unwrap();
        let before = store.clone();

        let result = RevealEngine::new(&mut store).chord_open((1, 1)).unwrap();

        assert_eq!(result, ChordResult::GameOver);
        assert_eq!(store, before);
    }

    #[test]
    fn chord_with_missing_flags_changes_nothing() {
        let mut store = store((3, 3), &[(0, 1), (2, 1)]);
        store.open((1, 1)).unwrap();
        store.toggle_flag((0, 1)).unwrap();
        let before = store.clone();

        let result = RevealEngine::new(&mut store).chord_open((1, 1)).unwrap();

        assert_eq!(result, ChordResult::Rejected(ChordRejection::FlagMismatch));
        assert_eq!(store, before);
    }

    #[test]
    fn chord_on_covered_cell_is_rejected() {
        let mut store = store((3, 3), &[(0, 1)]);

        let result = RevealEngine::new(&mut store).chord_open((1, 1)).unwrap();

        assert_eq!(result, ChordResult::Rejected(ChordRejection::NotYetOpened));
    }

    /// Zero-count cells reachable from `start` through zero-count cells, plus
    /// every neighbor of those.
    fn expected_region(store: &CellStore, start: Coord2) -> Vec<Coord2> {
        let grid = store.grid();
        let mut zeros = vec![start];
        let mut stack = vec![start];
        while let Some(coords) = stack.pop() {
            for pos in grid.iter_neighbors(coords) {
                if !zeros.contains(&pos) && store.adjacent_mine_count(pos).unwrap() == 0 {
                    zeros.push(pos);
                    stack.push(pos);
                }
            }
        }

        let mut region = zeros.clone();
        for &coords in &zeros {
            region.extend(grid.iter_neighbors(coords));
        }
        region.sort();
        region.dedup();
        region
    }

    fn layout_strategy() -> impl Strategy<Value = (Coord2, Vec<Coord2>, Coord2)> {
        (3..12u8, 3..12u8).prop_flat_map(|(width, height)| {
            (
                Just((width, height)),
                proptest::collection::vec((0..width, 0..height), 0..20),
                (0..width, 0..height),
            )
        })
    }

    proptest! {
        #[test]
        fn flood_opens_exactly_the_zero_region_and_border(
            (size, mines, start) in layout_strategy()
        ) {
            // keep the start's 3x3 block clear, as the first open of a game does
            let mines: Vec<_> = mines
                .into_iter()
                .filter(|&(x, y)| x.abs_diff(start.0) > 1 || y.abs_diff(start.1) > 1)
                .collect();
            let mut store = store(size, &mines);
            let expected = expected_region(&store, start);

            let opened = open_and_flood(&mut store, start);

            let mut opened_coords: Vec<_> = opened.iter().map(|cell| cell.coords).collect();
            opened_coords.sort();
            let before_dedup = opened_coords.len();
            opened_coords.dedup();
            prop_assert_eq!(before_dedup, opened_coords.len());
            prop_assert_eq!(&opened_coords, &expected);
            for coords in store.grid().iter_coords() {
                prop_assert_eq!(
                    store.cell_at(coords).is_opened(),
                    expected.contains(&coords)
                );
            }
        }
    }
}
