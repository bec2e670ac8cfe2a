//! A* route planner over the static obstacle grid.

use std::{cmp::Ordering, collections::BinaryHeap};

use glam::Vec3;
use grid_duel_core::{CellCoord, Direction, Grid, Route};

/// Order in which neighbours are expanded during the search.
const EXPANSION_ORDER: [Direction; 4] = [
    Direction::Right,
    Direction::Left,
    Direction::Forward,
    Direction::Back,
];

/// Plans a route between two world positions.
///
/// Both positions are projected onto the grid first. The returned route
/// excludes the start cell and ends on the goal cell's canonical world
/// position. `excluded` marks one cell as impassable for this search only,
/// typically the cell occupied by the opposing agent.
///
/// An empty route signals that no path exists: the start or goal lies off
/// the grid or on an obstacle, the goal equals `excluded`, or the goal is
/// unreachable.
#[must_use]
pub fn find_path(start: Vec3, goal: Vec3, grid: &Grid, excluded: CellCoord) -> Route {
    let (Some(start_cell), Some(goal_cell)) = (grid.cell_at(start), grid.cell_at(goal)) else {
        return Route::empty();
    };

    match find_cell_path(start_cell, goal_cell, grid, excluded) {
        Some(cells) => Route::new(
            cells
                .into_iter()
                .map(|cell| grid.world_position(cell))
                .collect(),
        ),
        None => Route::empty(),
    }
}

/// Cell-level counterpart of [`find_path`].
///
/// Returns the cells walked after leaving `start`, ending on `goal`, or
/// `None` when the goal is infeasible or unreachable. `start == goal` yields
/// an empty sequence.
#[must_use]
pub fn find_cell_path(
    start: CellCoord,
    goal: CellCoord,
    grid: &Grid,
    excluded: CellCoord,
) -> Option<Vec<CellCoord>> {
    if grid.is_blocked(start) || grid.is_blocked(goal) || goal == excluded {
        return None;
    }

    let mut search = Search::new(grid);
    search.run(start, goal, excluded)
}

/// Dense per-cell bookkeeping for a single search.
struct Search<'a> {
    grid: &'a Grid,
    g_scores: Vec<u32>,
    came_from: Vec<Option<CellCoord>>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenEntry>,
    sequence: u64,
}

impl<'a> Search<'a> {
    fn new(grid: &'a Grid) -> Self {
        let cells = grid.mask().len();
        Self {
            grid,
            g_scores: vec![u32::MAX; cells],
            came_from: vec![None; cells],
            closed: vec![false; cells],
            open: BinaryHeap::new(),
            sequence: 0,
        }
    }

    fn run(
        &mut self,
        start: CellCoord,
        goal: CellCoord,
        excluded: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        let start_index = self.grid.index(start)?;
        self.g_scores[start_index] = 0;
        self.push(start, 0, goal);

        while let Some(entry) = self.open.pop() {
            let Some(index) = self.grid.index(entry.cell) else {
                continue;
            };

            // Superseded by a cheaper entry pushed later.
            if self.closed[index] || entry.g != self.g_scores[index] {
                continue;
            }
            self.closed[index] = true;

            if entry.cell == goal {
                return Some(self.reconstruct(goal));
            }

            let next_g = entry.g.saturating_add(1);
            for direction in EXPANSION_ORDER {
                let Some(neighbor) = entry.cell.step(direction, self.grid.size()) else {
                    continue;
                };
                if neighbor == excluded || self.grid.is_blocked(neighbor) {
                    continue;
                }
                let Some(neighbor_index) = self.grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || next_g >= self.g_scores[neighbor_index] {
                    continue;
                }

                self.g_scores[neighbor_index] = next_g;
                self.came_from[neighbor_index] = Some(entry.cell);
                self.push(neighbor, next_g, goal);
            }
        }

        None
    }

    fn push(&mut self, cell: CellCoord, g: u32, goal: CellCoord) {
        let h = cell.manhattan_distance(goal);
        self.open.push(OpenEntry {
            cell,
            g,
            f: g.saturating_add(h),
            h,
            sequence: self.sequence,
        });
        self.sequence += 1;
    }

    fn reconstruct(&self, goal: CellCoord) -> Vec<CellCoord> {
        let mut cells = Vec::new();
        let mut current = goal;

        while let Some(previous) = self
            .grid
            .index(current)
            .and_then(|index| self.came_from[index])
        {
            cells.push(current);
            current = previous;
        }

        cells.reverse();
        cells
    }
}

/// Frontier entry ordered so that [`BinaryHeap`] pops the lowest f-score,
/// then the lowest heuristic, then the oldest insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct OpenEntry {
    cell: CellCoord,
    g: u32,
    f: u32,
    h: u32,
    sequence: u64,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.f, other.h, other.sequence).cmp(&(self.f, self.h, self.sequence))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
