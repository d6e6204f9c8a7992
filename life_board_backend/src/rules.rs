//! Conway's Game of Life transition.
//!
//! Edges are hard boundaries: neighbors outside the grid are simply absent.
//! Every output cell is computed from the input grid only, so the update is
//! simultaneous.

use crate::grid::Grid;

/// Moore neighborhood as (row_delta, col_delta).
const NEIGHBOR_DELTAS: [(isize, isize); 8] = [
    (-1, -1), // NW
    (-1, 0),  // N
    (-1, 1),  // NE
    (0, -1),  // W
    (0, 1),   // E
    (1, -1),  // SW
    (1, 0),   // S
    (1, 1),   // SE
];

/// Number of live cells among the up-to-8 neighbors of `(row, column)`.
pub fn live_neighbors(grid: &Grid, row: usize, column: usize) -> u8 {
    let mut count = 0u8;
    for &(dr, dc) in &NEIGHBOR_DELTAS {
        let (Some(nr), Some(nc)) = (row.checked_add_signed(dr), column.checked_add_signed(dc)) else {
            continue;
        };
        // is_alive is false past the far edges
        if grid.is_alive(nr, nc) {
            count += 1;
        }
    }
    count
}

/// Fate of a single cell given its current state and live neighbor count.
#[inline]
pub fn next_cell_state(alive: bool, neighbors: u8) -> bool {
    matches!((alive, neighbors), (true, 2) | (true, 3) | (false, 3))
}

/// Compute the next generation. Pure: the input is never modified.
pub fn step(grid: &Grid) -> Grid {
    Grid::from_fn(grid.rows(), grid.columns(), |row, column| {
        next_cell_state(grid.is_alive(row, column), live_neighbors(grid, row, column))
    })
}
