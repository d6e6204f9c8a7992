//! Dense boolean grid.
//!
//! Cells are stored row-major in a flat `Vec<bool>`, indexed by
//! `row * columns + column`. A grid is never resized; every transition
//! produces a fresh grid (see `rules::step`).

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    columns: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// All-dead grid of the given shape.
    pub fn dead(rows: usize, columns: usize) -> Self {
        Grid {
            rows,
            columns,
            cells: vec![false; rows * columns],
        }
    }

    /// Grid whose cell at `(row, column)` is `f(row, column)`.
    pub fn from_fn(rows: usize, columns: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut cells = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                cells.push(f(row, column));
            }
        }
        Grid { rows, columns, cells }
    }

    /// Dead grid with the listed `(row, column)` cells alive.
    /// Coordinates outside the grid are ignored.
    pub fn with_alive(rows: usize, columns: usize, alive: &[(usize, usize)]) -> Self {
        let mut grid = Grid::dead(rows, columns);
        for &(row, column) in alive {
            if row < rows && column < columns {
                let i = grid.idx(row, column);
                grid.cells[i] = true;
            }
        }
        grid
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    fn idx(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Cell state, or `false` outside the grid.
    #[inline]
    pub fn is_alive(&self, row: usize, column: usize) -> bool {
        row < self.rows && column < self.columns && self.cells[self.idx(row, column)]
    }

    /// Row-major view of all cells.
    #[cfg(test)]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Iterate rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.rows).map(move |row| {
            let start = row * self.columns;
            &self.cells[start..start + self.columns]
        })
    }

    #[cfg(test)]
    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }
}
