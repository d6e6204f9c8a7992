//! Grid encodings.
//!
//! Two forms with different strictness:
//!
//! - **Text** (storage): `0,1,0;1,1,1`. Rows separated by `;`, cells by `,`,
//!   one token per cell. Decoding is lenient: missing rows or cells are dead,
//!   surplus rows or cells are ignored, and any token other than `1` is dead.
//! - **Array** (wire): `Vec<Vec<bool>>`. Decoding is strict: every row must be
//!   as long as the first one.

use crate::grid::Grid;
use std::fmt;

pub const ALIVE_TOKEN: char = '1';
pub const DEAD_TOKEN: char = '0';
pub const CELL_DELIMITER: char = ',';
pub const ROW_DELIMITER: char = ';';

// =============================================================================
// TEXT FORM
// =============================================================================

/// Encode a grid as text. Total; a 0x0 grid encodes to `""`.
pub fn encode_text(grid: &Grid) -> String {
    // 2 chars per cell covers token + delimiter
    let mut out = String::with_capacity(grid.rows() * grid.columns() * 2);
    for (r, row) in grid.iter_rows().enumerate() {
        if r > 0 {
            out.push(ROW_DELIMITER);
        }
        for (c, &alive) in row.iter().enumerate() {
            if c > 0 {
                out.push(CELL_DELIMITER);
            }
            out.push(if alive { ALIVE_TOKEN } else { DEAD_TOKEN });
        }
    }
    out
}

/// Decode text into a `rows x columns` grid. Never fails.
pub fn decode_text(text: &str, rows: usize, columns: usize) -> Grid {
    let parsed: Vec<Vec<bool>> = if text.is_empty() {
        Vec::new()
    } else {
        text.split(ROW_DELIMITER)
            .take(rows)
            .map(|row| {
                row.split(CELL_DELIMITER)
                    .take(columns)
                    .map(is_alive_token)
                    .collect()
            })
            .collect()
    };

    Grid::from_fn(rows, columns, |row, column| {
        parsed
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or(false)
    })
}

#[inline]
fn is_alive_token(token: &str) -> bool {
    let mut chars = token.trim().chars();
    chars.next() == Some(ALIVE_TOKEN) && chars.next().is_none()
}

// =============================================================================
// ARRAY FORM
// =============================================================================

/// A row whose length differs from the first row's length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridShapeError {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for GridShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid row {} has {} cells, expected {} (all rows must match the first row)",
            self.row, self.actual, self.expected
        )
    }
}

impl std::error::Error for GridShapeError {}

/// Strictly decode a rectangular array of rows. An empty array is a 0x0 grid.
pub fn from_array_form(rows: &[Vec<bool>]) -> Result<Grid, GridShapeError> {
    let columns = rows.first().map_or(0, Vec::len);

    if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
        return Err(GridShapeError {
            row,
            expected: columns,
            actual: bad.len(),
        });
    }

    Ok(Grid::from_fn(rows.len(), columns, |row, column| rows[row][column]))
}

pub fn to_array_form(grid: &Grid) -> Vec<Vec<bool>> {
    grid.iter_rows().map(<[bool]>::to_vec).collect()
}
