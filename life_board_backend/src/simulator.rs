//! Board simulation.
//!
//! Every operation reads the board once, runs all steps in memory, appends
//! one history entry per computed generation, and writes the board back
//! once at the end. Nothing here logs; callers get typed results and decide.

use crate::codec::{decode_text, encode_text, from_array_form, to_array_form};
use crate::grid::Grid;
use crate::rules::step;
use crate::storage::BoardStore;
use crate::types::{
    Board, BoardId, BoardState, HistoryEntry, HistoryView, LifeError, UploadBoardRequest,
    MAX_STABLE_ITERATIONS,
};
use crate::validation::{validate_board_id, validate_generation_count, validate_upload};

/// Outcome of `advance_to_stable`.
///
/// `state` is what the API returns; the other fields let the caller tell a
/// converged board from one that hit the iteration cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StableSearch {
    pub state: BoardState,
    pub iterations: u32,
    pub reached_fixed_point: bool,
}

pub struct Simulator<'s, S: BoardStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: BoardStore + ?Sized> Simulator<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Create a board at generation 0 from an uploaded grid.
    pub fn upload(&mut self, request: &UploadBoardRequest, id: BoardId, now: u64) -> Result<BoardState, LifeError> {
        let mut checks = validate_upload(request);
        checks.errors.extend(validate_board_id(&id).errors);
        checks.into_result()?;

        let rows = request.grid.as_deref().unwrap_or_default();
        let grid = from_array_form(rows)?;

        let board = self.store.create_board(Board {
            id,
            encoded_grid: encode_text(&grid),
            rows: request.rows,
            columns: request.columns,
            generation: 0,
            created_at_ns: now,
            last_modified_at_ns: now,
        })?;

        Ok(board_state(&board, &grid))
    }

    pub fn advance_one(&mut self, id: &BoardId, now: u64) -> Result<BoardState, LifeError> {
        self.advance_by(id, 1, now)
    }

    /// Advance `generations` steps (1..=100), recording every intermediate
    /// generation in history.
    pub fn advance_by(&mut self, id: &BoardId, generations: u32, now: u64) -> Result<BoardState, LifeError> {
        let mut checks = validate_board_id(id);
        checks.errors.extend(validate_generation_count(generations).errors);
        checks.into_result()?;

        let (mut board, mut grid) = self.load(id)?;

        for _ in 0..generations {
            grid = step(&grid);
            board.generation += 1;
            self.record(&board, &grid, now)?;
        }

        self.save(board, &grid, now)
    }

    /// Step until a generation equals the one before it, or until
    /// `MAX_STABLE_ITERATIONS` steps have run. At least one step always runs.
    ///
    /// Only a one-step fixed point is detected: an oscillator runs to the cap
    /// and its last state is returned as final.
    pub fn advance_to_stable(&mut self, id: &BoardId, now: u64) -> Result<StableSearch, LifeError> {
        validate_board_id(id).into_result()?;

        let (mut board, mut grid) = self.load(id)?;
        let mut iterations = 0u32;
        let mut reached_fixed_point = false;

        while iterations < MAX_STABLE_ITERATIONS {
            let next = step(&grid);
            iterations += 1;
            board.generation += 1;
            self.record(&board, &next, now)?;

            let unchanged = next == grid;
            grid = next;
            if unchanged {
                reached_fixed_point = true;
                break;
            }
        }

        let state = self.save(board, &grid, now)?;
        Ok(StableSearch {
            state,
            iterations,
            reached_fixed_point,
        })
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn board_state(&self, id: &BoardId) -> Result<BoardState, LifeError> {
        validate_board_id(id).into_result()?;
        let (board, grid) = self.load(id)?;
        Ok(board_state(&board, &grid))
    }

    /// One page of a board's history, oldest generation first.
    pub fn history(&self, id: &BoardId, offset: u64, limit: u64) -> Result<Vec<HistoryView>, LifeError> {
        validate_board_id(id).into_result()?;
        let board = self
            .store
            .get_board(id)?
            .ok_or_else(|| LifeError::not_found(id))?;

        let (rows, columns) = (board.rows as usize, board.columns as usize);
        Ok(self
            .store
            .list_history(id, offset, limit)?
            .into_iter()
            .map(|entry| HistoryView {
                generation: entry.generation,
                grid: to_array_form(&decode_text(&entry.encoded_grid, rows, columns)),
                recorded_at: entry.recorded_at_ns,
            })
            .collect())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn load(&self, id: &BoardId) -> Result<(Board, Grid), LifeError> {
        let board = self
            .store
            .get_board(id)?
            .ok_or_else(|| LifeError::not_found(id))?;
        let grid = decode_text(&board.encoded_grid, board.rows as usize, board.columns as usize);
        Ok((board, grid))
    }

    fn record(&mut self, board: &Board, grid: &Grid, now: u64) -> Result<(), LifeError> {
        self.store.append_history(HistoryEntry {
            board_id: board.id,
            generation: board.generation,
            encoded_grid: encode_text(grid),
            recorded_at_ns: now,
        })?;
        Ok(())
    }

    fn save(&mut self, mut board: Board, grid: &Grid, now: u64) -> Result<BoardState, LifeError> {
        board.encoded_grid = encode_text(grid);
        board.last_modified_at_ns = now;
        let board = self.store.update_board(board)?;
        Ok(board_state(&board, grid))
    }
}

fn board_state(board: &Board, grid: &Grid) -> BoardState {
    BoardState {
        board_id: board.id.to_string(),
        grid: to_array_form(grid),
        rows: board.rows,
        columns: board.columns,
        generation: board.generation,
        last_modified_at: board.last_modified_at_ns,
    }
}
