//! Board and history storage.
//!
//! The simulator only sees the `BoardStore` trait. Two implementations:
//!
//! - `StableBoardStore`: `StableBTreeMap`s in stable memory. Persists across
//!   upgrades with no pre/post-upgrade work.
//! - `HeapBoardStore`: plain `BTreeMap`s. Heap only, wiped on upgrade.
//!
//! Both enforce the same contract: boards are created once, updated in
//! place, and history entries are append-only (one per board and
//! generation, never overwritten).

use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::StableBTreeMap;
use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::memory_ids::{BOARDS_MEMORY_ID, HISTORY_MEMORY_ID};
use crate::types::{Board, BoardId, HistoryEntry, HistoryKey, StorageError};
use crate::{Memory, MEMORY_MANAGER};

pub trait BoardStore {
    fn get_board(&self, id: &BoardId) -> Result<Option<Board>, StorageError>;

    /// Insert a new board. Fails if the id is already taken.
    fn create_board(&mut self, board: Board) -> Result<Board, StorageError>;

    /// Replace an existing board. Fails if the board was never created.
    fn update_board(&mut self, board: Board) -> Result<Board, StorageError>;

    /// Record one generation. Re-recording the same grid for a generation
    /// returns the stored entry unchanged; a different grid is a conflict.
    fn append_history(&mut self, entry: HistoryEntry) -> Result<HistoryEntry, StorageError>;

    /// Entries for one board in ascending generation order.
    fn list_history(&self, id: &BoardId, offset: u64, limit: u64) -> Result<Vec<HistoryEntry>, StorageError>;
}

/// An advance interrupted after its history writes recomputes the same
/// grids on retry, so an identical entry is accepted as already recorded.
fn reconcile(existing: HistoryEntry, incoming: &HistoryEntry) -> Result<HistoryEntry, StorageError> {
    if existing.encoded_grid == incoming.encoded_grid {
        Ok(existing)
    } else {
        Err(StorageError::HistoryConflict {
            board_id: incoming.board_id,
            generation: incoming.generation,
        })
    }
}

fn history_range(id: &BoardId) -> std::ops::RangeInclusive<HistoryKey> {
    HistoryKey { board_id: *id, generation: 0 }..=HistoryKey { board_id: *id, generation: u64::MAX }
}

// =============================================================================
// STABLE MEMORY
// =============================================================================

thread_local! {
    static BOARDS: RefCell<StableBTreeMap<BoardId, Board, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(BOARDS_MEMORY_ID)))
        )
    );

    /// Append-only, keyed by (board, generation)
    static HISTORY: RefCell<StableBTreeMap<HistoryKey, HistoryEntry, Memory>> = RefCell::new(
        StableBTreeMap::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(HISTORY_MEMORY_ID)))
        )
    );
}

/// Handle onto the stable-memory maps. Carries no state of its own.
#[derive(Clone, Copy, Debug, Default)]
pub struct StableBoardStore;

impl StableBoardStore {
    pub fn board_count(&self) -> u64 {
        BOARDS.with(|b| b.borrow().len())
    }
}

impl BoardStore for StableBoardStore {
    fn get_board(&self, id: &BoardId) -> Result<Option<Board>, StorageError> {
        Ok(BOARDS.with(|b| b.borrow().get(id)))
    }

    fn create_board(&mut self, board: Board) -> Result<Board, StorageError> {
        BOARDS.with(|b| {
            let mut boards = b.borrow_mut();
            if boards.contains_key(&board.id) {
                return Err(StorageError::AlreadyExists(board.id));
            }
            boards.insert(board.id, board.clone());
            Ok(board)
        })
    }

    fn update_board(&mut self, board: Board) -> Result<Board, StorageError> {
        BOARDS.with(|b| {
            let mut boards = b.borrow_mut();
            if !boards.contains_key(&board.id) {
                return Err(StorageError::Missing(board.id));
            }
            boards.insert(board.id, board.clone());
            Ok(board)
        })
    }

    fn append_history(&mut self, entry: HistoryEntry) -> Result<HistoryEntry, StorageError> {
        HISTORY.with(|h| {
            let mut history = h.borrow_mut();
            let key = entry.key();
            if let Some(existing) = history.get(&key) {
                return reconcile(existing, &entry);
            }
            history.insert(key, entry.clone());
            Ok(entry)
        })
    }

    fn list_history(&self, id: &BoardId, offset: u64, limit: u64) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(HISTORY.with(|h| {
            h.borrow()
                .range(history_range(id))
                .skip(offset as usize)
                .take(limit as usize)
                .map(|entry| entry.value())
                .collect()
        }))
    }
}

// =============================================================================
// HEAP
// =============================================================================

#[derive(Clone, Debug, Default)]
pub struct HeapBoardStore {
    boards: BTreeMap<BoardId, Board>,
    history: BTreeMap<HistoryKey, HistoryEntry>,
}

impl HeapBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn board_count(&self) -> u64 {
        self.boards.len() as u64
    }
}

impl BoardStore for HeapBoardStore {
    fn get_board(&self, id: &BoardId) -> Result<Option<Board>, StorageError> {
        Ok(self.boards.get(id).cloned())
    }

    fn create_board(&mut self, board: Board) -> Result<Board, StorageError> {
        if self.boards.contains_key(&board.id) {
            return Err(StorageError::AlreadyExists(board.id));
        }
        self.boards.insert(board.id, board.clone());
        Ok(board)
    }

    fn update_board(&mut self, board: Board) -> Result<Board, StorageError> {
        match self.boards.get_mut(&board.id) {
            Some(stored) => {
                *stored = board.clone();
                Ok(board)
            }
            None => Err(StorageError::Missing(board.id)),
        }
    }

    fn append_history(&mut self, entry: HistoryEntry) -> Result<HistoryEntry, StorageError> {
        let key = entry.key();
        if let Some(existing) = self.history.get(&key) {
            return reconcile(existing.clone(), &entry);
        }
        self.history.insert(key, entry.clone());
        Ok(entry)
    }

    fn list_history(&self, id: &BoardId, offset: u64, limit: u64) -> Result<Vec<HistoryEntry>, StorageError> {
        Ok(self
            .history
            .range(history_range(id))
            .skip(offset as usize)
            .take(limit as usize)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
