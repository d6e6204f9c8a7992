use candid::{CandidType, Deserialize, Principal};
use ic_stable_structures::storable::Bound;
use ic_stable_structures::Storable;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::codec::GridShapeError;

// =============================================================================
// CONSTANTS
// =============================================================================

pub const MIN_DIMENSION: u32 = 1;
pub const MAX_DIMENSION: u32 = 1000;
pub const MIN_ADVANCE_STEPS: u32 = 1;
pub const MAX_ADVANCE_STEPS: u32 = 100;
/// Upper bound on steps taken while searching for a fixed point
pub const MAX_STABLE_ITERATIONS: u32 = 1000;
pub const DEFAULT_HISTORY_PAGE_LIMIT: u64 = 100;

// =============================================================================
// BOARD ID
// =============================================================================

/// 16-byte board identifier, rendered as hyphenated hex (UUID layout).
/// The all-zero id is the nil sentinel and never names a board.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoardId([u8; 16]);

impl BoardId {
    pub const NIL: BoardId = BoardId([0u8; 16]);

    #[cfg(test)]
    pub fn from_raw(bytes: [u8; 16]) -> Self {
        BoardId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }

    /// Derive a fresh id from the uploader, the request time and a
    /// per-canister sequence number.
    pub fn derive(caller: &Principal, now_ns: u64, sequence: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(caller.as_slice());
        hasher.update(now_ns.to_be_bytes());
        hasher.update(sequence.to_be_bytes());
        let hash = hasher.finalize();

        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        BoardId(bytes)
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = hex::encode(self.0);
        write!(f, "{}-{}-{}-{}-{}", &h[0..8], &h[8..12], &h[12..16], &h[16..20], &h[20..32])
    }
}

impl fmt::Debug for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoardId({})", self)
    }
}

impl FromStr for BoardId {
    type Err = String;

    /// Accepts the hyphenated form or 32 bare hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.trim().chars().filter(|&c| c != '-').collect();
        if compact.len() != 32 {
            return Err(format!("board id '{}' must be 32 hex digits", s));
        }
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(&compact, &mut bytes)
            .map_err(|e| format!("board id '{}' is not valid hex: {}", s, e))?;
        Ok(BoardId(bytes))
    }
}

impl Storable for BoardId {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }

    fn into_bytes(self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[..16]);
        BoardId(id)
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 16,
        is_fixed_size: true,
    };
}

// =============================================================================
// STORED RECORDS
// =============================================================================

/// Persistent board. The grid is kept in its text encoding; history lives
/// in its own map keyed by `(board_id, generation)`.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Board {
    pub id: BoardId,
    pub encoded_grid: String,
    pub rows: u32,
    pub columns: u32,
    pub generation: u64,
    pub created_at_ns: u64,
    pub last_modified_at_ns: u64,
}

impl Storable for Board {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect(
            "CRITICAL: Failed to encode Board. \
             This should never happen unless there's a bug in candid serialization."
        ))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode Board from stable storage. \
             This indicates storage corruption or an incompatible canister upgrade."
        )
    }

    // A 1000x1000 grid encodes to ~2MB of text
    const BOUND: Bound = Bound::Unbounded;
}

/// Immutable record of a board's grid at one generation.
#[derive(CandidType, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub board_id: BoardId,
    pub generation: u64,
    pub encoded_grid: String,
    pub recorded_at_ns: u64,
}

impl HistoryEntry {
    pub fn key(&self) -> HistoryKey {
        HistoryKey {
            board_id: self.board_id,
            generation: self.generation,
        }
    }
}

impl Storable for HistoryEntry {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect(
            "CRITICAL: Failed to encode HistoryEntry."
        ))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode HistoryEntry from stable storage. \
             History integrity cannot be guaranteed."
        )
    }

    const BOUND: Bound = Bound::Unbounded;
}

/// History map key. Field order gives board-major, generation-ascending
/// iteration; the byte form uses big-endian generation to match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct HistoryKey {
    pub board_id: BoardId,
    pub generation: u64,
}

impl Storable for HistoryKey {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned((*self).into_bytes())
    }

    fn into_bytes(self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(24);
        bytes.extend_from_slice(self.board_id.as_bytes());
        bytes.extend_from_slice(&self.generation.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[..16]);
        let mut generation = [0u8; 8];
        generation.copy_from_slice(&bytes[16..24]);
        HistoryKey {
            board_id: BoardId(id),
            generation: u64::from_be_bytes(generation),
        }
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 24,
        is_fixed_size: true,
    };
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug)]
pub struct UploadBoardRequest {
    pub rows: u32,
    pub columns: u32,
    pub grid: Option<Vec<Vec<bool>>>,
}

/// Board state returned by every board endpoint
#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    pub board_id: String,
    pub grid: Vec<Vec<bool>>,
    pub rows: u32,
    pub columns: u32,
    pub generation: u64,
    pub last_modified_at: u64,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct HistoryView {
    pub generation: u64,
    pub grid: Vec<Vec<bool>>,
    pub recorded_at: u64,
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum LifeError {
    /// Malformed or out-of-range input. Nothing was written.
    Validation { errors: Vec<String> },
    NotFound { board_id: String },
    /// Storage could not complete a read or write.
    Storage { message: String },
}

impl LifeError {
    pub fn validation(message: impl Into<String>) -> Self {
        LifeError::Validation { errors: vec![message.into()] }
    }

    pub fn not_found(id: &BoardId) -> Self {
        LifeError::NotFound { board_id: id.to_string() }
    }
}

impl fmt::Display for LifeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeError::Validation { errors } => write!(f, "invalid request: {}", errors.join("; ")),
            LifeError::NotFound { board_id } => write!(f, "board {} not found", board_id),
            LifeError::Storage { message } => write!(f, "storage failure: {}", message),
        }
    }
}

impl std::error::Error for LifeError {}

impl From<GridShapeError> for LifeError {
    fn from(e: GridShapeError) -> Self {
        LifeError::validation(e.to_string())
    }
}

/// Failure reported by a `BoardStore`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    AlreadyExists(BoardId),
    Missing(BoardId),
    /// An entry for this board and generation was already recorded
    HistoryConflict { board_id: BoardId, generation: u64 },
    /// Injected by test stores; neither shipped store fails this way
    #[cfg(test)]
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AlreadyExists(id) => write!(f, "board {} already exists", id),
            StorageError::Missing(id) => write!(f, "board {} is not stored", id),
            StorageError::HistoryConflict { board_id, generation } => write!(
                f,
                "history for board {} already has generation {}",
                board_id, generation
            ),
            #[cfg(test)]
            StorageError::Unavailable(reason) => write!(f, "store unavailable: {}", reason),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for LifeError {
    fn from(e: StorageError) -> Self {
        LifeError::Storage { message: e.to_string() }
    }
}
