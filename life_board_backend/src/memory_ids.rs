//! Central registry for stable memory IDs.
//!
//! IMPORTANT: All memory IDs must be unique across the entire canister.
//!
//! Allocation strategy:
//! - 0-9: Boards and history
//! - 10-19: Canister configuration and counters

// Boards and history (0-9)
pub const BOARDS_MEMORY_ID: u8 = 0;
pub const HISTORY_MEMORY_ID: u8 = 1;

// Configuration and counters (10-19)
pub const CONFIG_MEMORY_ID: u8 = 10;
pub const BOARD_SEQUENCE_MEMORY_ID: u8 = 11;
