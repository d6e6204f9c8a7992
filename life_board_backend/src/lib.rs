//! Life Board Backend
//!
//! Uploads Game of Life boards, advances them one generation, N generations,
//! or until they stop changing, and keeps a replayable history of every
//! generation computed.
//!
//! **Layout:**
//! - `grid`, `rules`, `codec`: pure simulation core
//! - `validation`: request checks, all failures collected
//! - `storage`: `BoardStore` trait with stable-memory and heap stores
//! - `simulator`: the board operations on top of a `BoardStore`
//! - this file: canister lifecycle, endpoints, logging

use candid::Principal;
use ic_cdk::{init, post_upgrade, pre_upgrade, query, update};
use ic_stable_structures::memory_manager::{MemoryId, MemoryManager, VirtualMemory};
use ic_stable_structures::{DefaultMemoryImpl, StableCell};
use std::cell::RefCell;

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================

pub mod codec;
pub mod config;
pub mod grid;
pub mod memory_ids;
pub mod rules;
pub mod simulator;
pub mod storage;
pub mod types;
pub mod validation;

// =============================================================================
// RE-EXPORTS
// =============================================================================

pub use config::{LifeConfig, StorageKind};
pub use grid::Grid;
pub use simulator::{Simulator, StableSearch};
pub use storage::{BoardStore, HeapBoardStore, StableBoardStore};
pub use types::{BoardId, BoardState, HistoryView, LifeError, UploadBoardRequest};

use memory_ids::BOARD_SEQUENCE_MEMORY_ID;
use validation::parse_board_id;

// =============================================================================
// MEMORY MANAGEMENT
// =============================================================================

pub type Memory = VirtualMemory<DefaultMemoryImpl>;

thread_local! {
    pub static MEMORY_MANAGER: RefCell<MemoryManager<DefaultMemoryImpl>> =
        RefCell::new(MemoryManager::init(DefaultMemoryImpl::default()));

    // Only used with StorageKind::Heap
    static HEAP_STORE: RefCell<HeapBoardStore> = RefCell::new(HeapBoardStore::new());

    // Mixed into board id derivation so two uploads in one round differ
    static BOARD_SEQUENCE: RefCell<StableCell<u64, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(BOARD_SEQUENCE_MEMORY_ID))),
            0u64
        )
    );
}

fn next_board_sequence() -> u64 {
    BOARD_SEQUENCE.with(|cell| {
        let current = *cell.borrow().get();
        cell.borrow_mut().set(current + 1);
        current
    })
}

/// Run `f` against the store selected at install time.
fn with_simulator<R>(f: impl FnOnce(&mut Simulator<'_, dyn BoardStore>) -> R) -> R {
    match config::current().storage {
        StorageKind::Stable => {
            let mut stable = StableBoardStore;
            f(&mut Simulator::new(&mut stable as &mut dyn BoardStore))
        }
        StorageKind::Heap => HEAP_STORE.with(|store| {
            let mut store = store.borrow_mut();
            f(&mut Simulator::new(&mut *store as &mut dyn BoardStore))
        }),
    }
}

fn log_outcome(endpoint: &str, result: &Result<BoardState, LifeError>) {
    match result {
        Ok(state) => ic_cdk::println!(
            "{}: board {} at generation {} ({}x{})",
            endpoint, state.board_id, state.generation, state.rows, state.columns
        ),
        Err(e) => ic_cdk::println!("{} failed: {}", endpoint, e),
    }
}

// =============================================================================
// LIFECYCLE HOOKS
// =============================================================================

#[init]
fn init(config: Option<LifeConfig>) {
    let config = config.unwrap_or_default();
    config::store(config.clone());

    ic_cdk::println!(
        "Life Board Backend Initialized - storage: {:?}, history page limit: {}",
        config.storage, config.history_page_limit
    );
}

#[pre_upgrade]
fn pre_upgrade() {
    match config::current().storage {
        StorageKind::Stable => ic_cdk::println!("Pre-upgrade: boards persist in stable memory"),
        StorageKind::Heap => {
            let dropped = HEAP_STORE.with(|s| s.borrow().board_count());
            ic_cdk::println!("Pre-upgrade: heap storage selected, {} boards will not survive", dropped);
        }
    }
}

#[post_upgrade]
fn post_upgrade() {
    let config = config::current();
    ic_cdk::println!(
        "Post-upgrade: storage {:?}, {} boards in stable memory",
        config.storage,
        StableBoardStore.board_count()
    );
}

// =============================================================================
// BOARD ENDPOINTS
// =============================================================================

#[update]
fn upload_board(request: UploadBoardRequest) -> Result<BoardState, LifeError> {
    let now = ic_cdk::api::time();
    let caller: Principal = ic_cdk::api::msg_caller();
    let id = BoardId::derive(&caller, now, next_board_sequence());

    let result = with_simulator(|sim| sim.upload(&request, id, now));
    log_outcome("upload_board", &result);
    result
}

#[update]
fn next_state(board_id: String) -> Result<BoardState, LifeError> {
    let now = ic_cdk::api::time();
    let result = parse_board_id(&board_id)
        .and_then(|id| with_simulator(|sim| sim.advance_one(&id, now)));
    log_outcome("next_state", &result);
    result
}

#[update]
fn advance_board(board_id: String, generations: u32) -> Result<BoardState, LifeError> {
    let now = ic_cdk::api::time();
    let result = parse_board_id(&board_id)
        .and_then(|id| with_simulator(|sim| sim.advance_by(&id, generations, now)));
    log_outcome("advance_board", &result);
    result
}

#[update]
fn final_state(board_id: String) -> Result<BoardState, LifeError> {
    let now = ic_cdk::api::time();
    let search = parse_board_id(&board_id)
        .and_then(|id| with_simulator(|sim| sim.advance_to_stable(&id, now)));

    let result = search.map(|search| {
        if !search.reached_fixed_point {
            ic_cdk::println!(
                "final_state: board {} reached the {}-iteration cap without a fixed point",
                search.state.board_id, search.iterations
            );
        }
        search.state
    });
    log_outcome("final_state", &result);
    result
}

// =============================================================================
// QUERIES
// =============================================================================

#[query]
fn get_board(board_id: String) -> Result<BoardState, LifeError> {
    parse_board_id(&board_id).and_then(|id| with_simulator(|sim| sim.board_state(&id)))
}

#[query]
fn get_history(board_id: String, offset: u64, limit: u64) -> Result<Vec<HistoryView>, LifeError> {
    let limit = config::current().page_limit(limit);
    parse_board_id(&board_id).and_then(|id| with_simulator(|sim| sim.history(&id, offset, limit)))
}

#[query]
fn get_config() -> LifeConfig {
    config::current()
}

ic_cdk::export_candid!();
