//! End-to-end board flows against the stable-memory store.

use candid::Principal;
use life_board_backend::codec::to_array_form;
use life_board_backend::config::{self, LifeConfig, StorageKind};
use life_board_backend::{BoardId, Grid, LifeError, Simulator, StableBoardStore, UploadBoardRequest};

const T0: u64 = 1_700_000_000_000_000_000;

fn caller() -> Principal {
    Principal::from_slice(&[7; 29])
}

fn request(grid: &Grid) -> UploadBoardRequest {
    UploadBoardRequest {
        rows: grid.rows() as u32,
        columns: grid.columns() as u32,
        grid: Some(to_array_form(grid)),
    }
}

#[test]
fn test_block_upload_then_final_state() {
    let mut store = StableBoardStore;
    let mut sim = Simulator::new(&mut store);
    let id = BoardId::derive(&caller(), T0, 0);

    let full_block = Grid::with_alive(2, 2, &[(0, 0), (0, 1), (1, 0), (1, 1)]);
    let uploaded = sim.upload(&request(&full_block), id, T0).unwrap();
    assert_eq!(uploaded.board_id, id.to_string());
    assert_eq!(uploaded.generation, 0);

    let search = sim.advance_to_stable(&id, T0 + 1).unwrap();
    assert!(search.reached_fixed_point);
    assert_eq!(search.state.grid, vec![vec![true, true], vec![true, true]]);
    assert_eq!(search.state.generation, 1);

    // The text id a client receives resolves back to the same board
    let parsed: BoardId = uploaded.board_id.parse().unwrap();
    assert_eq!(sim.board_state(&parsed).unwrap(), search.state);
}

#[test]
fn test_glider_hits_the_edge_and_settles() {
    let mut store = StableBoardStore;
    let mut sim = Simulator::new(&mut store);
    let id = BoardId::derive(&caller(), T0, 1);

    let glider = Grid::with_alive(6, 6, &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)]);
    sim.upload(&request(&glider), id, T0).unwrap();

    // After 4 generations the glider has moved one cell down and right
    let state = sim.advance_by(&id, 4, T0).unwrap();
    let moved = Grid::with_alive(6, 6, &[(1, 2), (2, 3), (3, 1), (3, 2), (3, 3)]);
    assert_eq!(state.grid, to_array_form(&moved));

    // Without wraparound it collides with the corner and becomes a block
    let search = sim.advance_to_stable(&id, T0).unwrap();
    assert!(search.reached_fixed_point);
    let block = Grid::with_alive(6, 6, &[(4, 4), (4, 5), (5, 4), (5, 5)]);
    assert_eq!(search.state.grid, to_array_form(&block));
}

#[test]
fn test_history_pages_cover_every_generation() {
    let mut store = StableBoardStore;
    let mut sim = Simulator::new(&mut store);
    let id = BoardId::derive(&caller(), T0, 2);

    sim.upload(&request(&Grid::with_alive(5, 5, &[(2, 1), (2, 2), (2, 3)])), id, T0).unwrap();
    sim.advance_by(&id, 25, T0).unwrap();

    let limit = LifeConfig::default().page_limit(10);
    let mut generations = Vec::new();
    let mut offset = 0;
    loop {
        let page = sim.history(&id, offset, limit).unwrap();
        if page.is_empty() {
            break;
        }
        offset += page.len() as u64;
        generations.extend(page.iter().map(|h| h.generation));
    }
    assert_eq!(generations, (1..=25).collect::<Vec<u64>>());
}

#[test]
fn test_boards_are_independent() {
    let mut store = StableBoardStore;
    let mut sim = Simulator::new(&mut store);
    let a = BoardId::derive(&caller(), T0, 3);
    let b = BoardId::derive(&caller(), T0, 4);

    let blinker = Grid::with_alive(3, 3, &[(0, 1), (1, 1), (2, 1)]);
    sim.upload(&request(&blinker), a, T0).unwrap();
    sim.upload(&request(&blinker), b, T0).unwrap();

    sim.advance_by(&a, 3, T0).unwrap();
    assert_eq!(sim.board_state(&b).unwrap().generation, 0);
    assert!(sim.history(&b, 0, 10).unwrap().is_empty());
    assert_eq!(sim.history(&a, 0, 10).unwrap().len(), 3);
}

#[test]
fn test_duplicate_id_is_a_storage_error() {
    let mut store = StableBoardStore;
    let mut sim = Simulator::new(&mut store);
    let id = BoardId::derive(&caller(), T0, 5);
    let grid = Grid::dead(1, 1);

    sim.upload(&request(&grid), id, T0).unwrap();
    let err = sim.upload(&request(&grid), id, T0).unwrap_err();
    assert!(matches!(err, LifeError::Storage { .. }));
}

#[test]
fn test_config_persists_in_stable_cell() {
    assert_eq!(config::current(), LifeConfig::default());

    let heap = LifeConfig { storage: StorageKind::Heap, history_page_limit: 25 };
    config::store(heap.clone());
    assert_eq!(config::current(), heap);
    assert_eq!(config::current().page_limit(1000), 25);
}
