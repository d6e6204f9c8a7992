//! Canister configuration.
//!
//! Passed as the optional `#[init]` argument and kept in a `StableCell` so an
//! upgrade does not silently switch the backing store.

use candid::{CandidType, Deserialize};
use ic_stable_structures::memory_manager::MemoryId;
use ic_stable_structures::storable::Bound;
use ic_stable_structures::{StableCell, Storable};
use serde::Serialize;
use std::borrow::Cow;
use std::cell::RefCell;

use crate::memory_ids::CONFIG_MEMORY_ID;
use crate::types::DEFAULT_HISTORY_PAGE_LIMIT;
use crate::{Memory, MEMORY_MANAGER};

/// Where boards and history are kept.
#[derive(CandidType, Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StorageKind {
    /// Stable-memory maps; survive upgrades.
    #[default]
    Stable,
    /// Heap maps; wiped on upgrade.
    Heap,
}

#[derive(CandidType, Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct LifeConfig {
    pub storage: StorageKind,
    /// Largest page `get_history` will return
    pub history_page_limit: u64,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            storage: StorageKind::Stable,
            history_page_limit: DEFAULT_HISTORY_PAGE_LIMIT,
        }
    }
}

impl LifeConfig {
    /// Clamp a requested page size to `[1, history_page_limit]`.
    pub fn page_limit(&self, requested: u64) -> u64 {
        requested.clamp(1, self.history_page_limit.max(1))
    }
}

impl Storable for LifeConfig {
    fn to_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(candid::encode_one(self).expect(
            "CRITICAL: Failed to encode LifeConfig."
        ))
    }

    fn into_bytes(self) -> Vec<u8> {
        self.to_bytes().into_owned()
    }

    fn from_bytes(bytes: Cow<'_, [u8]>) -> Self {
        candid::decode_one(&bytes).expect(
            "CRITICAL: Failed to decode LifeConfig from stable storage."
        )
    }

    const BOUND: Bound = Bound::Bounded {
        max_size: 64,
        is_fixed_size: false,
    };
}

thread_local! {
    static CONFIG: RefCell<StableCell<LifeConfig, Memory>> = RefCell::new(
        StableCell::init(
            MEMORY_MANAGER.with(|m| m.borrow().get(MemoryId::new(CONFIG_MEMORY_ID))),
            LifeConfig::default()
        )
    );
}

pub fn current() -> LifeConfig {
    CONFIG.with(|c| c.borrow().get().clone())
}

pub fn store(config: LifeConfig) {
    CONFIG.with(|c| {
        c.borrow_mut().set(config);
    });
}
