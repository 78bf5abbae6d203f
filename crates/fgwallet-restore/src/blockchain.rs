//! Local chain position
//!
//! Syncing itself happens elsewhere; this store only records where the
//! local chain stands so a reset can force a replay from the start.

use crate::store::{load_json, save_json, StateError};
use fgwallet_core::BlockchainState;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct BlockchainStore {
    path: PathBuf,
}

impl BlockchainStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<BlockchainState, StateError> {
        load_json(&self.path)
    }

    pub fn save(&self, state: &BlockchainState) -> Result<(), StateError> {
        save_json(&self.path, state)
    }

    /// Forget the chain and replay from genesis.
    pub fn reset(&self) -> Result<(), StateError> {
        self.save(&BlockchainState::genesis())
    }
}
