//! Application-wide wallet holder
//!
//! Readers get a cheap `Arc` snapshot. A replacement writes the new wallet
//! to disk first and only then swaps the pointer, both under the write
//! lock, so no caller ever observes a half-replaced wallet and a failed
//! write leaves the old wallet in place on disk and in memory.

use crate::store::write_atomic;
use bitcoin::Network;
use fgwallet_core::{WalletError, WalletState};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HolderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

#[derive(Debug)]
pub struct WalletHolder {
    path: PathBuf,
    current: RwLock<Arc<WalletState>>,
}

impl WalletHolder {
    /// Load the wallet at `path`, creating an empty one on first run.
    pub fn load_or_create(path: impl Into<PathBuf>, network: Network) -> Result<Self, HolderError> {
        let path = path.into();
        let wallet = if path.exists() {
            let bytes = fs::read(&path)?;
            WalletState::from_bytes(&bytes, network)?
        } else {
            let wallet = WalletState::new(network);
            persist(&path, &wallet)?;
            log::info!("created new wallet at {}", path.display());
            wallet
        };

        Ok(Self {
            path,
            current: RwLock::new(Arc::new(wallet)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current wallet.
    pub fn wallet(&self) -> Arc<WalletState> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist `wallet` and make it current. Returns the wallet it replaced.
    pub fn replace(&self, wallet: WalletState) -> Result<Arc<WalletState>, HolderError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        persist(&self.path, &wallet)?;
        Ok(std::mem::replace(&mut *current, Arc::new(wallet)))
    }

    /// Replace the wallet with an edited copy of itself.
    pub fn update<F>(&self, edit: F) -> Result<Arc<WalletState>, HolderError>
    where
        F: FnOnce(&mut WalletState),
    {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut wallet = WalletState::clone(&current);
        edit(&mut wallet);
        persist(&self.path, &wallet)?;
        let wallet = Arc::new(wallet);
        *current = wallet.clone();
        Ok(wallet)
    }
}

fn persist(path: &Path, wallet: &WalletState) -> Result<(), HolderError> {
    let bytes = wallet.to_bytes()?;
    write_atomic(path, &bytes)?;
    Ok(())
}
