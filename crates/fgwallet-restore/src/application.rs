//! The wallet application: wallet holder plus the state around it.

use crate::blockchain::BlockchainStore;
use crate::holder::{HolderError, WalletHolder};
use crate::preferences::Preferences;
use crate::store::{load_json, save_json, StateError};
use crate::BACKUP_MAX_CHARS;
use bitcoin::Network;
use fgwallet_core::{BalanceType, BalanceView, KeyError, WalletError, WalletState};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

pub const WALLET_FILE: &str = "wallet.json";
pub const PREFERENCES_FILE: &str = "preferences.json";
pub const BLOCKCHAIN_FILE: &str = "blockchain.json";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Wallet holder error: {0}")]
    Holder(#[from] HolderError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),
}

/// Where the application keeps its files and which chain it runs on.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub data_dir: PathBuf,
    pub network: Network,
    /// Largest backup accepted, in characters
    pub backup_max_chars: usize,
}

impl AppSettings {
    pub fn new(data_dir: impl Into<PathBuf>, network: Network) -> Self {
        Self {
            data_dir: data_dir.into(),
            network,
            backup_max_chars: BACKUP_MAX_CHARS,
        }
    }
}

pub struct WalletApplication {
    settings: AppSettings,
    holder: WalletHolder,
    preferences: Mutex<Preferences>,
    blockchain: BlockchainStore,
}

impl WalletApplication {
    /// Open (or initialise) the application state under `settings.data_dir`.
    pub fn open(settings: AppSettings) -> Result<Self, AppError> {
        let holder = WalletHolder::load_or_create(
            settings.data_dir.join(WALLET_FILE),
            settings.network,
        )?;
        let preferences = load_json(&settings.data_dir.join(PREFERENCES_FILE))?;
        let blockchain = BlockchainStore::new(settings.data_dir.join(BLOCKCHAIN_FILE));

        Ok(Self {
            settings,
            holder,
            preferences: Mutex::new(preferences),
            blockchain,
        })
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn network(&self) -> Network {
        self.settings.network
    }

    pub fn data_dir(&self) -> &Path {
        &self.settings.data_dir
    }

    /// Snapshot of the current wallet.
    pub fn wallet(&self) -> Arc<WalletState> {
        self.holder.wallet()
    }

    /// Swap in a new wallet. Returns the replaced one.
    pub fn replace_wallet(&self, wallet: WalletState) -> Result<Arc<WalletState>, HolderError> {
        self.holder.replace(wallet)
    }

    /// Start over with a fresh deterministic wallet rooted at `seed`.
    pub fn create_wallet(&self, seed: &[u8]) -> Result<Arc<WalletState>, AppError> {
        let wallet = WalletState::from_seed(self.settings.network, seed, unix_now())?;
        self.holder.replace(wallet)?;
        self.blockchain.reset()?;
        self.update_preferences(Preferences::arm_backup_reminder)?;
        log::info!("created new wallet");
        Ok(self.wallet())
    }

    /// Replay the chain from the start. Chain-derived wallet data is
    /// cleared so it gets rebuilt by the replay.
    pub fn reset_blockchain(&self) -> Result<(), AppError> {
        self.blockchain.reset()?;
        self.holder.update(WalletState::reset_chain_state)?;
        log::info!("blockchain reset, replaying from genesis");
        Ok(())
    }

    pub fn blockchain(&self) -> &BlockchainStore {
        &self.blockchain
    }

    pub fn preferences(&self) -> Preferences {
        self.preferences
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn disarm_backup_reminder(&self) -> Result<(), StateError> {
        self.update_preferences(Preferences::disarm_backup_reminder)
    }

    pub fn arm_backup_reminder(&self) -> Result<(), StateError> {
        self.update_preferences(Preferences::arm_backup_reminder)
    }

    pub(crate) fn update_preferences<F>(&self, edit: F) -> Result<(), StateError>
    where
        F: FnOnce(&mut Preferences),
    {
        let mut prefs = self.preferences.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = prefs.clone();
        edit(&mut next);
        save_json(&self.settings.data_dir.join(PREFERENCES_FILE), &next)?;
        *prefs = next;
        Ok(())
    }

    /// Whether replacing the current wallet would discard coins.
    pub fn replace_warning(&self) -> bool {
        self.wallet().balance(BalanceType::Estimated) > bitcoin::Amount::ZERO
    }

    /// What the balance display should show right now.
    pub fn balance_view(&self) -> Result<BalanceView, StateError> {
        let chain = self.blockchain.load()?;
        let balance = self.wallet().balance(BalanceType::Estimated);
        Ok(BalanceView::compute(Some(balance), Some(&chain), unix_now()))
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{Amount, OutPoint};
    use fgwallet_core::WalletOutput;
    use tempfile::tempdir;

    fn open(dir: &Path) -> WalletApplication {
        WalletApplication::open(AppSettings::new(dir, Network::Regtest)).unwrap()
    }

    fn with_coins(sats: u64) -> WalletState {
        let mut wallet = WalletState::new(Network::Regtest);
        wallet.outputs.push(WalletOutput {
            outpoint: OutPoint::null(),
            value: Amount::from_sat(sats),
            height: Some(10),
        });
        wallet.last_block_seen = Some(10);
        wallet
    }

    #[test]
    fn test_open_initialises_data_dir() {
        let dir = tempdir().unwrap();
        let app = open(dir.path());
        assert!(dir.path().join(WALLET_FILE).exists());
        assert_eq!(app.network(), Network::Regtest);
        assert_eq!(app.settings().backup_max_chars, BACKUP_MAX_CHARS);
        assert!(!app.preferences().remind_backup());
    }

    #[test]
    fn test_create_wallet_arms_reminder() {
        let dir = tempdir().unwrap();
        let app = open(dir.path());
        let wallet = app.create_wallet(&[1u8; 64]).unwrap();
        assert!(wallet.account.is_some());
        assert!(app.preferences().remind_backup());

        // persisted
        let reopened = open(dir.path());
        assert!(reopened.preferences().remind_backup());
        assert_eq!(reopened.wallet().account, wallet.account);
    }

    #[test]
    fn test_reset_blockchain_clears_chain_state() {
        let dir = tempdir().unwrap();
        let app = open(dir.path());
        app.replace_wallet(with_coins(5000)).unwrap();
        assert!(app.replace_warning());

        app.reset_blockchain().unwrap();
        assert!(app.wallet().outputs.is_empty());
        assert_eq!(app.wallet().last_block_seen, None);
        assert!(app.blockchain().load().unwrap().replaying);
        assert!(!app.replace_warning());
    }

    #[test]
    fn test_balance_view() {
        let dir = tempdir().unwrap();
        let app = open(dir.path());
        app.replace_wallet(with_coins(200_000)).unwrap();

        let view = app.balance_view().unwrap();
        // fresh store: replaying but no chain time yet, so no progress line
        assert!(view.progress.is_none());
        assert_eq!(view.balance, Some(Amount::from_sat(200_000)));
        assert!(view.has_some_balance);
    }
}
