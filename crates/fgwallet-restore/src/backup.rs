//! Encrypted backup export, the counterpart of restore.

use crate::application::{unix_now, WalletApplication};
use crate::store::{write_atomic, StateError};
use fgwallet_core::{encrypt_bytes, CryptoError, KdfParams, Password, WalletError};
use std::io;
use std::path::Path;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("backup password must not be empty")]
    EmptyPassword,

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Encryption error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl WalletApplication {
    /// Encrypt the current wallet into armored backup text.
    ///
    /// Marks the wallet as backed up.
    pub fn export_backup(&self, password: &Password, params: KdfParams) -> Result<String, BackupError> {
        if password.is_empty() {
            return Err(BackupError::EmptyPassword);
        }

        let plain = Zeroizing::new(self.wallet().to_bytes()?);
        let armored = encrypt_bytes(&plain, password.as_str(), params)?;

        self.update_preferences(|prefs| {
            prefs.disarm_backup_reminder();
            prefs.last_backup_time = Some(unix_now());
        })?;
        log::info!("exported encrypted wallet backup");
        Ok(armored)
    }

    /// Export a backup to `path`.
    pub fn write_backup(
        &self,
        path: &Path,
        password: &Password,
        params: KdfParams,
    ) -> Result<(), BackupError> {
        let armored = self.export_backup(password, params)?;
        write_atomic(path, armored.as_bytes())?;
        log::info!("backup written to {}", path.display());
        Ok(())
    }
}
