//! Restore from an encrypted backup.

use crate::application::{unix_now, WalletApplication};
use crate::deserialize::restore_wallet_from_structured_or_keys;
use crate::holder::HolderError;
use crate::reader::{read_backup, BackupSource, ReadError};
use bitcoin::Network;
use fgwallet_core::{decrypt_bytes, CryptoError, Password, WalletState};
use std::io::{self, Read};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RestoreError {
    #[error("cannot read backup: {0}")]
    Io(#[from] io::Error),

    #[error("backup is larger than {limit} characters")]
    TooLarge { limit: usize },

    // Wrong password and corrupted ciphertext deliberately look the same
    #[error("{0}")]
    Decryption(#[from] CryptoError),

    #[error("{0}")]
    Format(String),

    #[error("cannot store restored wallet: {0}")]
    Persist(#[from] HolderError),
}

/// Coarse failure classes, for choosing what to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreErrorKind {
    Io,
    Decryption,
    Format,
}

impl RestoreError {
    pub fn kind(&self) -> RestoreErrorKind {
        match self {
            RestoreError::Io(_) | RestoreError::TooLarge { .. } | RestoreError::Persist(_) => {
                RestoreErrorKind::Io
            }
            RestoreError::Decryption(_) => RestoreErrorKind::Decryption,
            RestoreError::Format(_) => RestoreErrorKind::Format,
        }
    }

    /// Every failure is offered the same retry-or-dismiss choice.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl From<ReadError> for RestoreError {
    fn from(e: ReadError) -> Self {
        match e {
            ReadError::Io(e) => RestoreError::Io(e),
            ReadError::TooLarge { limit } => RestoreError::TooLarge { limit },
        }
    }
}

/// A successful restore.
#[derive(Debug, Clone)]
pub struct RestoredWallet {
    /// The wallet now held by the application
    pub wallet: Arc<WalletState>,
    /// The restored wallet's spending keys need a spending password
    pub encrypted: bool,
    /// The replaced wallet still held coins
    pub replaced_had_coins: bool,
}

/// Consumed once by the caller to decide what to show next.
pub type RestoreOutcome = Result<RestoredWallet, RestoreError>;

/// Read, decrypt and parse a backup. Nothing is replaced here.
pub fn restore_wallet_from_encrypted<R: Read>(
    cipher: R,
    password: &Password,
    network: Network,
    max_chars: usize,
) -> Result<WalletState, RestoreError> {
    let cipher_text = read_backup(cipher, max_chars)?;
    let plain = decrypt_bytes(&cipher_text, password.as_str())?;
    restore_wallet_from_structured_or_keys(&plain, network, max_chars)
}

impl WalletApplication {
    /// Restore the backup behind `source` and make it the current wallet.
    ///
    /// On success the backup reminder is disarmed and the chain is reset
    /// so the new wallet's history gets replayed. On any failure the
    /// current wallet is left exactly as it was. The password is wiped
    /// before this returns.
    pub fn handle_restore(&self, source: &dyn BackupSource, password: Password) -> RestoreOutcome {
        let result = self.restore_from(source, &password);
        drop(password);

        match &result {
            Ok(_) => log::info!("successfully restored encrypted wallet from external source"),
            Err(e) => {
                log::debug!("restore source was {}", source.describe());
                log::info!("problem restoring wallet: {}", e);
            }
        }
        result
    }

    fn restore_from(&self, source: &dyn BackupSource, password: &Password) -> RestoreOutcome {
        let replaced_had_coins = self.replace_warning();

        let stream = source.open()?;
        let wallet = restore_wallet_from_encrypted(
            stream,
            password,
            self.network(),
            self.settings().backup_max_chars,
        )?;
        let encrypted = wallet.is_encrypted();

        self.replace_wallet(wallet)?;

        // The restore already happened; bookkeeping failures are only logged
        if let Err(e) = self.update_preferences(|prefs| {
            prefs.disarm_backup_reminder();
            prefs.last_restore_time = Some(unix_now());
        }) {
            log::warn!("could not disarm backup reminder: {}", e);
        }
        if let Err(e) = self.reset_blockchain() {
            log::warn!("could not reset blockchain after restore: {}", e);
        }

        Ok(RestoredWallet {
            wallet: self.wallet(),
            encrypted,
            replaced_had_coins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgwallet_core::{encrypt_bytes, KdfParams};
    use std::io::Cursor;

    const FAST: KdfParams = KdfParams::new(64, 1, 1);

    fn backup_of(wallet: &WalletState, password: &str) -> String {
        encrypt_bytes(&wallet.to_bytes().unwrap(), password, FAST).unwrap()
    }

    #[test]
    fn test_pipeline_roundtrip() {
        let mut wallet = WalletState::new(Network::Signet);
        wallet.description = Some("from backup".into());
        let armored = backup_of(&wallet, "pw");

        let restored = restore_wallet_from_encrypted(
            Cursor::new(armored),
            &Password::new("pw"),
            Network::Signet,
            crate::BACKUP_MAX_CHARS,
        )
        .unwrap();
        assert_eq!(restored.description.as_deref(), Some("from backup"));
    }

    #[test]
    fn test_password_is_trimmed_like_input() {
        let armored = backup_of(&WalletState::new(Network::Signet), "pw");
        let result = restore_wallet_from_encrypted(
            Cursor::new(armored),
            &Password::new("  pw\n"),
            Network::Signet,
            crate::BACKUP_MAX_CHARS,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_wrong_password_is_decryption_error() {
        let armored = backup_of(&WalletState::new(Network::Signet), "pw");
        let err = restore_wallet_from_encrypted(
            Cursor::new(armored),
            &Password::new("nope"),
            Network::Signet,
            crate::BACKUP_MAX_CHARS,
        )
        .unwrap_err();
        assert_eq!(err.kind(), RestoreErrorKind::Decryption);
    }

    #[test]
    fn test_oversized_input_fails_before_decryption() {
        let armored = backup_of(&WalletState::new(Network::Signet), "pw");
        let limit = armored.chars().count() - 1;
        let err = restore_wallet_from_encrypted(
            Cursor::new(armored),
            &Password::new("pw"),
            Network::Signet,
            limit,
        )
        .unwrap_err();
        assert!(matches!(err, RestoreError::TooLarge { .. }));
        assert_eq!(err.kind(), RestoreErrorKind::Io);
    }

    #[test]
    fn test_decrypted_garbage_is_format_error() {
        let armored = encrypt_bytes(b"\x00\x01\x02 definitely not a wallet", "pw", FAST).unwrap();
        let err = restore_wallet_from_encrypted(
            Cursor::new(armored),
            &Password::new("pw"),
            Network::Signet,
            crate::BACKUP_MAX_CHARS,
        )
        .unwrap_err();
        assert_eq!(err.kind(), RestoreErrorKind::Format);
    }

    mod handler {
        use super::*;
        use crate::application::AppSettings;
        use crate::reader::FileSource;
        use bitcoin::{Amount, OutPoint};
        use fgwallet_core::WalletOutput;
        use std::path::Path;
        use tempfile::tempdir;

        struct BrokenSource;

        impl BackupSource for BrokenSource {
            fn open(&self) -> io::Result<Box<dyn Read + '_>> {
                Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
            }

            fn describe(&self) -> String {
                "broken".into()
            }
        }

        fn open(dir: &Path) -> WalletApplication {
            WalletApplication::open(AppSettings::new(dir, Network::Regtest)).unwrap()
        }

        fn write_backup(dir: &Path, wallet: &WalletState, password: &str) -> FileSource {
            let path = dir.join("backup.txt");
            std::fs::write(&path, backup_of(wallet, password)).unwrap();
            FileSource::new(path)
        }

        fn funded() -> WalletState {
            let mut wallet = WalletState::new(Network::Regtest);
            wallet.outputs.push(WalletOutput {
                outpoint: OutPoint::null(),
                value: Amount::from_sat(50_000),
                height: Some(1),
            });
            wallet
        }

        #[test]
        fn test_restore_replaces_wallet_and_resets_chain() {
            let dir = tempdir().unwrap();
            let app = open(dir.path());
            app.replace_wallet(funded()).unwrap();
            app.arm_backup_reminder().unwrap();

            let mut backup = WalletState::new(Network::Regtest);
            backup.description = Some("restored".into());
            let source = write_backup(dir.path(), &backup, "secret");

            let restored = app.handle_restore(&source, Password::new("secret")).unwrap();
            assert!(restored.replaced_had_coins);
            assert!(!restored.encrypted);
            assert_eq!(restored.wallet.description.as_deref(), Some("restored"));
            assert_eq!(app.wallet().description.as_deref(), Some("restored"));

            let prefs = app.preferences();
            assert!(!prefs.remind_backup());
            assert!(prefs.last_restore_time.is_some());
            assert!(app.blockchain().load().unwrap().replaying);
        }

        #[test]
        fn test_wrong_password_leaves_wallet_alone() {
            let dir = tempdir().unwrap();
            let app = open(dir.path());
            app.replace_wallet(funded()).unwrap();
            app.arm_backup_reminder().unwrap();
            let before = app.wallet();

            let source = write_backup(dir.path(), &WalletState::new(Network::Regtest), "secret");
            let err = app.handle_restore(&source, Password::new("guess")).unwrap_err();

            assert_eq!(err.kind(), RestoreErrorKind::Decryption);
            assert!(err.is_retryable());
            assert!(Arc::ptr_eq(&before, &app.wallet()));
            assert!(app.preferences().remind_backup());
            assert!(app.preferences().last_restore_time.is_none());
        }

        #[test]
        fn test_unreadable_source_is_io_error() {
            let dir = tempdir().unwrap();
            let app = open(dir.path());
            let before = app.wallet();

            let err = app.handle_restore(&BrokenSource, Password::new("pw")).unwrap_err();
            assert_eq!(err.kind(), RestoreErrorKind::Io);
            assert!(Arc::ptr_eq(&before, &app.wallet()));
        }

        #[test]
        fn test_backup_for_other_network_rejected() {
            let dir = tempdir().unwrap();
            let app = open(dir.path());

            let source = write_backup(dir.path(), &WalletState::new(Network::Bitcoin), "pw");
            let err = app.handle_restore(&source, Password::new("pw")).unwrap_err();
            assert_eq!(err.kind(), RestoreErrorKind::Format);
            assert_eq!(app.wallet().network, Network::Regtest);
        }
    }
}
