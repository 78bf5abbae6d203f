//! FGWallet Restore
//!
//! Restores a wallet from an encrypted backup and swaps it in as the
//! application's wallet.
//!
//! # Pipeline
//!
//! 1. [`reader`] buffers the backup text from a [`BackupSource`], bounded
//!    by a maximum character count
//! 2. [`fgwallet_core::crypto`] decrypts it with the user's password
//! 3. [`deserialize`] parses the structured wallet format, falling back to
//!    a legacy key list
//! 4. [`holder`] persists and swaps the new wallet in one step
//!
//! Each stage fails fast into a single [`RestoreError`]; nothing is
//! replaced unless every stage succeeds.
//!
//! # Example
//!
//! ```ignore
//! use fgwallet_core::Password;
//! use fgwallet_restore::{AppSettings, FileSource, WalletApplication};
//!
//! let app = WalletApplication::open(AppSettings::new("./data", Network::Bitcoin))?;
//! let source = FileSource::new("wallet-backup.txt");
//! match app.handle_restore(&source, Password::new(&entered)) {
//!     Ok(restored) => println!("restored, encrypted: {}", restored.encrypted),
//!     Err(e) => println!("restore failed: {}", e),
//! }
//! ```

pub mod application;
pub mod backup;
pub mod blockchain;
pub mod deserialize;
pub mod diagnostics;
pub mod holder;
pub mod preferences;
pub mod reader;
pub mod restore;
pub mod store;

pub use application::{AppError, AppSettings, WalletApplication};
pub use backup::BackupError;
pub use blockchain::BlockchainStore;
pub use deserialize::restore_wallet_from_structured_or_keys;
pub use holder::{HolderError, WalletHolder};
pub use preferences::Preferences;
pub use reader::{read_backup, BackupSource, FileSource, ReadError};
pub use restore::{
    restore_wallet_from_encrypted, RestoreError, RestoreErrorKind, RestoreOutcome, RestoredWallet,
};
pub use store::StateError;

/// Default bound on backup size, in characters.
pub const BACKUP_MAX_CHARS: usize = 10_000_000;
