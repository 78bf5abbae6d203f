//! FGWallet Core
//!
//! Wallet state and the primitives the restore flow is built from.
//!
//! # Encrypted Backups
//!
//! Wallet backups are encrypted with Argon2id + AES-256-GCM and armored
//! as base64 text, see [`crypto`].
//!
//! # Wallet Formats
//!
//! A decrypted backup holds either the structured wallet format
//! ([`wallet::WalletState::from_bytes`]) or a legacy list of WIF private
//! keys ([`keyfile::read_keys`]).

pub mod balance;
pub mod crypto;
pub mod keyfile;
pub mod keys;
pub mod memory;
pub mod openssl;
pub mod wallet;

pub use balance::{BalanceView, BalanceWarning, BlockchainState, SyncProgress};
pub use crypto::{decrypt_bytes, encrypt_bytes, CryptoError, EncryptedBackup, KdfParams};
pub use keyfile::{read_keys, write_keys, KeyFileError};
pub use keys::{derive_account_xpub, extended_public_key_uri, KeyError};
pub use memory::Password;
pub use wallet::{AccountKey, BalanceType, KeySecret, WalletError, WalletKey, WalletOutput, WalletState};
