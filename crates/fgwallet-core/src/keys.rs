//! Seed and account key helpers
//!
//! Derivation itself is done by the `bitcoin` crate; this module only fixes
//! the paths and formats the wallet uses.

use bip39::{Language, Mnemonic};
use bitcoin::bip32::{DerivationPath, Xpriv, Xpub};
use bitcoin::secp256k1::Secp256k1;
use bitcoin::Network;
use thiserror::Error;

/// Account path of the deterministic key chain (BIP-32 account 0, hardened)
pub const ACCOUNT_PATH: &str = "m/0'";

#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),
    #[error("Derivation failed: {0}")]
    DerivationFailed(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Generate a new 12-word English mnemonic.
pub fn generate_mnemonic() -> Result<Mnemonic, KeyError> {
    Mnemonic::generate_in(Language::English, 12).map_err(|e| KeyError::InvalidMnemonic(e.to_string()))
}

/// Parse a mnemonic from words.
pub fn parse_mnemonic(words: &str) -> Result<Mnemonic, KeyError> {
    Mnemonic::parse_in(Language::English, words).map_err(|e| KeyError::InvalidMnemonic(e.to_string()))
}

/// Derive the account-level extended public key from a seed.
pub fn derive_account_xpub(seed: &[u8], network: Network) -> Result<Xpub, KeyError> {
    let secp = Secp256k1::new();
    let master =
        Xpriv::new_master(network, seed).map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    let path: DerivationPath = ACCOUNT_PATH
        .parse()
        .map_err(|e: bitcoin::bip32::Error| KeyError::InvalidPath(e.to_string()))?;

    let account = master
        .derive_priv(&secp, &path)
        .map_err(|e| KeyError::DerivationFailed(e.to_string()))?;

    Ok(Xpub::from_priv(&secp, &account))
}

/// Shareable form of an extended public key: `<xpub>?c=<created>&h=bip32`.
///
/// `c` is the key creation time in unix seconds so a watch-only wallet
/// knows where to start scanning.
pub fn extended_public_key_uri(xpub: &Xpub, creation_time: u64) -> String {
    format!("{}?c={}&h=bip32", xpub, creation_time)
}
