//! Wallet deserializer
//!
//! Decrypted backups come in two formats: the structured wallet format,
//! and the plain-text key list older versions exported.

use crate::restore::RestoreError;
use bitcoin::Network;
use fgwallet_core::{read_keys, WalletState};

/// Parse `plain` as a structured wallet, falling back to a key list.
pub fn restore_wallet_from_structured_or_keys(
    plain: &[u8],
    network: Network,
    max_chars: usize,
) -> Result<WalletState, RestoreError> {
    let structured_err = match WalletState::from_bytes(plain, network) {
        Ok(wallet) => return Ok(wallet),
        Err(e) => e,
    };
    log::debug!("not a structured wallet ({}), trying key list", structured_err);

    let keys = std::str::from_utf8(plain)
        .map_err(|e| e.to_string())
        .and_then(|text| read_keys(text, network, max_chars).map_err(|e| e.to_string()));

    match keys {
        Ok(keys) => {
            log::info!("restored {} keys from key list", keys.len());
            Ok(WalletState::from_keys(network, keys))
        }
        Err(keys_err) => Err(RestoreError::Format(format!(
            "cannot read wallet ({}) or key list ({})",
            structured_err, keys_err
        ))),
    }
}
