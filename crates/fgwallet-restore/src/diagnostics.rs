//! Maintenance actions behind the diagnostics screen.

use crate::application::{AppError, WalletApplication};
use fgwallet_core::extended_public_key_uri;

impl WalletApplication {
    /// User asked for a resync from scratch.
    pub fn initiate_reset(&self) -> Result<(), AppError> {
        log::info!("manually initiated blockchain reset");
        self.reset_blockchain()
    }

    /// The account xpub as a shareable URI, if the wallet has a key chain.
    pub fn extended_public_key(&self) -> Option<String> {
        let wallet = self.wallet();
        let account = wallet.account.as_ref()?;
        let uri = extended_public_key_uri(&account.xpub, account.creation_time);
        log::info!("xpub exported: {}", uri);
        Some(uri)
    }
}
