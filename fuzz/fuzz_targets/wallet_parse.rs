#![no_main]

use bitcoin::Network;
use fgwallet_core::WalletState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A decrypted backup is attacker-controlled if the password leaked
    if let Ok(wallet) = WalletState::from_bytes(data, Network::Testnet) {
        let _ = wallet.to_bytes();
    }
});
