#![no_main]

use bitcoin::Network;
use fgwallet_core::{read_keys, write_keys};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Whatever parses must survive a write/read cycle
    if let Ok(keys) = read_keys(text, Network::Bitcoin, 100_000) {
        let written = write_keys(&keys);
        let reread = read_keys(&written, Network::Bitcoin, 1_000_000).expect("written key list parses");
        assert_eq!(reread.len(), keys.len());
    }
});
