#![no_main]

use fgwallet_core::EncryptedBackup;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Binary envelope parsing must never panic
    if let Ok(backup) = EncryptedBackup::from_bytes(data) {
        let bytes = backup.to_bytes();
        assert_eq!(EncryptedBackup::from_bytes(&bytes).ok(), Some(backup.clone()));

        let armored = backup.to_armored();
        assert_eq!(EncryptedBackup::from_armored(&armored).ok(), Some(backup));
    }

    // Neither must armor parsing of arbitrary text
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = EncryptedBackup::from_armored(text);
    }
});
