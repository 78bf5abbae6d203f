//! Security-specific tests for the backup format.
//!
//! These tests verify:
//! 1. Tampering with any part of a backup fails decryption
//! 2. All decrypt failures look the same to the caller
//! 3. Malformed inputs don't panic
//! 4. Secrets don't leak through Debug output or error messages

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bitcoin::secp256k1::SecretKey;
use bitcoin::{Network, PrivateKey};
use fgwallet_core::crypto::decrypt_backup;
use fgwallet_core::{
    decrypt_bytes, encrypt_bytes, read_keys, CryptoError, EncryptedBackup, KdfParams, KeySecret,
    Password, WalletKey, WalletState,
};
use zeroize::Zeroize;

const FAST: KdfParams = KdfParams::new(64, 1, 1);

fn sample_backup() -> Vec<u8> {
    let armored = encrypt_bytes(b"wallet bytes go here", "correct horse", FAST).unwrap();
    STANDARD
        .decode(armored.split_whitespace().collect::<String>())
        .unwrap()
}

fn assert_opaque_failure(result: Result<zeroize::Zeroizing<Vec<u8>>, CryptoError>) {
    match result {
        Err(CryptoError::DecryptionFailed(msg)) => {
            assert_eq!(msg, "invalid password or corrupted backup")
        }
        Err(other) => panic!("unexpected error kind: {:?}", other),
        Ok(_) => panic!("tampered backup decrypted"),
    }
}

// ============================================================================
// 1. Tampering
// ============================================================================

#[test]
fn test_every_byte_flip_fails() {
    let bytes = sample_backup();
    // Header, salt, nonce, ciphertext and tag all matter
    for index in [0, 4, 5, 9, 13, 17, 33, 45, bytes.len() - 1] {
        let mut tampered = bytes.clone();
        tampered[index] ^= 0x01;
        let armored = STANDARD.encode(&tampered);
        assert_opaque_failure(decrypt_bytes(&armored, "correct horse"));
    }
}

#[test]
fn test_swapped_kdf_params_fail() {
    let bytes = sample_backup();
    let mut backup = EncryptedBackup::from_bytes(&bytes).unwrap();
    assert_eq!(backup.params(), FAST);

    // Re-encode with a different t_cost: header is authenticated
    let mut raw = backup.to_bytes();
    raw[9..13].copy_from_slice(&2u32.to_le_bytes());
    backup = EncryptedBackup::from_bytes(&raw).unwrap();
    assert_opaque_failure(decrypt_backup(&backup, "correct horse"));
}

#[test]
fn test_truncated_backup_fails() {
    let bytes = sample_backup();
    for len in [0, 4, 17, 45, bytes.len() - 1] {
        let armored = STANDARD.encode(&bytes[..len]);
        assert_opaque_failure(decrypt_bytes(&armored, "correct horse"));
    }
}

#[test]
fn test_hostile_kdf_params_rejected_without_work() {
    let mut bytes = sample_backup();
    // 4 TiB of memory would hang or abort if it were honoured
    bytes[5..9].copy_from_slice(&u32::MAX.to_le_bytes());
    assert!(EncryptedBackup::from_bytes(&bytes).is_err());
    assert_opaque_failure(decrypt_bytes(&STANDARD.encode(&bytes), "correct horse"));
}

// ============================================================================
// 2. No oracle
// ============================================================================

#[test]
fn test_wrong_password_and_corruption_are_indistinguishable() {
    let armored = encrypt_bytes(b"secret", "pw", FAST).unwrap();

    let wrong_password = decrypt_bytes(&armored, "pW").unwrap_err().to_string();
    let bad_armor = decrypt_bytes("!!!not base64!!!", "pw").unwrap_err().to_string();
    let mut bytes = STANDARD
        .decode(armored.split_whitespace().collect::<String>())
        .unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x80;
    let bad_tag = decrypt_bytes(&STANDARD.encode(&bytes), "pw")
        .unwrap_err()
        .to_string();

    assert_eq!(wrong_password, bad_armor);
    assert_eq!(wrong_password, bad_tag);
}

#[test]
fn test_fresh_salt_and_nonce_per_backup() {
    let a = encrypt_bytes(b"same", "pw", FAST).unwrap();
    let b = encrypt_bytes(b"same", "pw", FAST).unwrap();
    assert_ne!(a, b);
}

// ============================================================================
// 3. Malformed input
// ============================================================================

#[test]
fn test_random_inputs_dont_panic() {
    for seed in 0u8..=255 {
        let garbage: Vec<u8> = (0..(seed as usize * 3)).map(|i| (i as u8) ^ seed).collect();
        let _ = EncryptedBackup::from_bytes(&garbage);
        let _ = decrypt_bytes(&String::from_utf8_lossy(&garbage), "pw");
        let _ = WalletState::from_bytes(&garbage, Network::Testnet);
        let _ = read_keys(&String::from_utf8_lossy(&garbage), Network::Testnet, 10_000);
    }
}

#[test]
fn test_armor_tolerates_rewrapping() {
    let armored = encrypt_bytes(b"payload", "pw", FAST).unwrap();
    let one_line: String = armored.split_whitespace().collect();
    let crlf = armored.replace('\n', "\r\n");
    let indented: String = armored.lines().map(|l| format!("   {}\n", l)).collect();

    for text in [one_line, crlf, indented] {
        assert_eq!(&decrypt_bytes(&text, "pw").unwrap()[..], b"payload");
    }
}

// ============================================================================
// 4. No leaks
// ============================================================================

#[test]
fn test_secrets_redacted_in_debug() {
    let password = Password::new("correct horse");
    assert!(!format!("{:?}", password).contains("correct"));

    let sk = SecretKey::from_slice(&[0x42u8; 32]).unwrap();
    let private = PrivateKey::new(sk, Network::Testnet);
    let wif = private.to_wif();
    let key = WalletKey::from_private(&private, 0);
    assert!(matches!(key.secret, KeySecret::Plain(_)));
    assert!(!format!("{:?}", key).contains(&wif));
}

#[test]
fn test_key_list_errors_dont_echo_keys() {
    let sk = SecretKey::from_slice(&[0x42u8; 32]).unwrap();
    let wif = PrivateKey::new(sk, Network::Bitcoin).to_wif();
    let err = read_keys(&format!("{}\n", wif), Network::Testnet, 10_000).unwrap_err();
    assert!(!err.to_string().contains(&wif));

    let mut truncated = wif.clone();
    truncated.pop();
    let err = read_keys(&truncated, Network::Testnet, 10_000).unwrap_err();
    assert!(!err.to_string().contains(&truncated));
    truncated.zeroize();
}

#[test]
fn test_password_from_string_wipes_source() {
    let entered = String::from("  typed password \n");
    let password = Password::from(entered);
    assert_eq!(password.as_str(), "typed password");
    assert!(!password.is_empty());
    assert!(Password::new(" \t\n").is_empty());
}

#[test]
fn test_encrypted_keys_hide_wif_in_wallet_file() {
    let sk = SecretKey::from_slice(&[0x24u8; 32]).unwrap();
    let private = PrivateKey::new(sk, Network::Testnet);
    let wif = private.to_wif();

    let mut wallet = WalletState::from_keys(Network::Testnet, vec![WalletKey::from_private(&private, 0)]);
    wallet.encrypt_keys("spend", FAST).unwrap();
    assert!(wallet.is_encrypted());

    let bytes = wallet.to_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(!text.contains(&wif));
    assert!(!text.contains(&hex::encode([0x24u8; 32])));
}
