//! OpenSSL `Salted__` backups
//!
//! Older wallet versions exported backups the way
//! `openssl enc -aes-256-cbc -md md5 -a` does:
//!
//! ```text
//! "Salted__" | salt (8) | AES-256-CBC ciphertext, PKCS#7 padded
//! ```
//!
//! Key and IV come from EVP_BytesToKey with MD5 and a single round. Only
//! decryption is supported; new backups always use the Argon2id envelope.

use crate::crypto::CryptoError;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};
use zeroize::Zeroizing;

const MAGIC: &[u8; 8] = b"Salted__";
const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const BLOCK_LEN: usize = 16;

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Whether decoded armor is in the OpenSSL salted format.
pub fn is_salted(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

/// Decrypt a decoded `Salted__` blob. Every failure is the same opaque
/// [`CryptoError::DecryptionFailed`].
pub fn decrypt_salted(bytes: &[u8], password: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let body = bytes.strip_prefix(MAGIC).ok_or_else(CryptoError::decryption)?;
    if body.len() < SALT_LEN + BLOCK_LEN || (body.len() - SALT_LEN) % BLOCK_LEN != 0 {
        return Err(CryptoError::decryption());
    }
    let (salt, ciphertext) = body.split_at(SALT_LEN);

    let material = bytes_to_key(&password_bytes(password), salt);
    let cipher = Aes256CbcDec::new_from_slices(&material[..KEY_LEN], &material[KEY_LEN..])
        .map_err(|_| CryptoError::decryption())?;
    let plain = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::decryption())?;

    Ok(Zeroizing::new(plain))
}

/// PKCS#5 password encoding: the low byte of every UTF-16 unit. Identical
/// to UTF-8 for ASCII passwords.
fn password_bytes(password: &str) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(password.encode_utf16().map(|unit| unit as u8).collect())
}

/// EVP_BytesToKey(MD5, count = 1): `D_i = MD5(D_{i-1} | password | salt)`.
fn bytes_to_key(password: &[u8], salt: &[u8]) -> Zeroizing<[u8; KEY_LEN + IV_LEN]> {
    let mut out = Zeroizing::new([0u8; KEY_LEN + IV_LEN]);
    let mut filled = 0;
    let mut previous: Option<md5::digest::Output<Md5>> = None;

    while filled < out.len() {
        let mut hasher = Md5::new();
        if let Some(prev) = &previous {
            hasher.update(prev);
        }
        hasher.update(password);
        hasher.update(salt);
        let digest = hasher.finalize();

        let take = digest.len().min(out.len() - filled);
        out[filled..filled + take].copy_from_slice(&digest[..take]);
        filled += take;
        previous = Some(digest);
    }
    out
}
