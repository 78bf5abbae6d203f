//! Password-based backup encryption
//!
//! Backups are encrypted with Argon2id + AES-256-GCM and armored as
//! base64 text so they survive email, clipboards and file pickers.
//!
//! # Envelope
//!
//! ```text
//! "FGWB" | version (1) | m_cost (u32 LE) | t_cost (u32 LE) | p_cost (u32 LE)
//!        | salt (16) | nonce (12) | ciphertext + tag
//! ```
//!
//! The header up to `p_cost` is authenticated as associated data, so the
//! stored KDF parameters cannot be swapped without failing decryption.
//!
//! # Security Notes
//!
//! - Every failure on the decrypt side reports the same error: a wrong
//!   password and a corrupted backup are indistinguishable to the caller.
//! - KDF parameters read from a backup are bounded before any work is done.
//!
//! Backups written by older wallet versions use the OpenSSL `Salted__`
//! format instead; [`decrypt_bytes`] reads those too, see [`crate::openssl`].

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
    Aes256Gcm, Key, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use crate::openssl;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use thiserror::Error;
use zeroize::Zeroizing;

const MAGIC: &[u8; 4] = b"FGWB";
const VERSION: u8 = 1;

/// magic + version + three u32 KDF parameters
const HEADER_LEN: usize = 4 + 1 + 12;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// Armor line width
const ARMOR_COLUMNS: usize = 76;

// Upper bounds for parameters read from untrusted backups
const MAX_M_COST: u32 = 1024 * 1024; // 1 GiB
const MAX_T_COST: u32 = 64;
const MAX_P_COST: u32 = 16;

const DECRYPTION_FAILED: &str = "invalid password or corrupted backup";

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),
}

impl CryptoError {
    pub(crate) fn decryption() -> Self {
        CryptoError::DecryptionFailed(DECRYPTION_FAILED.to_string())
    }
}

/// Argon2id cost parameters stored in every backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB
    pub m_cost: u32,
    /// Iterations
    pub t_cost: u32,
    /// Lanes
    pub p_cost: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 iterations, 4 lanes.
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 4,
        }
    }
}

impl KdfParams {
    pub const fn new(m_cost: u32, t_cost: u32, p_cost: u32) -> Self {
        Self {
            m_cost,
            t_cost,
            p_cost,
        }
    }

    fn within_limits(&self) -> bool {
        self.m_cost <= MAX_M_COST && self.t_cost <= MAX_T_COST && self.p_cost <= MAX_P_COST
    }

    fn argon2(&self) -> Result<Argon2<'static>, argon2::Error> {
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, Some(KEY_LEN))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// A parsed backup envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBackup {
    params: KdfParams,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    /// AES-256-GCM ciphertext + tag
    ciphertext: Vec<u8>,
}

impl EncryptedBackup {
    pub fn params(&self) -> KdfParams {
        self.params
    }

    fn header(&self) -> [u8; HEADER_LEN] {
        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(MAGIC);
        header[4] = VERSION;
        header[5..9].copy_from_slice(&self.params.m_cost.to_le_bytes());
        header[9..13].copy_from_slice(&self.params.t_cost.to_le_bytes());
        header[13..17].copy_from_slice(&self.params.p_cost.to_le_bytes());
        header
    }

    /// Serialize to the binary envelope.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(HEADER_LEN + SALT_LEN + NONCE_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.header());
        bytes.extend_from_slice(&self.salt);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parse the binary envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        // At least one byte of plaintext plus the tag
        if bytes.len() < HEADER_LEN + SALT_LEN + NONCE_LEN + TAG_LEN + 1 {
            return Err(CryptoError::decryption());
        }
        if &bytes[0..4] != MAGIC || bytes[4] != VERSION {
            return Err(CryptoError::decryption());
        }

        let read_u32 = |at: usize| {
            let mut word = [0u8; 4];
            word.copy_from_slice(&bytes[at..at + 4]);
            u32::from_le_bytes(word)
        };
        let params = KdfParams::new(read_u32(5), read_u32(9), read_u32(13));
        if !params.within_limits() {
            return Err(CryptoError::decryption());
        }

        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let body = &bytes[HEADER_LEN..];
        salt.copy_from_slice(&body[..SALT_LEN]);
        nonce.copy_from_slice(&body[SALT_LEN..SALT_LEN + NONCE_LEN]);

        Ok(Self {
            params,
            salt,
            nonce,
            ciphertext: body[SALT_LEN + NONCE_LEN..].to_vec(),
        })
    }

    /// Base64 armor, wrapped at 76 columns.
    pub fn to_armored(&self) -> String {
        let encoded = STANDARD.encode(self.to_bytes());
        let mut armored = String::with_capacity(encoded.len() + encoded.len() / ARMOR_COLUMNS + 1);
        // base64 output is ASCII, so byte chunks are char boundaries
        for line in encoded.as_bytes().chunks(ARMOR_COLUMNS) {
            armored.push_str(&String::from_utf8_lossy(line));
            armored.push('\n');
        }
        armored
    }

    /// Parse base64 armor. Whitespace anywhere in the text is ignored.
    pub fn from_armored(text: &str) -> Result<Self, CryptoError> {
        Self::from_bytes(&decode_armor(text)?)
    }
}

fn decode_armor(text: &str) -> Result<Vec<u8>, CryptoError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| CryptoError::decryption())
}

fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, argon2::Error> {
    let argon2 = params.argon2()?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2.hash_password_into(password.as_bytes(), salt, &mut key[..])?;
    Ok(key)
}

/// Encrypt `plain` with `password` and return armored text.
///
/// Every call draws a fresh salt and nonce.
pub fn encrypt_bytes(plain: &[u8], password: &str, params: KdfParams) -> Result<String, CryptoError> {
    if !params.within_limits() {
        return Err(CryptoError::KeyDerivationFailed(format!(
            "parameters out of range: {:?}",
            params
        )));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let nonce_arr = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&nonce_arr);

    let key = derive_key(password, &salt, &params)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;

    let mut backup = EncryptedBackup {
        params,
        salt,
        nonce,
        ciphertext: Vec::new(),
    };

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let header = backup.header();
    backup.ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plain,
                aad: &header,
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(backup.to_armored())
}

/// Decrypt armored backup text. Legacy `Salted__` input is handed to
/// [`openssl::decrypt_salted`].
///
/// # Errors
/// [`CryptoError::DecryptionFailed`] for a wrong password, a tampered or
/// truncated envelope, bad armor or out-of-range parameters alike.
pub fn decrypt_bytes(armored: &str, password: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let bytes = decode_armor(armored)?;
    if openssl::is_salted(&bytes) {
        return openssl::decrypt_salted(&bytes, password);
    }
    let backup = EncryptedBackup::from_bytes(&bytes)?;
    decrypt_backup(&backup, password)
}

/// Decrypt an already parsed envelope.
pub fn decrypt_backup(
    backup: &EncryptedBackup,
    password: &str,
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let key =
        derive_key(password, &backup.salt, &backup.params).map_err(|_| CryptoError::decryption())?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key[..]));
    let header = backup.header();
    let plain = cipher
        .decrypt(
            Nonce::from_slice(&backup.nonce),
            Payload {
                msg: backup.ciphertext.as_slice(),
                aad: &header,
            },
        )
        .map_err(|_| CryptoError::decryption())?;

    Ok(Zeroizing::new(plain))
}
