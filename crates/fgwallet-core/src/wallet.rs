//! Wallet state
//!
//! The in-memory wallet the application holds: imported keys, the account
//! extended public key, known outputs and chain position. A restore never
//! edits a `WalletState` in place; it builds a new one and swaps it in.
//!
//! # Structured format
//!
//! Serialized as a JSON object tagged with `"format": "fgwallet-wallet"` and
//! a version number, so that arbitrary JSON (or a key list that happens to
//! parse) is never mistaken for a wallet.

use crate::crypto::{encrypt_bytes, CryptoError, KdfParams};
use crate::keys::{derive_account_xpub, KeyError};
use bitcoin::bip32::Xpub;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Amount, Network, NetworkKind, OutPoint, PrivateKey, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use zeroize::Zeroize;

const FORMAT_TAG: &str = "fgwallet-wallet";
const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a wallet file (format tag {0:?})")]
    NotWalletFormat(String),

    #[error("unsupported wallet format version {0}")]
    UnsupportedVersion(u32),

    #[error("bad wallet backup network parameters: expected {expected}, found {found}")]
    NetworkMismatch { expected: Network, found: Network },

    #[error("inconsistent wallet: {0}")]
    Inconsistent(String),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Secret half of a wallet key.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum KeySecret {
    /// WIF private key
    Plain(String),
    /// WIF private key encrypted with the spending password (armored)
    Encrypted(String),
    /// Public key only
    WatchOnly,
}

impl Drop for KeySecret {
    fn drop(&mut self) {
        if let KeySecret::Plain(wif) = self {
            wif.zeroize();
        }
    }
}

impl std::fmt::Debug for KeySecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySecret::Plain(_) => f.write_str("Plain(<redacted>)"),
            KeySecret::Encrypted(_) => f.write_str("Encrypted(..)"),
            KeySecret::WatchOnly => f.write_str("WatchOnly"),
        }
    }
}

/// An imported (non-deterministic) key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletKey {
    pub public_key: PublicKey,
    pub secret: KeySecret,
    /// Unix seconds, 0 when unknown
    #[serde(default)]
    pub creation_time: u64,
}

impl WalletKey {
    pub fn from_private(key: &PrivateKey, creation_time: u64) -> Self {
        let secp = Secp256k1::new();
        Self {
            public_key: key.public_key(&secp),
            secret: KeySecret::Plain(key.to_wif()),
            creation_time,
        }
    }

    pub fn watch_only(public_key: PublicKey, creation_time: u64) -> Self {
        Self {
            public_key,
            secret: KeySecret::WatchOnly,
            creation_time,
        }
    }

    /// The private key, if held unencrypted.
    pub fn private_key(&self) -> Option<PrivateKey> {
        match &self.secret {
            KeySecret::Plain(wif) => PrivateKey::from_wif(wif).ok(),
            _ => None,
        }
    }
}

/// Account-level extended public key of the deterministic chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountKey {
    pub xpub: Xpub,
    /// Unix seconds
    pub creation_time: u64,
}

/// An output the wallet can spend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOutput {
    #[serde(with = "outpoint_serde")]
    pub outpoint: OutPoint,
    #[serde(with = "amount_serde")]
    pub value: Amount,
    /// Confirmation height; `None` while unconfirmed
    pub height: Option<u32>,
}

mod outpoint_serde {
    use bitcoin::OutPoint;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(outpoint: &OutPoint, serializer: S) -> Result<S::Ok, S::Error> {
        outpoint.to_string().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OutPoint, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

mod amount_serde {
    use bitcoin::Amount;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(amount.to_sat())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        Ok(Amount::from_sat(u64::deserialize(deserializer)?))
    }
}

/// Which outputs count towards a balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceType {
    /// Everything, including unconfirmed outputs
    Estimated,
    /// Confirmed outputs only
    Available,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletState {
    pub network: Network,
    #[serde(default)]
    pub keys: Vec<WalletKey>,
    #[serde(default)]
    pub account: Option<AccountKey>,
    #[serde(default)]
    pub outputs: Vec<WalletOutput>,
    #[serde(default)]
    pub last_block_seen: Option<u32>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
struct WalletFileRef<'a> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    wallet: &'a WalletState,
}

#[derive(Deserialize)]
struct WalletFile {
    format: String,
    version: u32,
    #[serde(flatten)]
    wallet: WalletState,
}

impl WalletState {
    /// An empty wallet.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            keys: Vec::new(),
            account: None,
            outputs: Vec::new(),
            last_block_seen: None,
            description: None,
        }
    }

    /// A wallet holding only imported keys, e.g. from a legacy key list.
    pub fn from_keys(network: Network, keys: Vec<WalletKey>) -> Self {
        let mut wallet = Self::new(network);
        wallet.import_keys(keys);
        wallet
    }

    /// A deterministic wallet rooted at `seed`.
    pub fn from_seed(network: Network, seed: &[u8], creation_time: u64) -> Result<Self, WalletError> {
        let mut wallet = Self::new(network);
        wallet.account = Some(AccountKey {
            xpub: derive_account_xpub(seed, network)?,
            creation_time,
        });
        Ok(wallet)
    }

    /// Add keys, skipping ones already present. Returns how many were added.
    pub fn import_keys(&mut self, keys: Vec<WalletKey>) -> usize {
        let mut added = 0;
        for key in keys {
            if !self.keys.iter().any(|k| k.public_key == key.public_key) {
                self.keys.push(key);
                added += 1;
            }
        }
        added
    }

    pub fn balance(&self, balance_type: BalanceType) -> Amount {
        self.outputs
            .iter()
            .filter(|o| match balance_type {
                BalanceType::Estimated => true,
                BalanceType::Available => o.height.is_some(),
            })
            .fold(Amount::ZERO, |acc, o| {
                acc.checked_add(o.value).unwrap_or(Amount::MAX)
            })
    }

    /// Whether spending keys are protected by a spending password.
    pub fn is_encrypted(&self) -> bool {
        self.keys
            .iter()
            .any(|k| matches!(k.secret, KeySecret::Encrypted(_)))
    }

    /// Encrypt every plain private key with `password`.
    pub fn encrypt_keys(&mut self, password: &str, params: KdfParams) -> Result<(), WalletError> {
        for key in &mut self.keys {
            if let KeySecret::Plain(wif) = &key.secret {
                let armored = encrypt_bytes(wif.as_bytes(), password, params)?;
                key.secret = KeySecret::Encrypted(armored);
            }
        }
        Ok(())
    }

    /// Forget chain-derived data ahead of a replay from genesis.
    pub fn reset_chain_state(&mut self) {
        self.outputs.clear();
        self.last_block_seen = None;
    }

    /// Internal consistency: unique keys, private keys matching their
    /// public keys, and everything on this wallet's network.
    pub fn is_consistent(&self) -> Result<(), WalletError> {
        let kind = NetworkKind::from(self.network);
        let secp = Secp256k1::new();
        let mut seen = HashSet::new();

        for key in &self.keys {
            if !seen.insert(key.public_key) {
                return Err(WalletError::Inconsistent(format!(
                    "duplicate key {}",
                    key.public_key
                )));
            }
            if let KeySecret::Plain(wif) = &key.secret {
                let private = PrivateKey::from_wif(wif).map_err(|_| {
                    WalletError::Inconsistent(format!("unreadable private key for {}", key.public_key))
                })?;
                if private.network != kind {
                    return Err(WalletError::Inconsistent(format!(
                        "key {} belongs to another network",
                        key.public_key
                    )));
                }
                if private.public_key(&secp) != key.public_key {
                    return Err(WalletError::Inconsistent(format!(
                        "private key does not match {}",
                        key.public_key
                    )));
                }
            }
        }

        if let Some(account) = &self.account {
            if account.xpub.network != kind {
                return Err(WalletError::Inconsistent(
                    "account key belongs to another network".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Serialize to the structured format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WalletError> {
        let file = WalletFileRef {
            format: FORMAT_TAG,
            version: FORMAT_VERSION,
            wallet: self,
        };
        Ok(serde_json::to_vec_pretty(&file)?)
    }

    /// Parse the structured format, requiring `expected` as network.
    pub fn from_bytes(bytes: &[u8], expected: Network) -> Result<Self, WalletError> {
        let file: WalletFile = serde_json::from_slice(bytes)?;
        if file.format != FORMAT_TAG {
            return Err(WalletError::NotWalletFormat(file.format));
        }
        if file.version != FORMAT_VERSION {
            return Err(WalletError::UnsupportedVersion(file.version));
        }
        if file.wallet.network != expected {
            return Err(WalletError::NetworkMismatch {
                expected,
                found: file.wallet.network,
            });
        }
        file.wallet.is_consistent()?;
        Ok(file.wallet)
    }
}
