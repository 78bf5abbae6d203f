//! Legacy key list format
//!
//! Older backups are plain text, one private key per line:
//!
//! ```text
//! # comment
//! <WIF> [<creation time, ISO-8601 UTC>]
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use crate::wallet::{KeySecret, WalletKey};
use bitcoin::{Network, NetworkKind, PrivateKey};
use chrono::{DateTime, Utc};
use thiserror::Error;

const HEADER: &str = "# KEEP YOUR PRIVATE KEYS SAFE! Anyone who can read this can spend your coins.\n";

#[derive(Error, Debug)]
pub enum KeyFileError {
    #[error("read more than the limit of {limit} characters")]
    TooLong { limit: usize },

    // Never echo the line itself: it holds a private key
    #[error("line {line}: invalid private key")]
    InvalidKey { line: usize },

    #[error("line {line}: key is not for this network")]
    WrongNetwork { line: usize },

    // The token may be a misplaced key, so it is not echoed either
    #[error("line {line}: invalid creation time")]
    InvalidTimestamp { line: usize },

    #[error("no keys found")]
    NoKeys,
}

/// Parse a key list for `network`, reading at most `max_chars` characters.
pub fn read_keys(text: &str, network: Network, max_chars: usize) -> Result<Vec<WalletKey>, KeyFileError> {
    let kind = NetworkKind::from(network);
    let mut keys = Vec::new();
    let mut char_count = 0usize;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        char_count += line.chars().count();
        if char_count > max_chars {
            return Err(KeyFileError::TooLong { limit: max_chars });
        }

        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let wif = parts.next().unwrap_or_default();
        let key = PrivateKey::from_wif(wif).map_err(|_| KeyFileError::InvalidKey { line: line_no })?;
        if key.network != kind {
            return Err(KeyFileError::WrongNetwork { line: line_no });
        }

        let creation_time = match parts.next() {
            Some(value) => {
                parse_time(value).ok_or(KeyFileError::InvalidTimestamp { line: line_no })?
            }
            None => 0,
        };

        keys.push(WalletKey::from_private(&key, creation_time));
    }

    if keys.is_empty() {
        return Err(KeyFileError::NoKeys);
    }
    Ok(keys)
}

fn parse_time(value: &str) -> Option<u64> {
    let parsed = DateTime::parse_from_rfc3339(value).ok()?;
    u64::try_from(parsed.timestamp()).ok()
}

fn format_time(secs: u64) -> Option<String> {
    let secs = i64::try_from(secs).ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Write keys in the legacy format. Only keys with an unencrypted private
/// key are written.
pub fn write_keys(keys: &[WalletKey]) -> String {
    let mut out = String::from(HEADER);
    for key in keys {
        if let KeySecret::Plain(wif) = &key.secret {
            out.push_str(wif);
            if key.creation_time > 0 {
                if let Some(time) = format_time(key.creation_time) {
                    out.push(' ');
                    out.push_str(&time);
                }
            }
            out.push('\n');
        }
    }
    out
}
