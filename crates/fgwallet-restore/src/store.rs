//! JSON state files
//!
//! Small application state (preferences, chain position) is kept as
//! pretty-printed JSON next to the wallet file.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load `path`, or the default value when the file does not exist yet.
pub fn load_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StateError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    } else {
        Ok(T::default())
    }
}

/// Save `value` to `path`.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StateError> {
    let contents = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &contents)?;
    Ok(())
}

/// Replace `path` with `contents` in one rename, so readers see either the
/// old file or the new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
