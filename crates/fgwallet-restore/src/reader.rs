//! Backup source reader
//!
//! Buffers a backup as UTF-8 text, refusing anything over the configured
//! character limit before it reaches the decryptor.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("read more than the limit of {limit} characters")]
    TooLarge { limit: usize },
}

/// Where a backup comes from: a file, a content provider, a test buffer.
pub trait BackupSource {
    /// Open a fresh stream over the backup.
    fn open(&self) -> io::Result<Box<dyn Read + '_>>;

    /// Human-readable name for logs and messages.
    fn describe(&self) -> String;
}

/// A backup file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackupSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read at most `max_chars` characters of UTF-8 text from `reader`.
///
/// The reader is consumed, so the underlying stream is closed on every
/// return path.
pub fn read_backup<R: Read>(reader: R, max_chars: usize) -> Result<String, ReadError> {
    // A UTF-8 char is at most 4 bytes
    let byte_limit = max_chars.saturating_mul(4);

    let mut bytes = Vec::new();
    reader
        .take((byte_limit as u64).saturating_add(1))
        .read_to_end(&mut bytes)?;
    if bytes.len() > byte_limit {
        return Err(ReadError::TooLarge { limit: max_chars });
    }

    let text = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    if text.chars().count() > max_chars {
        return Err(ReadError::TooLarge { limit: max_chars });
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_within_limit() {
        let text = read_backup(Cursor::new("abc\ndef\n"), 8).unwrap();
        assert_eq!(text, "abc\ndef\n");
    }

    #[test]
    fn test_rejects_over_limit() {
        let result = read_backup(Cursor::new("abcdefghi"), 8);
        assert!(matches!(result, Err(ReadError::TooLarge { limit: 8 })));
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        let text = read_backup(Cursor::new("äöüß"), 4).unwrap();
        assert_eq!(text.chars().count(), 4);
        assert!(read_backup(Cursor::new("äöüßx"), 4).is_err());
    }

    #[test]
    fn test_stops_reading_huge_streams() {
        let endless = io::repeat(b'A');
        let result = read_backup(endless, 1000);
        assert!(matches!(result, Err(ReadError::TooLarge { limit: 1000 })));
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let result = read_backup(Cursor::new(vec![0xFF, 0xFE, 0x00]), 100);
        match result {
            Err(ReadError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_file_source() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "armored backup").unwrap();

        let source = FileSource::new(file.path());
        let text = read_backup(source.open().unwrap(), 100).unwrap();
        assert_eq!(text, "armored backup");
        assert_eq!(source.describe(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file() {
        let source = FileSource::new("/nonexistent/backup.txt");
        assert!(source.open().is_err());
    }
}
