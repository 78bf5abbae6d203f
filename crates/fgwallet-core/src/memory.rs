//! Secret memory handling
//!
//! Passwords and other secrets live in a [`SecretBuffer`]: locked with
//! `mlock()` where the platform allows it, and zeroized when dropped.
//! Locking and core dump prevention are best-effort; unprivileged
//! environments may refuse them and we only log a warning.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use zeroize::Zeroize;

static CORE_DUMPS_DISABLED: AtomicBool = AtomicBool::new(false);

/// Disable core dumps for the current process so a crash never writes
/// passwords or decrypted wallets to disk.
///
/// Idempotent. Returns `true` once core dumps are off; a failed attempt
/// is retried on the next call.
pub fn disable_core_dumps() -> bool {
    if CORE_DUMPS_DISABLED.load(Ordering::SeqCst) {
        return true;
    }

    #[cfg(unix)]
    {
        // SAFETY: setrlimit(RLIMIT_CORE, 0) only lowers a process limit
        let rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &rlim) } != 0 {
            log::warn!(
                "failed to disable core dumps: {}",
                std::io::Error::last_os_error()
            );
            return false;
        }
        CORE_DUMPS_DISABLED.store(true, Ordering::SeqCst);
        true
    }

    #[cfg(not(unix))]
    {
        log::warn!("core dump prevention not supported on this platform");
        false
    }
}

/// Lock a memory region so it is never swapped out.
///
/// # Safety
///
/// `ptr` must point to a live allocation of at least `len` bytes.
pub unsafe fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        if libc::mlock(ptr as *const libc::c_void, len) != 0 {
            log::warn!(
                "mlock failed for {} bytes: {}",
                len,
                std::io::Error::last_os_error()
            );
            return false;
        }
        true
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        false
    }
}

/// Unlock a region previously passed to [`mlock`].
///
/// # Safety
///
/// `ptr` and `len` must match an earlier `mlock` call on a live allocation.
pub unsafe fn munlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return true;
    }

    #[cfg(unix)]
    {
        libc::munlock(ptr as *const libc::c_void, len) == 0
    }

    #[cfg(not(unix))]
    {
        let _ = ptr;
        true
    }
}

/// Fixed-size heap buffer, mlocked for its lifetime and zeroized on drop.
pub struct SecretBuffer {
    data: Vec<u8>,
    locked_len: usize,
    locked: bool,
}

impl SecretBuffer {
    /// Copy `bytes` into a fresh locked buffer.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let data = bytes.to_vec();
        // SAFETY: `data` is a live allocation of `data.len()` bytes and is
        // never reallocated while the buffer exists
        let locked = unsafe { mlock(data.as_ptr(), data.len()) };
        Self {
            locked_len: data.len(),
            data,
            locked,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the pages are actually locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.data.zeroize();
        if self.locked {
            // SAFETY: zeroize clears the vec but keeps its allocation, so
            // pointer and length still match the `mlock` in `from_slice`
            unsafe {
                munlock(self.data.as_ptr(), self.locked_len);
            }
        }
    }
}

/// A user-entered password.
///
/// Surrounding whitespace is trimmed on construction. The bytes are wiped
/// when the value is dropped, on every exit path of whoever owns it.
pub struct Password {
    buf: SecretBuffer,
}

impl Password {
    pub fn new(password: &str) -> Self {
        Self {
            buf: SecretBuffer::from_slice(password.trim().as_bytes()),
        }
    }

    pub fn as_str(&self) -> &str {
        // Built from a trimmed &str, so always valid UTF-8
        std::str::from_utf8(self.buf.as_slice()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl From<String> for Password {
    /// Takes ownership of `password` and wipes the original allocation.
    fn from(mut password: String) -> Self {
        let secret = Password::new(&password);
        password.zeroize();
        secret
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disable_core_dumps_is_idempotent() {
        let first = disable_core_dumps();
        eprintln!("core dump disable result: {}", first);
        assert_eq!(disable_core_dumps(), first);
    }

    #[test]
    fn test_core_dumps_flag_tracks_result() {
        let result = disable_core_dumps();
        assert_eq!(CORE_DUMPS_DISABLED.load(Ordering::SeqCst), result);
        #[cfg(unix)]
        assert!(result, "lowering RLIMIT_CORE is always permitted");
    }

    #[test]
    fn test_password_is_trimmed() {
        let password = Password::new("  hunter2 \n");
        assert_eq!(password.as_str(), "hunter2");
        assert!(!password.is_empty());
    }

    #[test]
    fn test_password_from_string() {
        let password = Password::from(String::from("secret words\n"));
        assert_eq!(password.as_str(), "secret words");
    }

    #[test]
    fn test_blank_password_is_empty() {
        assert!(Password::new("   ").is_empty());
        assert_eq!(Password::new("").as_str(), "");
    }

    #[test]
    fn test_password_debug_redacted() {
        let rendered = format!("{:?}", Password::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn test_secret_buffer_zero_length() {
        let buf = SecretBuffer::from_slice(&[]);
        assert!(buf.is_locked());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_secret_buffer_contents() {
        let buf = SecretBuffer::from_slice(&[0xDE, 0xAD]);
        assert_eq!(buf.as_slice(), &[0xDE, 0xAD]);
        assert_eq!(buf.len(), 2);
        // mlock may be refused in sandboxes
        eprintln!("buffer locked: {}", buf.is_locked());
    }

    #[test]
    fn test_mlock_munlock_roundtrip() {
        let data = vec![42u8; 128];
        unsafe {
            let locked = mlock(data.as_ptr(), data.len());
            eprintln!("mlock result: {}", locked);
            if locked {
                assert!(munlock(data.as_ptr(), data.len()));
            }
        }
    }
}
