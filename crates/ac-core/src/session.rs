//! Session identity: device fingerprint and chat session ids.
//!
//! The platform keys server-side chat history on `chat_session_id` and
//! rate-limits anonymous users on `device_fingerprint`. The fingerprint is
//! minted once and persisted under the data directory; session ids are
//! minted per conversation.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static SESSION_SEQ: AtomicU32 = AtomicU32::new(0);

/// Seconds since Unix epoch.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Generate a chat session id, unique within and across processes.
pub fn generate_session_id() -> String {
    let pid = std::process::id();
    let ts = epoch_secs();
    let seq = SESSION_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("c{ts:x}-{pid:x}-{seq:x}")
}

/// Load the persisted device fingerprint, minting one on first run.
pub fn load_or_create_fingerprint(data_dir: &Path) -> io::Result<String> {
    let path = data_dir.join("device_id");

    if let Ok(existing) = fs::read_to_string(&path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    fs::create_dir_all(data_dir)?;
    let pid = std::process::id();
    let ts = epoch_secs();
    let fingerprint = format!("d{:08x}{:08x}", ts as u32, pid ^ (ts as u32).rotate_left(16));
    fs::write(&path, &fingerprint)?;
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique_within_a_process() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert!(a.starts_with('c'));
    }

    #[test]
    fn fingerprint_is_persisted_and_stable() {
        let dir = tempfile::tempdir().unwrap();

        let first = load_or_create_fingerprint(dir.path()).unwrap();
        let second = load_or_create_fingerprint(dir.path()).unwrap();

        assert_eq!(first, second);
        assert!(first.starts_with('d'));
    }

    #[test]
    fn fingerprint_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("deep").join("data");

        let fingerprint = load_or_create_fingerprint(&nested).unwrap();
        assert!(!fingerprint.is_empty());
        assert!(nested.join("device_id").exists());
    }

    #[test]
    fn empty_fingerprint_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("device_id"), "  \n").unwrap();

        let fingerprint = load_or_create_fingerprint(dir.path()).unwrap();
        assert!(!fingerprint.is_empty());
    }
}
