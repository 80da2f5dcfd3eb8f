//! # Key-Value Cache With Expiry
//!
//! Fetched extremes and the national coefficient are expensive to produce
//! (every provider call costs credits), so callers keep them in a key-value
//! store with a time-to-live. The core computations never see the store; it
//! is opened once from [`CacheConfig`] and passed to the collaborators that
//! need it.
//!
//! ## Backends
//! - [`MemoryStore`]: process-local map, lost on exit
//! - [`FileStore`]: one file per key in a directory (`/tmp` by default, so
//!   the cache is cleared on reboot)
//!
//! ## File Format
//! ```text
//! 2025-07-24T12:00:00Z        <- expiry instant (RFC 3339)
//! {"coefficient":87,...}      <- payload bytes, verbatim
//! ```
//! Expired or unreadable files are treated as misses so that a corrupt cache
//! never blocks a fresh fetch.

use crate::config::{CacheBackend, CacheConfig};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use std::{fs, io};
use thiserror::Error;

/// Errors from cache backends.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file operations failed (permissions, disk space)
    #[error("cache IO: {0}")]
    Io(#[from] io::Error),

    /// Payload could not be (de)serialised
    #[error("cache JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TTL too large to represent as an expiry instant
    #[error("invalid TTL: {0:?}")]
    InvalidTtl(Duration),
}

/// Byte-oriented key-value store with per-entry time-to-live.
pub trait KeyValueStore: Send + Sync {
    /// Fetch a live entry; expired entries read as `None`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key` until `ttl` has elapsed.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Read and deserialise a JSON entry.
pub fn get_json<T, S>(store: &S, key: &str) -> Result<Option<T>, CacheError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Serialise `value` as JSON and store it.
pub fn set_json<T, S>(store: &S, key: &str, value: &T, ttl: Duration) -> Result<(), CacheError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let bytes = serde_json::to_vec(value)?;
    store.set(key, &bytes, ttl)
}

/// Open the backend selected in the configuration.
pub fn open(config: &CacheConfig) -> Result<Box<dyn KeyValueStore>, CacheError> {
    match config.backend {
        CacheBackend::Memory => {
            log::debug!("Using in-memory cache");
            Ok(Box::new(MemoryStore::new()))
        }
        CacheBackend::File => {
            log::debug!("Using file cache in {}", config.dir.display());
            Ok(Box::new(FileStore::new(&config.dir)?))
        }
    }
}

/// Cache key of the per-port extremes.
pub fn port_key(port_id: &str) -> String {
    format!("port:{port_id}:static")
}

struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-process store; entries expire lazily on access or on [`MemoryStore::purge_expired`].
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.lock();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Purged {removed} expired cache entr(ies)");
        }
        removed
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, MemoryEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or(CacheError::InvalidTtl(ttl))?;
        self.lock().insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_vec(),
                expires_at,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Directory-backed store surviving process restarts.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir` for cache files, creating it if needed.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(FileStore { dir })
    }

    /// File of `key`: ASCII letters, digits and `-` are kept, every other
    /// byte is written as `_XX` so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                name.push(byte as char);
            } else {
                let _ = write!(name, "_{byte:02X}");
            }
        }
        self.dir.join(format!("{name}.cache"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some((expires_at, payload)) = split_entry(&data) else {
            log::warn!("Ignoring corrupt cache file {}", path.display());
            return Ok(None);
        };

        if expires_at <= Utc::now() {
            log::debug!("Cache entry {key} is stale");
            let _ = fs::remove_file(&path);
            return Ok(None);
        }
        Ok(Some(payload.to_vec()))
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let ttl_delta =
            chrono::Duration::from_std(ttl).map_err(|_| CacheError::InvalidTtl(ttl))?;
        let expires_at = Utc::now()
            .checked_add_signed(ttl_delta)
            .ok_or(CacheError::InvalidTtl(ttl))?;

        let mut data = expires_at.to_rfc3339().into_bytes();
        data.push(b'\n');
        data.extend_from_slice(value);
        fs::write(self.path_for(key), data)?;

        log::debug!("Cached {key} for {}s", ttl.as_secs());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), CacheError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

fn split_entry(data: &[u8]) -> Option<(DateTime<Utc>, &[u8])> {
    let newline = data.iter().position(|&b| b == b'\n')?;
    let header = std::str::from_utf8(&data[..newline]).ok()?;
    let expires_at = DateTime::parse_from_rfc3339(header.trim()).ok()?;
    Some((expires_at.with_timezone(&Utc), &data[newline + 1..]))
}
