//! The gallery decompression cache.
//!
//! An in-memory map from gallery identifier to `{last access, gate}` tracks
//! which galleries currently have a live extraction on disk under
//! `<cache root>/<uuid>/`. The map is a cache of disk state, not the source
//! of truth: disk is authoritative, and mismatches self-heal on read.
//!
//! ## Concurrency
//!
//! The store is a [`DashMap`]; the slot for a key is fetched-or-created
//! atomically through the entry API *before* any extraction decision, and
//! its async gate is held for the whole extract-or-read sequence. Two
//! concurrent cold reads of the same gallery therefore produce exactly one
//! extraction, while reads of different galleries proceed fully in
//! parallel. All disk work runs on the blocking thread pool.

mod evict;

pub use evict::{DiskTtl, EvictionStrategy, Janitor, StoreTtl};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use tokio::task;
use tracing::{debug, error, warn};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::extract;
use crate::gallery_id::GalleryId;

/// Per-gallery cache state: last access time plus the gate serializing
/// extraction and reads for this one gallery.
pub(crate) struct CacheSlot {
    accessed: Mutex<SystemTime>,
    pub(crate) gate: tokio::sync::Mutex<()>,
}

impl CacheSlot {
    fn new(accessed: SystemTime) -> Self {
        Self {
            accessed: Mutex::new(accessed),
            gate: tokio::sync::Mutex::new(()),
        }
    }

    fn touch(&self) {
        *self.accessed.lock().unwrap_or_else(|e| e.into_inner()) = SystemTime::now();
    }

    pub(crate) fn accessed(&self) -> SystemTime {
        *self.accessed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Process-wide decompression cache for gallery archives.
pub struct GalleryCache {
    root: PathBuf,
    ttl: Duration,
    pub(crate) store: DashMap<GalleryId, Arc<CacheSlot>>,
}

impl GalleryCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            root: config.cache_root(),
            ttl: config.ttl,
            store: DashMap::new(),
        }
    }

    /// The physical cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Idle time-to-live before an entry becomes eligible for eviction.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Startup reconciliation: adopt extractions left over from a previous
    /// run. Only immediate children whose name parses as a UUID are adopted,
    /// with last access taken from the filesystem (atime, falling back to
    /// mtime). Anything else under the root is ignored entirely.
    pub fn adopt_existing(&self) -> usize {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                error!(root = ?self.root, error = %e, "could not read cache root");
                return 0;
            }
        };

        let mut adopted = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Ok(id) = GalleryId::parse(name) else {
                continue;
            };

            let accessed = entry_access_time(&entry.path());
            self.store.insert(id, Arc::new(CacheSlot::new(accessed)));
            adopted += 1;
        }

        debug!(adopted, "reconciled cache store with disk");
        adopted
    }

    /// The Read Path: return the naturally sorted page list for a gallery,
    /// extracting `archive_path` on demand when no valid cache directory
    /// exists yet.
    ///
    /// A zero count means the archive was unreadable or held no images;
    /// no error escapes this layer.
    pub async fn read(&self, archive_path: &Path, id: GalleryId) -> (Vec<String>, usize) {
        let slot = self.slot(id);
        slot.touch();

        // Held across the whole extract-or-read sequence; taken before the
        // extraction decision so no second extraction can start.
        let _gate = slot.gate.lock().await;

        let dst = self.gallery_dir(id);
        let archive = archive_path.to_path_buf();
        match task::spawn_blocking(move || read_or_extract(&dst, &archive)).await {
            Ok(result) => result,
            Err(e) => {
                error!(gallery = %id, error = %e, "cache read task panicked");
                (Vec::new(), 0)
            }
        }
    }

    /// Wipe one gallery from disk and from the store.
    ///
    /// Re-validates the identifier even though callers should already hold
    /// a parsed one; an identifier that is not a UUID is hard-refused
    /// without touching the filesystem. The store entry is dropped whether
    /// or not the directory delete succeeds, and a missing directory just
    /// means store and disk were already consistent.
    pub fn remove(&self, raw_id: &str) -> Result<(), CacheError> {
        let id = GalleryId::parse(raw_id)?;

        let dir = self.gallery_dir(id);
        let result = fs::remove_dir_all(&dir);
        self.store.remove(&id);

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::io(dir, e)),
        }
    }

    /// Snapshot of the store for inspection: `(id, last access)`.
    pub fn entries(&self) -> Vec<(GalleryId, SystemTime)> {
        self.store
            .iter()
            .map(|entry| (*entry.key(), entry.value().accessed()))
            .collect()
    }

    /// The cache directory for one gallery.
    pub fn gallery_dir(&self, id: GalleryId) -> PathBuf {
        self.root.join(id.dir_name())
    }

    /// Fetch-or-create the slot for `id` atomically.
    fn slot(&self, id: GalleryId) -> Arc<CacheSlot> {
        self.store
            .entry(id)
            .or_insert_with(|| Arc::new(CacheSlot::new(SystemTime::now())))
            .value()
            .clone()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, id: GalleryId, age: Duration) {
        if let Some(slot) = self.store.get(&id) {
            *slot.accessed.lock().unwrap() = SystemTime::now() - age;
        }
    }
}

/// Blocking half of the Read Path.
///
/// No cache directory: extract. Existing directory: list it, and if it
/// yields zero usable files (corrupted or partial previous extraction),
/// delete it and extract once more. Both branches are naturally sorted so
/// `page2` precedes `page10` regardless of how the files reached disk.
fn read_or_extract(dst: &Path, archive_path: &Path) -> (Vec<String>, usize) {
    if !dst.exists() {
        return extract_sorted(dst, archive_path);
    }

    let (mut files, count) = list_cached_pages(dst);
    if count == 0 {
        warn!(dir = ?dst, "cache directory has no usable files, re-extracting");
        if let Err(e) = fs::remove_dir_all(dst) {
            debug!(dir = ?dst, error = %e, "removing corrupt cache dir failed");
            return (Vec::new(), 0);
        }
        return extract_sorted(dst, archive_path);
    }

    files.sort_by(|a, b| natord::compare(a, b));
    (files, count)
}

fn extract_sorted(dst: &Path, archive_path: &Path) -> (Vec<String>, usize) {
    let (mut files, count) = extract::extract(dst, archive_path);
    files.sort_by(|a, b| natord::compare(a, b));
    (files, count)
}

/// Recursively list the page files under one gallery's cache directory,
/// relative to it, skipping the directory entries themselves.
fn list_cached_pages(dst: &Path) -> (Vec<String>, usize) {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dst).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                error!(dir = ?dst, error = %e, "failed to walk cache dir");
                return (Vec::new(), 0);
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        match entry.path().strip_prefix(dst) {
            Ok(relative) => files.push(relative.to_string_lossy().replace('\\', "/")),
            Err(_) => continue,
        }
    }

    let count = files.len();
    (files, count)
}

/// Last access time of a cache entry, preferring atime and falling back to
/// mtime on filesystems that do not track access times.
pub(crate) fn entry_access_time(path: &Path) -> SystemTime {
    match fs::metadata(path) {
        Ok(meta) => meta
            .accessed()
            .or_else(|_| meta.modified())
            .unwrap_or_else(|_| SystemTime::now()),
        Err(_) => SystemTime::now(),
    }
}
