//! TTL eviction: two strategies behind one interface, plus the janitor
//! task that runs the steady-state one periodically.
//!
//! [`StoreTtl`] trusts the in-memory timestamps and takes each gallery's
//! gate before deleting, so it is safe under live traffic. [`DiskTtl`]
//! trusts filesystem access times and bypasses the gates entirely; it
//! exists for offline maintenance pruning and must not run next to request
//! handling.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::{self, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::{GalleryCache, entry_access_time};
use crate::gallery_id::GalleryId;

/// One eviction pass over the cache. Returns how many entries were removed.
#[async_trait]
pub trait EvictionStrategy: Send + Sync {
    async fn evict(&self, cache: &GalleryCache) -> usize;
}

/// Thread-safe steady-state eviction driven by in-memory access times.
pub struct StoreTtl;

#[async_trait]
impl EvictionStrategy for StoreTtl {
    async fn evict(&self, cache: &GalleryCache) -> usize {
        let now = SystemTime::now();
        let ttl = cache.ttl();

        // Snapshot so no shard guard is held across the gate awaits below.
        let snapshot: Vec<_> = cache
            .store
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut removed = 0;
        for (id, slot) in snapshot {
            let _gate = slot.gate.lock().await;
            if slot.accessed() + ttl >= now {
                continue;
            }

            match cache.remove(&id.dir_name()) {
                Ok(()) => removed += 1,
                Err(e) => error!(gallery = %id, error = %e, "failed to evict cache entry"),
            }
        }

        removed
    }
}

/// Filesystem-trusting eviction for offline maintenance.
///
/// Walks the physical cache root using atime/mtime and deletes expired,
/// validly named directories outright. Not safe concurrently with live
/// reads: it does not take the per-gallery gates.
pub struct DiskTtl;

#[async_trait]
impl EvictionStrategy for DiskTtl {
    async fn evict(&self, cache: &GalleryCache) -> usize {
        let root = cache.root().to_path_buf();
        let ttl = cache.ttl();

        let deleted = match task::spawn_blocking(move || prune_disk(&root, ttl)).await {
            Ok(deleted) => deleted,
            Err(e) => {
                error!(error = %e, "disk prune task panicked");
                return 0;
            }
        };

        for id in &deleted {
            cache.store.remove(id);
        }
        deleted.len()
    }
}

fn prune_disk(root: &std::path::Path, ttl: Duration) -> Vec<GalleryId> {
    let now = SystemTime::now();
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            error!(root = ?root, error = %e, "could not read cache root");
            return Vec::new();
        }
    };

    let mut deleted = Vec::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        // Never touch directories that are not named by a gallery UUID.
        let Ok(id) = GalleryId::parse(name) else {
            continue;
        };

        let accessed = entry_access_time(&entry.path());
        if accessed + ttl >= now {
            continue;
        }

        match fs::remove_dir_all(entry.path()) {
            Ok(()) => deleted.push(id),
            Err(e) => error!(gallery = %id, error = %e, "failed to delete cache dir"),
        }
    }

    deleted
}

/// Periodic background eviction with clean shutdown.
pub struct Janitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the janitor loop: a [`StoreTtl`] pass every `period`.
    pub fn spawn(cache: Arc<GalleryCache>, period: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it so the janitor
            // waits a full period before its first pass.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = StoreTtl.evict(&cache).await;
                        if removed > 0 {
                            info!(removed, "evicted stale gallery cache entries");
                        }
                    }
                    _ = stop.changed() => {
                        debug!("janitor shutting down");
                        break;
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}
