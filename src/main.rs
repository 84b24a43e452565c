//! Main entry point for the galcache maintenance CLI.
//!
//! The HTTP server embeds [`GalleryCache`] directly; this binary covers the
//! offline side: exercising the read path, pruning stale entries, and
//! inspecting what is on disk.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

use galcache::cli::{Cli, Command};
use galcache::{CacheConfig, DiskTtl, EvictionStrategy, GalleryCache, GalleryId, StoreTtl};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = CacheConfig::from_env();
    config.init_cache_dir()?;

    let cache = GalleryCache::new(&config);
    cache.adopt_existing();

    match cli.command {
        Command::Read { archive, gallery } => {
            let id = GalleryId::parse(&gallery)?;
            let (pages, count) = cache.read(Path::new(&archive), id).await;

            if count == 0 {
                eprintln!("no pages (archive unreadable or contains no images)");
            } else {
                for page in &pages {
                    println!("{page}");
                }
                eprintln!("{count} pages");
            }
        }

        Command::Prune { fs } => {
            let removed = if fs {
                DiskTtl.evict(&cache).await
            } else {
                StoreTtl.evict(&cache).await
            };
            eprintln!("evicted {removed} cache entries");
        }

        Command::List => {
            let mut entries = cache.entries();
            entries.sort_by_key(|(_, accessed)| *accessed);

            for (id, accessed) in entries {
                let idle = SystemTime::now()
                    .duration_since(accessed)
                    .unwrap_or_default();
                println!("{id}  idle {}s", idle.as_secs());
            }
        }
    }

    Ok(())
}
