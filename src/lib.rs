//! # galcache
//!
//! A lazy decompression cache for compressed image galleries (manga and
//! doujinshi archives).
//!
//! A gallery server cannot keep every archive permanently extracted without
//! exhausting disk space. This library extracts an archive into a
//! per-gallery cache directory on first access, serves later reads straight
//! from that directory, tracks last-access time, and evicts idle entries
//! under a time-to-live policy.
//!
//! ## Features
//!
//! - zip/cbz, rar/cbr, 7z/cb7, tar family, and plain-directory galleries
//! - Only page images are extracted; archive metadata files are skipped
//! - At most one in-flight extraction per gallery, with full parallelism
//!   across different galleries
//! - Naturally sorted page lists (`page2` before `page10`)
//! - Startup adoption of extractions left over from a previous run
//! - A cancellable background janitor plus an offline, filesystem-trusting
//!   pruning strategy
//! - Only directories named by a valid gallery UUID are ever deleted
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use galcache::{CacheConfig, GalleryCache, GalleryId, Janitor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CacheConfig::from_env();
//!     config.init_cache_dir()?;
//!
//!     let cache = Arc::new(GalleryCache::new(&config));
//!     cache.adopt_existing();
//!     let janitor = Janitor::spawn(cache.clone(), config.janitor_period);
//!
//!     let id = GalleryId::parse("11111111-1111-4111-8111-111111111111")?;
//!     let (pages, count) = cache.read(Path::new("library/sample.cbz"), id).await;
//!     println!("{count} pages: {pages:?}");
//!
//!     janitor.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod gallery_id;

pub use cache::{DiskTtl, EvictionStrategy, GalleryCache, Janitor, StoreTtl};
pub use cli::Cli;
pub use config::CacheConfig;
pub use error::{ArchiveError, CacheError};
pub use gallery_id::GalleryId;
