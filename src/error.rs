//! Error types for the archive and cache layers.
//!
//! Nothing in this crate treats these as fatal: archive and extraction
//! failures degrade to an empty page list for the affected call, and the
//! caller maps an empty result to "not found / unavailable". The only fatal
//! condition in the whole subsystem is a cache root that cannot be created
//! at startup, which is reported through [`CacheError::Io`] by
//! [`crate::config::CacheConfig::init_cache_dir`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures from opening or walking an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The path has no recognized archive extension and is not a directory.
    #[error("unsupported archive format: {0}")]
    Unsupported(PathBuf),

    /// The archive exists but could not be opened (corrupt, truncated,
    /// wrong format, or unreadable).
    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// An entry could not be enumerated or its bytes could not be produced.
    #[error("failed to walk archive: {0}")]
    Walk(#[source] anyhow::Error),

    /// Destination-side I/O failed while copying entries out.
    #[error("extraction I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Failures from the cache store and its deletion routines.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An identifier that does not parse as a UUID reached a boundary that
    /// would touch the filesystem. Hard-refused, nothing is deleted.
    #[error("refusing unsafe gallery identifier: {0:?}")]
    UnsafeId(String),

    /// Filesystem error while deleting or scanning cache directories.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
