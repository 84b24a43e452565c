//! Archive reading across the gallery container formats.
//!
//! This module turns a compressed archive (or a plain image directory) into
//! a browsable virtual filesystem that can be walked exactly once, in entry
//! order.
//!
//! ## Architecture
//!
//! Each supported container gets its own backend module implementing the
//! [`ArchiveFs`] trait:
//!
//! - [`zip`]: zip/cbz via the `zip` crate (random access)
//! - [`rar`]: rar/cbr via `unrar` (sequential, skip-capable)
//! - [`sevenz`]: 7z/cb7 via `sevenz-rust` (sequential, possibly solid)
//! - [`tarball`]: tar/tar.gz/tgz via `tar` + `flate2` (sequential)
//! - [`dir`]: plain uncompressed directories via `walkdir`
//!
//! ## Walk contract
//!
//! The sequential formats cannot cheaply reopen a named entry, so the trait
//! exposes a single pass: the [`ArchiveVisitor`] is shown every entry in
//! archive order, decides up front whether it wants a regular file's bytes
//! ([`ArchiveVisitor::wants_file`]), and receives wanted files as plain
//! [`Read`] streams. Skipped files are never decompressed where the format
//! allows it.
//!
//! Entry paths are normalized to forward slashes before the visitor sees
//! them; entries with absolute paths or `..` components are dropped so a
//! hostile archive can never direct a write outside the destination.
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-volume rar archives
//! - PDF galleries are not a container format handled here

mod dir;
mod rar;
mod sevenz;
mod tarball;
mod zip;

use std::io::Read;
use std::path::Path;

use crate::error::ArchiveError;

/// Visitor for a single ordered pass over an archive.
pub trait ArchiveVisitor {
    /// A directory entry. `path` is relative, forward-slashed.
    fn visit_dir(&mut self, path: &str) -> std::io::Result<()>;

    /// Whether the visitor wants the contents of the regular file at `path`.
    /// Answering `false` lets sequential backends skip decompression.
    fn wants_file(&mut self, path: &str) -> bool;

    /// A regular file the visitor asked for, as a byte stream.
    fn visit_file(&mut self, path: &str, reader: &mut dyn Read) -> std::io::Result<()>;
}

/// A browsable virtual filesystem over one archive.
pub trait ArchiveFs {
    /// Walk every entry in archive order. Consumes the pass; sequential
    /// backends cannot be walked twice.
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError>;
}

/// Container formats recognized by extension (or directory test).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    SevenZ,
    Tar,
    Dir,
}

impl ArchiveKind {
    /// Detect the container format of `path`.
    ///
    /// Plain directories are treated as already-extracted archives. For
    /// files, detection is by extension; `None` means unsupported.
    pub fn detect(path: &Path) -> Option<Self> {
        if path.is_dir() {
            return Some(Self::Dir);
        }

        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") {
            return Some(Self::Tar);
        }

        match name.rsplit('.').next()? {
            "zip" | "cbz" => Some(Self::Zip),
            "rar" | "cbr" => Some(Self::Rar),
            "7z" | "cb7" => Some(Self::SevenZ),
            "tar" | "tgz" => Some(Self::Tar),
            _ => None,
        }
    }
}

/// Open `path` as a browsable virtual filesystem.
///
/// Fails with [`ArchiveError::Unsupported`] for unrecognized formats and
/// [`ArchiveError::Open`] for recognized but unreadable archives.
pub fn open_archive(path: &Path) -> Result<Box<dyn ArchiveFs>, ArchiveError> {
    let kind =
        ArchiveKind::detect(path).ok_or_else(|| ArchiveError::Unsupported(path.to_path_buf()))?;

    match kind {
        ArchiveKind::Zip => Ok(Box::new(zip::ZipFs::open(path)?)),
        ArchiveKind::Rar => Ok(Box::new(rar::RarFs::open(path)?)),
        ArchiveKind::SevenZ => Ok(Box::new(sevenz::SevenZFs::open(path)?)),
        ArchiveKind::Tar => Ok(Box::new(tarball::TarFs::open(path)?)),
        ArchiveKind::Dir => Ok(Box::new(dir::DirFs::open(path)?)),
    }
}

/// Normalize an entry path to a safe, relative, forward-slashed form.
///
/// Returns `None` for entries that must be dropped: absolute paths, drive
/// prefixes, `..` components, or paths that normalize to nothing.
pub(crate) fn normalize_entry_path(raw: &str) -> Option<String> {
    let slashed = raw.replace('\\', "/");
    if slashed.starts_with('/') || slashed.contains(':') {
        return None;
    }

    let mut parts = Vec::new();
    for part in slashed.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
