//! zip/cbz backend over the `zip` crate.

use std::fs::File;
use std::path::Path;

use anyhow::Context;
use zip::ZipArchive;

use super::{ArchiveFs, ArchiveVisitor, normalize_entry_path};
use crate::error::ArchiveError;

pub struct ZipFs {
    archive: ZipArchive<File>,
}

impl ZipFs {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let open = || -> anyhow::Result<ZipArchive<File>> {
            let file = File::open(path).context("open file")?;
            ZipArchive::new(file).context("read central directory")
        };

        match open() {
            Ok(archive) => Ok(Self { archive }),
            Err(source) => Err(ArchiveError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl ArchiveFs for ZipFs {
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError> {
        for index in 0..self.archive.len() {
            let mut entry = self
                .archive
                .by_index(index)
                .map_err(|e| ArchiveError::Walk(e.into()))?;

            let Some(path) = normalize_entry_path(entry.name()) else {
                continue;
            };

            if entry.is_dir() {
                visitor.visit_dir(&path)?;
            } else if visitor.wants_file(&path) {
                // Decompression only starts when the visitor reads.
                visitor.visit_file(&path, &mut entry)?;
            }
        }

        Ok(())
    }
}
