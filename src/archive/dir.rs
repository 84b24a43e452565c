//! Plain-directory backend: an uncompressed gallery flows through the same
//! walk contract as a real archive.

use std::fs::File;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{ArchiveFs, ArchiveVisitor, normalize_entry_path};
use crate::error::ArchiveError;

pub struct DirFs {
    root: PathBuf,
}

impl DirFs {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        if !path.is_dir() {
            return Err(ArchiveError::Open {
                path: path.to_path_buf(),
                source: anyhow::anyhow!("not a directory"),
            });
        }
        Ok(Self {
            root: path.to_path_buf(),
        })
    }
}

impl ArchiveFs for DirFs {
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError> {
        for entry in WalkDir::new(&self.root).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| ArchiveError::Walk(e.into()))?;

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| ArchiveError::Walk(e.into()))?;
            let Some(path) = normalize_entry_path(&relative.to_string_lossy()) else {
                continue;
            };

            if entry.file_type().is_dir() {
                visitor.visit_dir(&path)?;
            } else if entry.file_type().is_file() && visitor.wants_file(&path) {
                let mut file = File::open(entry.path())?;
                visitor.visit_file(&path, &mut file)?;
            }
        }

        Ok(())
    }
}
