//! rar/cbr backend over the `unrar` crate.
//!
//! unrar exposes a typestate cursor rather than random access: each header
//! is read, then the entry is either extracted or skipped before the next
//! header becomes visible. Skipped entries are never decompressed.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use unrar::Archive;

use super::{ArchiveFs, ArchiveVisitor, normalize_entry_path};
use crate::error::ArchiveError;

pub struct RarFs {
    path: PathBuf,
}

impl RarFs {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        // Validate up front so open failures surface as ArchiveError::Open,
        // not as a walk failure later.
        Archive::new(path)
            .open_for_listing()
            .map_err(|e| ArchiveError::Open {
                path: path.to_path_buf(),
                source: anyhow::anyhow!("{e}"),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl ArchiveFs for RarFs {
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError> {
        let mut state = Archive::new(&self.path)
            .open_for_processing()
            .map_err(|e| ArchiveError::Walk(anyhow::anyhow!("{e}")))?;

        loop {
            let header = match state.read_header() {
                Ok(Some(header)) => header,
                Ok(None) => break,
                Err(e) => return Err(ArchiveError::Walk(anyhow::anyhow!("{e}"))),
            };

            let entry = header.entry();
            let normalized = normalize_entry_path(&entry.filename.to_string_lossy());
            let is_dir = entry.is_directory();

            state = match normalized {
                Some(path) if is_dir => {
                    visitor.visit_dir(&path)?;
                    header
                        .skip()
                        .map_err(|e| ArchiveError::Walk(anyhow::anyhow!("{e}")))?
                }
                Some(path) if visitor.wants_file(&path) => {
                    let (data, next) = header
                        .read()
                        .map_err(|e| ArchiveError::Walk(anyhow::anyhow!("{e}")))?;
                    visitor.visit_file(&path, &mut Cursor::new(data))?;
                    next
                }
                _ => header
                    .skip()
                    .map_err(|e| ArchiveError::Walk(anyhow::anyhow!("{e}")))?,
            };
        }

        Ok(())
    }
}
