//! 7z/cb7 backend over `sevenz-rust`.
//!
//! 7z archives are often solid, so the library drives the pass itself via
//! `for_each_entries`; entries the visitor declines are not copied out, even
//! though a solid block may still be decoded internally.

use std::fs::File;
use std::path::{Path, PathBuf};

use sevenz_rust::{Password, SevenZReader};

use super::{ArchiveFs, ArchiveVisitor, normalize_entry_path};
use crate::error::ArchiveError;

pub struct SevenZFs {
    reader: Option<SevenZReader<File>>,
    path: PathBuf,
}

impl SevenZFs {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let reader =
            SevenZReader::open(path, Password::empty()).map_err(|e| ArchiveError::Open {
                path: path.to_path_buf(),
                source: anyhow::anyhow!("{e}"),
            })?;

        Ok(Self {
            reader: Some(reader),
            path: path.to_path_buf(),
        })
    }
}

impl ArchiveFs for SevenZFs {
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError> {
        let mut reader = self.reader.take().ok_or_else(|| {
            ArchiveError::Walk(anyhow::anyhow!("7z archive {:?} already walked", self.path))
        })?;

        let mut visit_error: Option<std::io::Error> = None;

        let result = reader.for_each_entries(|entry, entry_reader| {
            let Some(path) = normalize_entry_path(entry.name()) else {
                return Ok(true);
            };

            let outcome = if entry.is_directory() {
                visitor.visit_dir(&path)
            } else if visitor.wants_file(&path) {
                visitor.visit_file(&path, entry_reader)
            } else {
                return Ok(true);
            };

            match outcome {
                Ok(()) => Ok(true),
                Err(e) => {
                    // Stop the pass and surface the I/O error afterwards.
                    visit_error = Some(e);
                    Ok(false)
                }
            }
        });

        if let Some(e) = visit_error {
            return Err(ArchiveError::Io(e));
        }
        result
            .map(|_| ())
            .map_err(|e| ArchiveError::Walk(anyhow::anyhow!("{e}")))
    }
}
