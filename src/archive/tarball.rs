//! tar family backend (`tar` crate, gzip via `flate2`).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use flate2::read::GzDecoder;
use tar::Archive as TarArchive;

use super::{ArchiveFs, ArchiveVisitor, normalize_entry_path};
use crate::error::ArchiveError;

pub struct TarFs {
    archive: Option<TarArchive<Box<dyn Read + Send>>>,
    path: PathBuf,
}

impl TarFs {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let open = || -> anyhow::Result<Box<dyn Read + Send>> {
            let file = File::open(path).context("open file")?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();

            if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
                Ok(Box::new(GzDecoder::new(file)))
            } else {
                Ok(Box::new(file))
            }
        };

        match open() {
            Ok(reader) => Ok(Self {
                archive: Some(TarArchive::new(reader)),
                path: path.to_path_buf(),
            }),
            Err(source) => Err(ArchiveError::Open {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn state_taken(&mut self) -> Result<TarArchive<Box<dyn Read + Send>>, ArchiveError> {
        self.archive.take().ok_or_else(|| {
            ArchiveError::Walk(anyhow::anyhow!("tar archive {:?} already walked", self.path))
        })
    }
}

impl ArchiveFs for TarFs {
    fn walk(&mut self, visitor: &mut dyn ArchiveVisitor) -> Result<(), ArchiveError> {
        let mut archive = self.state_taken()?;

        let entries = archive
            .entries()
            .map_err(|e| ArchiveError::Walk(e.into()))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| ArchiveError::Walk(e.into()))?;

            let entry_type = entry.header().entry_type();
            // Links could point outside the destination.
            if entry_type.is_symlink() || entry_type.is_hard_link() {
                continue;
            }

            let raw = match entry.path() {
                Ok(p) => p.to_string_lossy().into_owned(),
                Err(_) => continue,
            };
            let Some(path) = normalize_entry_path(&raw) else {
                continue;
            };

            if entry_type.is_dir() {
                visitor.visit_dir(&path)?;
            } else if entry_type.is_file() && visitor.wants_file(&path) {
                visitor.visit_file(&path, &mut entry)?;
            }
        }

        Ok(())
    }
}
