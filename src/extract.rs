//! Extraction of gallery pages out of an archive onto disk.
//!
//! Walks the archive's virtual filesystem, recreates its directory
//! structure under the destination, and copies only page images. Metadata
//! files (json, txt, ...) are not pages and never land on disk.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::archive::{ArchiveVisitor, open_archive};
use crate::error::ArchiveError;

/// File extensions recognized as gallery pages.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "avif", "bmp", "gif", "tif", "tiff", "heif",
];

/// Whether `path` names a page image, by extension, case-insensitively.
pub fn is_image_file(path: &str) -> bool {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

struct ExtractVisitor {
    dst: PathBuf,
    files: Vec<String>,
}

impl ArchiveVisitor for ExtractVisitor {
    fn visit_dir(&mut self, path: &str) -> io::Result<()> {
        fs::create_dir_all(self.dst.join(path))
    }

    fn wants_file(&mut self, path: &str) -> bool {
        is_image_file(path)
    }

    fn visit_file(&mut self, path: &str, reader: &mut dyn Read) -> io::Result<()> {
        let out_path = self.dst.join(path);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(reader, &mut out)?;

        self.files.push(path.to_string());
        Ok(())
    }
}

/// Extract every page image from `archive_path` into `dst`.
///
/// Returns the copied paths relative to `dst`, in archive walk order, and
/// their count. A count of zero means the extraction failed or the archive
/// holds no images; there is no partial-success signaling. All failures are
/// logged here and degrade to `(vec![], 0)`.
pub fn extract(dst: &Path, archive_path: &Path) -> (Vec<String>, usize) {
    match try_extract(dst, archive_path) {
        Ok(files) => {
            let count = files.len();
            debug!(archive = ?archive_path, count, "extracted gallery");
            (files, count)
        }
        Err(e) => {
            error!(archive = ?archive_path, error = %e, "gallery extraction failed");
            (Vec::new(), 0)
        }
    }
}

fn try_extract(dst: &Path, archive_path: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut archive = open_archive(archive_path)?;

    // A concurrent caller may have created the directory already; that race
    // is benign because the per-gallery gate serializes the actual writes.
    if let Err(e) = fs::create_dir_all(dst) {
        return Err(ArchiveError::Io(e));
    }

    let mut visitor = ExtractVisitor {
        dst: dst.to_path_buf(),
        files: Vec::new(),
    };
    archive.walk(&mut visitor)?;

    Ok(visitor.files)
}
