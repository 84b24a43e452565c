//! Validated gallery identifier.
//!
//! A gallery's UUID doubles as its cache subdirectory name, so any string
//! that reaches a deletion or adoption routine must first pass through
//! [`GalleryId::parse`]. Only directories whose name round-trips through a
//! UUID parse may ever be deleted by the cache; everything else under the
//! cache root is left alone even if the in-memory store is corrupted or an
//! identifier is attacker-controlled.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::CacheError;

/// A gallery identifier that is guaranteed to be a well-formed UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GalleryId(Uuid);

impl GalleryId {
    /// Parse and validate a raw identifier.
    ///
    /// Returns [`CacheError::UnsafeId`] for anything that is not a UUID,
    /// including path-traversal attempts like `../etc`.
    pub fn parse(raw: &str) -> Result<Self, CacheError> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| CacheError::UnsafeId(raw.to_string()))
    }

    /// The canonical hyphenated form used as the cache directory name.
    pub fn dir_name(&self) -> String {
        self.0.to_string()
    }

    #[cfg(test)]
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for GalleryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for GalleryId {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_canonical_uuid() {
        let id = GalleryId::parse("11111111-1111-4111-8111-111111111111").unwrap();
        assert_eq!(id.dir_name(), "11111111-1111-4111-8111-111111111111");
    }

    #[test]
    fn rejects_path_traversal() {
        assert!(GalleryId::parse("../etc").is_err());
        assert!(GalleryId::parse("..").is_err());
        assert!(GalleryId::parse("/etc/passwd").is_err());
    }

    #[test]
    fn rejects_non_uuid_names() {
        assert!(GalleryId::parse("not-a-uuid").is_err());
        assert!(GalleryId::parse("").is_err());
        assert!(GalleryId::parse("thumbnails").is_err());
    }
}
