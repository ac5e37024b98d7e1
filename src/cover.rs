//! Deterministic cover assignment.
//!
//! Every titled content item gets a cover image from a fixed, pre-rendered
//! pool (`cover_001.png` … `cover_NNN.png` under the headers and thumbnails
//! directories). The mapping is a pure function of the title length and the
//! pool size, so the same title always lands on the same cover as long as
//! the pool is unchanged.
//!
//! Alternate formats (`.webp`, `.avif`) are attached only when the sibling
//! file exists on disk; the assigner needs no codec knowledge, it just
//! probes the filesystem. Terminal clients read a pre-rendered `.ansi`
//! sibling from the ANSI tree instead.

use crate::config::SitePaths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoverError {
    #[error("Cover pool directory not found: {0}")]
    MissingPool(PathBuf),
    #[error("Cover pool is empty: {0}")]
    EmptyPool(PathBuf),
    #[error("Cover path {path} is not under the static root")]
    OutsideStaticRoot { path: PathBuf },
    #[error("IO error reading cover pool {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A default image plus whichever alternate encodings exist beside it.
/// Paths are relative to the static root, ready for URL construction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageSet {
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avif: Option<String>,
}

impl ImageSet {
    /// Build an image set from an on-disk default, probing for `.webp` and
    /// `.avif` siblings. The stored strings are relative to `static_root`.
    pub fn probe(default: &Path, static_root: &Path) -> Result<Self, CoverError> {
        let relative = |p: &Path| -> Result<String, CoverError> {
            p.strip_prefix(static_root)
                .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                .map_err(|_| CoverError::OutsideStaticRoot { path: p.to_path_buf() })
        };
        let sibling = |ext: &str| -> Result<Option<String>, CoverError> {
            let alt = default.with_extension(ext);
            if alt.is_file() { relative(&alt).map(Some) } else { Ok(None) }
        };
        Ok(Self {
            default: relative(default)?,
            webp: sibling("webp")?,
            avif: sibling("avif")?,
        })
    }
}

/// A resolved cover: pool index plus header and thumbnail image sets.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CoverAssignment {
    pub index: usize,
    pub header: ImageSet,
    pub thumbnail: ImageSet,
}

/// Map a title to a 1-based index into a cover pool of `pool_size` images.
///
/// Closed form of "subtract `pool_size` from the title length until it
/// fits". An empty title is treated as length 1 so the result is always in
/// `[1, pool_size]`.
pub fn cover_index(title: &str, pool_size: usize) -> usize {
    debug_assert!(pool_size > 0, "cover pool must not be empty");
    let n = title.chars().count().max(1);
    ((n - 1) % pool_size) + 1
}

/// Fixed-width pool filename: `cover_007.png`.
pub fn cover_filename(index: usize) -> String {
    format!("cover_{index:03}.png")
}

/// ANSI-art sibling filename: `cover_007.ansi`.
pub fn cover_ansi_filename(index: usize) -> String {
    format!("cover_{index:03}.ansi")
}

/// Count the base cover images (`cover_*.png`) in a pool directory.
///
/// Only PNGs participate: `.webp`/`.avif` alternates never change the pool
/// size, so assignments stay stable while formats are added.
pub fn pool_size(dir: &Path) -> Result<usize, CoverError> {
    if !dir.is_dir() {
        return Err(CoverError::MissingPool(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| CoverError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let count = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with("cover_") && name.ends_with(".png")
        })
        .count();
    if count == 0 {
        return Err(CoverError::EmptyPool(dir.to_path_buf()));
    }
    Ok(count)
}

/// Assign header and thumbnail covers for a title.
///
/// The pool size is taken from the headers directory; the thumbnails
/// directory is expected to carry the same filenames at thumbnail size.
pub fn assign(paths: &SitePaths, title: &str) -> Result<CoverAssignment, CoverError> {
    let headers = paths.headers_dir();
    let index = cover_index(title, pool_size(&headers)?);
    let file = cover_filename(index);
    Ok(CoverAssignment {
        index,
        header: ImageSet::probe(&headers.join(&file), &paths.static_root)?,
        thumbnail: ImageSet::probe(&paths.thumbnails_dir().join(&file), &paths.static_root)?,
    })
}

/// Path of the pre-rendered ANSI header for a title.
pub fn ansi_header_path(paths: &SitePaths, title: &str) -> Result<PathBuf, CoverError> {
    let index = cover_index(title, pool_size(&paths.headers_dir())?);
    Ok(paths.ansi_headers_dir().join(cover_ansi_filename(index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_png;
    use tempfile::TempDir;

    fn title_of_length(n: usize) -> String {
        "x".repeat(n)
    }

    #[test]
    fn index_is_identity_within_pool() {
        for pool in [1, 3, 5, 12] {
            for n in 1..=pool {
                assert_eq!(cover_index(&title_of_length(n), pool), n);
            }
        }
    }

    #[test]
    fn index_wraps_modulo_pool() {
        // pool_size=5: length 7 → 2, length 10 → 5
        assert_eq!(cover_index(&title_of_length(7), 5), 2);
        assert_eq!(cover_index(&title_of_length(10), 5), 5);
        assert_eq!(cover_index(&title_of_length(11), 5), 1);
        assert_eq!(cover_index(&title_of_length(23), 7), 2);
    }

    #[test]
    fn empty_title_maps_to_first_cover() {
        assert_eq!(cover_index("", 5), 1);
    }

    #[test]
    fn index_counts_chars_not_bytes() {
        // four chars, more bytes
        assert_eq!(cover_index("café", 5), 4);
    }

    #[test]
    fn filenames_are_zero_padded() {
        assert_eq!(cover_filename(7), "cover_007.png");
        assert_eq!(cover_filename(112), "cover_112.png");
        assert_eq!(cover_ansi_filename(7), "cover_007.ansi");
    }

    fn pool_fixture(count: usize) -> (TempDir, SitePaths) {
        let tmp = TempDir::new().unwrap();
        let paths = SitePaths {
            content_root: tmp.path().join("content"),
            static_root: tmp.path().join("static"),
            ansi_root: tmp.path().join("ansi"),
        };
        for dir in [paths.headers_dir(), paths.thumbnails_dir()] {
            std::fs::create_dir_all(&dir).unwrap();
            for i in 1..=count {
                write_png(&dir.join(cover_filename(i)), 2, 2);
            }
        }
        (tmp, paths)
    }

    #[test]
    fn pool_size_counts_base_pngs_only() {
        let (_tmp, paths) = pool_fixture(4);
        // alternates must not inflate the pool
        std::fs::write(paths.headers_dir().join("cover_001.webp"), b"w").unwrap();
        std::fs::write(paths.headers_dir().join("cover_001.avif"), b"a").unwrap();
        assert_eq!(pool_size(&paths.headers_dir()).unwrap(), 4);
    }

    #[test]
    fn empty_pool_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            pool_size(tmp.path()),
            Err(CoverError::EmptyPool(_))
        ));
    }

    #[test]
    fn missing_pool_is_an_error() {
        assert!(matches!(
            pool_size(Path::new("/nonexistent/headers")),
            Err(CoverError::MissingPool(_))
        ));
    }

    #[test]
    fn assign_is_deterministic_and_relative() {
        let (_tmp, paths) = pool_fixture(5);
        let a = assign(&paths, "1234567").unwrap(); // length 7 → index 2
        let b = assign(&paths, "1234567").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.index, 2);
        assert_eq!(a.header.default, "images/headers/cover_002.png");
        assert_eq!(a.thumbnail.default, "images/thumbnails/cover_002.png");
        assert_eq!(a.header.webp, None);
    }

    #[test]
    fn alternates_attach_only_when_present() {
        let (_tmp, paths) = pool_fixture(3);
        std::fs::write(paths.headers_dir().join("cover_001.webp"), b"w").unwrap();
        let a = assign(&paths, "x").unwrap();
        assert_eq!(
            a.header.webp.as_deref(),
            Some("images/headers/cover_001.webp")
        );
        assert_eq!(a.header.avif, None);
    }

    #[test]
    fn ansi_header_path_uses_pool_index() {
        let (_tmp, paths) = pool_fixture(5);
        let p = ansi_header_path(&paths, "1234567890").unwrap(); // length 10 → 5
        assert_eq!(p, paths.ansi_headers_dir().join("cover_005.ansi"));
    }
}
