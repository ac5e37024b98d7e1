//! Content-object discovery and [`ContentContext`] resolution.
//!
//! A content item is either a flat Markdown file (`posts/hello.md`) or a
//! directory with an index document and optional images
//! (`posts/trip/index.md` + `posts/trip/images/`). Resolution turns a path
//! into the set of filesystem facts the renderers need.
//!
//! Validation is deliberately strict: a directory without `index.md`, a file
//! with the wrong suffix, or an exotic filesystem object (socket, broken
//! symlink) is a build-time defect, not something to skip over.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("{0} is not a valid directory")]
    NotADirectory(PathBuf),
    #[error("Path does not exist: {0}")]
    Missing(PathBuf),
    #[error("Missing index document: {0}")]
    MissingIndex(PathBuf),
    #[error("Invalid file type (expected .md): {0}")]
    InvalidFileType(PathBuf),
    #[error("Unsupported path type: {0}")]
    UnsupportedPathType(PathBuf),
    #[error("'{0}' exists but is not a directory")]
    ImagesNotADirectory(PathBuf),
    #[error("No image files found in {0}")]
    NoImages(PathBuf),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Filesystem facts for one content item, resolved once and handed to the
/// HTML and ANSI renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentContext {
    /// The Markdown document to render. For directory items this is the
    /// `index.md` inside the directory.
    pub index_file: PathBuf,
    /// Direct children of the item's `images/` folder, sorted by name.
    /// `None` for flat files and for directories without an images folder.
    pub image_files: Option<Vec<PathBuf>>,
    /// Whether the item is a directory-based content unit.
    pub is_dir: bool,
    /// Label taken from the parent directory name ("posts", "projects", …).
    pub content_type: String,
}

impl ContentContext {
    /// The item's own name: directory name for directory items, file stem
    /// for flat files. Doubles as the staged-image subdirectory name.
    pub fn item_name(&self) -> String {
        let source: Option<&std::ffi::OsStr> = if self.is_dir {
            self.index_file.parent().and_then(Path::file_name)
        } else {
            self.index_file.file_stem()
        };
        source.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
    }

    /// Directory holding the item (the item itself when directory-based).
    pub fn item_dir(&self) -> &Path {
        self.index_file.parent().unwrap_or(Path::new(""))
    }
}

/// Enumerate content objects directly inside a type's root directory.
///
/// Subdirectories and `.md` files are accepted; anything else is an error.
/// Results are sorted by name for deterministic load order.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, LayoutError> {
    if !dir.is_dir() {
        return Err(LayoutError::NotADirectory(dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(dir).map_err(|source| LayoutError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut objects = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LayoutError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let kind = path_kind(&path)?;
        match kind {
            PathKind::Dir => objects.push(path),
            PathKind::File => {
                if !is_markdown(&path) {
                    return Err(LayoutError::InvalidFileType(path));
                }
                objects.push(path);
            }
            PathKind::Other => return Err(LayoutError::UnsupportedPathType(path)),
        }
    }
    objects.sort();
    Ok(objects)
}

/// Resolve a content-object path into a [`ContentContext`].
pub fn resolve(path: &Path) -> Result<ContentContext, LayoutError> {
    if !path.exists() {
        return Err(LayoutError::Missing(path.to_path_buf()));
    }
    match path_kind(path)? {
        PathKind::Dir => {
            let index_file = path.join("index.md");
            if !index_file.is_file() {
                return Err(LayoutError::MissingIndex(index_file));
            }
            let image_files = collect_images(&path.join("images"))?;
            Ok(ContentContext {
                index_file,
                image_files,
                is_dir: true,
                content_type: parent_name(path),
            })
        }
        PathKind::File => {
            if !is_markdown(path) {
                return Err(LayoutError::InvalidFileType(path.to_path_buf()));
            }
            Ok(ContentContext {
                index_file: path.to_path_buf(),
                image_files: None,
                is_dir: false,
                content_type: parent_name(path),
            })
        }
        PathKind::Other => Err(LayoutError::UnsupportedPathType(path.to_path_buf())),
    }
}

enum PathKind {
    Dir,
    File,
    Other,
}

/// Classify via symlink-aware metadata so broken symlinks and special files
/// surface as `Other` instead of pretending not to exist.
fn path_kind(path: &Path) -> Result<PathKind, LayoutError> {
    let meta = std::fs::symlink_metadata(path).map_err(|source| LayoutError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ft = meta.file_type();
    if ft.is_symlink() {
        // Follow the link; a dangling target is unsupported, not missing.
        return match std::fs::metadata(path) {
            Ok(m) if m.is_dir() => Ok(PathKind::Dir),
            Ok(m) if m.is_file() => Ok(PathKind::File),
            _ => Ok(PathKind::Other),
        };
    }
    if ft.is_dir() {
        Ok(PathKind::Dir)
    } else if ft.is_file() {
        Ok(PathKind::File)
    } else {
        Ok(PathKind::Other)
    }
}

/// Collect direct children of an `images/` folder, non-recursive.
///
/// A missing folder is fine (`None`); a non-directory named `images` is not.
fn collect_images(images_dir: &Path) -> Result<Option<Vec<PathBuf>>, LayoutError> {
    if !images_dir.exists() {
        return Ok(None);
    }
    if !images_dir.is_dir() {
        return Err(LayoutError::ImagesNotADirectory(images_dir.to_path_buf()));
    }
    let entries = std::fs::read_dir(images_dir).map_err(|source| LayoutError::Io {
        path: images_dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    files.sort();
    Ok(Some(files))
}

fn is_markdown(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "md")
}

fn parent_name(path: &Path) -> String {
    path.parent()
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn discover_accepts_dirs_and_markdown_files() {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        touch(&posts.join("hello.md"));
        std::fs::create_dir_all(posts.join("trip")).unwrap();
        let objects = discover(&posts).unwrap();
        assert_eq!(objects.len(), 2);
        assert!(objects[0].ends_with("hello.md"));
        assert!(objects[1].ends_with("trip"));
    }

    #[test]
    fn discover_rejects_non_markdown_files() {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        touch(&posts.join("notes.txt"));
        assert!(matches!(
            discover(&posts),
            Err(LayoutError::InvalidFileType(_))
        ));
    }

    #[test]
    fn discover_requires_a_directory() {
        assert!(matches!(
            discover(Path::new("/nonexistent")),
            Err(LayoutError::NotADirectory(_))
        ));
    }

    #[test]
    fn resolve_flat_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("posts").join("hello.md");
        touch(&file);
        let ctx = resolve(&file).unwrap();
        assert_eq!(ctx.index_file, file);
        assert!(!ctx.is_dir);
        assert_eq!(ctx.image_files, None);
        assert_eq!(ctx.content_type, "posts");
        assert_eq!(ctx.item_name(), "hello");
    }

    #[test]
    fn resolve_directory_with_images() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("posts").join("trip");
        touch(&dir.join("index.md"));
        touch(&dir.join("images").join("b.png"));
        touch(&dir.join("images").join("a.png"));
        let ctx = resolve(&dir).unwrap();
        assert!(ctx.is_dir);
        assert_eq!(ctx.content_type, "posts");
        assert_eq!(ctx.item_name(), "trip");
        let images = ctx.image_files.unwrap();
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("a.png"), "images must be sorted");
    }

    #[test]
    fn resolve_directory_without_images_folder() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("projects").join("tool");
        touch(&dir.join("index.md"));
        let ctx = resolve(&dir).unwrap();
        assert_eq!(ctx.image_files, None);
    }

    #[test]
    fn resolve_directory_missing_index_fails() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("posts").join("empty");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            resolve(&dir),
            Err(LayoutError::MissingIndex(_))
        ));
    }

    #[test]
    fn resolve_wrong_suffix_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("posts").join("hello.txt");
        touch(&file);
        assert!(matches!(
            resolve(&file),
            Err(LayoutError::InvalidFileType(_))
        ));
    }

    #[test]
    fn resolve_missing_path_fails() {
        assert!(matches!(
            resolve(Path::new("/nonexistent/item")),
            Err(LayoutError::Missing(_))
        ));
    }

    #[test]
    fn images_entry_that_is_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("posts").join("trip");
        touch(&dir.join("index.md"));
        touch(&dir.join("images"));
        assert!(matches!(
            resolve(&dir),
            Err(LayoutError::ImagesNotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_is_unsupported() {
        let tmp = TempDir::new().unwrap();
        let posts = tmp.path().join("posts");
        std::fs::create_dir_all(&posts).unwrap();
        let link = posts.join("dangling.md");
        std::os::unix::fs::symlink("/nonexistent/target.md", &link).unwrap();
        assert!(matches!(
            resolve(&link),
            Err(LayoutError::UnsupportedPathType(_))
        ));
        assert!(matches!(
            discover(&posts),
            Err(LayoutError::UnsupportedPathType(_))
        ));
    }
}
