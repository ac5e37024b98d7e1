//! Derived-field helpers: slugs, reading-time estimates, publish dates.
//!
//! Content items that don't declare these fields in frontmatter fall back to
//! values derived from the filesystem: the slug comes from the file or
//! directory name with underscores turned into hyphens, and the publish date
//! from the file's creation timestamp.

use chrono::{DateTime, Local};
use std::path::Path;

/// Words-per-minute divisor for the reading-time estimate.
const WORDS_PER_MINUTE: f64 = 200.0;

/// Derive a URL slug from a content file or directory name.
///
/// `my_first_post.md` → `my-first-post`; a directory `side_project` →
/// `side-project`.
pub fn derive_slug(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.replace('_', "-")
}

/// Estimated reading time in whole minutes (word count / 200, rounded).
pub fn reading_time_minutes(body: &str) -> u32 {
    let words = body.split_whitespace().count();
    (words as f64 / WORDS_PER_MINUTE).round() as u32
}

/// Human-readable reading-time label (`"2 min"`).
pub fn reading_time_label(minutes: u32) -> String {
    format!("{minutes} min")
}

/// File creation date formatted `DD.MM.YYYY`.
///
/// Filesystems without birth-time support fall back to the modification time.
pub fn creation_date(path: &Path) -> std::io::Result<String> {
    let meta = std::fs::metadata(path)?;
    let stamp = meta.created().or_else(|_| meta.modified())?;
    let local: DateTime<Local> = stamp.into();
    Ok(local.format("%d.%m.%Y").to_string())
}
