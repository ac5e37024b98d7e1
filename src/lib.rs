//! # inkpost
//!
//! A Markdown content pipeline for a personal site with two delivery
//! surfaces: classed HTML for the browser and truecolor ANSI for terminal
//! clients. The filesystem is the data source: posts and projects are
//! Markdown files (or directories with an `index.md` and sibling images),
//! and YAML frontmatter carries the metadata.
//!
//! # Architecture
//!
//! ```text
//! content/          static/                     ansi/
//! ├── meta.md       ├── images/headers/         └── images/headers/
//! ├── homepage.md   │   └── cover_NNN.png           └── cover_NNN.ansi
//! ├── author/       ├── images/thumbnails/
//! ├── posts/        └── images/<type>/<item>/   (staged sibling images)
//! └── projects/
//! ```
//!
//! Loading is one synchronous, fail-fast pass producing an immutable
//! [`content::ContentStore`]; any malformed document aborts the whole build.
//! Asset conversion (WebP, AVIF, ANSI art) is a separate batch stage that
//! fans out over a rayon pool.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Site layout resolution — content root plus static and ANSI trees |
//! | [`frontmatter`] | `---`-delimited YAML block splitting and typed decoding |
//! | [`naming`] | Derived names: slugs, reading time, creation dates |
//! | [`cover`] | Deterministic cover assignment from title length |
//! | [`context`] | Content item discovery and filesystem context resolution |
//! | [`html`] | Markdown → classed HTML with image staging and src rewriting |
//! | [`ansi`] | Markdown → ANSI text and raster images → ANSI block art |
//! | [`content`] | Typed records, frontmatter schemas, `ContentStore` / `AnsiStore` |
//! | [`convert`] | Batch WebP/AVIF/ANSI conversion over the rayon pool |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Deterministic covers, no randomness
//!
//! Covers come from a fixed pool and are assigned by title length modulo the
//! pool size. The same title always gets the same cover across rebuilds and
//! machines, so generated pages and social cards never churn.
//!
//! ## One store, built once
//!
//! [`content::ContentStore::load`] returns a plain value. Callers build it
//! at startup and pass it by reference; there is no global cache and no
//! invalidation story, because there is nothing to invalidate.
//!
//! ## Event-driven HTML, no DOM pass
//!
//! Class injection, anchor hardening, and image src rewriting happen while
//! emitting HTML from the pulldown-cmark event stream. A single pass replaces
//! a render-then-reparse cycle and keeps escaping in one place.

pub mod ansi;
pub mod config;
pub mod content;
pub mod context;
pub mod convert;
pub mod cover;
pub mod frontmatter;
pub mod html;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
