//! Site path wiring and the optional `site.toml` override.
//!
//! Everything the pipeline touches on disk hangs off three roots:
//!
//! ```text
//! content/                    # Markdown sources
//! ├── meta.md                 # Site metadata (SEO + social fields)
//! ├── homepage.md             # Homepage section copy
//! ├── author/
//! │   ├── index.md            # Author bio
//! │   └── portrait.png        # Picture referenced from frontmatter
//! ├── posts/                  # Flat `<slug>.md` or `<slug>/index.md`
//! └── projects/
//!
//! static/
//! └── images/
//!     ├── headers/            # cover_NNN.png pool (+ .webp/.avif siblings)
//!     ├── thumbnails/         # cover_NNN.png pool, thumbnail-sized
//!     └── <type>/<item>/      # staged per-item images
//!
//! ansi/
//! └── images/headers/         # cover_NNN.ansi pre-rendered art
//! ```
//!
//! A `site.toml` next to the content root can override the static and ANSI
//! roots; CLI flags override both.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Optional overrides loaded from `<content_root>/site.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct SiteConfig {
    /// Root of the served static tree (default: `static` next to the content root).
    pub static_dir: Option<PathBuf>,
    /// Root of the pre-rendered ANSI tree (default: `ansi` next to the content root).
    pub ansi_dir: Option<PathBuf>,
}

impl SiteConfig {
    /// Load `site.toml` from the content root. Absent file yields defaults.
    pub fn load(content_root: &Path) -> Result<Self, ConfigError> {
        let path = content_root.join("site.toml");
        if !path.is_file() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Resolved filesystem layout for one pipeline run.
///
/// Built once in `main` and passed by reference to every stage. All derived
/// accessors are pure path arithmetic; nothing here touches the disk.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub content_root: PathBuf,
    pub static_root: PathBuf,
    pub ansi_root: PathBuf,
}

impl SitePaths {
    /// Resolve the layout: `site.toml` overrides the defaults, explicit CLI
    /// paths override `site.toml`.
    pub fn resolve(
        content_root: PathBuf,
        static_override: Option<PathBuf>,
        ansi_override: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = SiteConfig::load(&content_root)?;
        let sibling = |name: &str| {
            content_root
                .parent()
                .map(|p| p.join(name))
                .unwrap_or_else(|| PathBuf::from(name))
        };
        let static_root = static_override
            .or(config.static_dir)
            .unwrap_or_else(|| sibling("static"));
        let ansi_root = ansi_override
            .or(config.ansi_dir)
            .unwrap_or_else(|| sibling("ansi"));
        Ok(Self {
            content_root,
            static_root,
            ansi_root,
        })
    }

    pub fn author_dir(&self) -> PathBuf {
        self.content_root.join("author")
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.content_root.join("posts")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.content_root.join("projects")
    }

    pub fn homepage_file(&self) -> PathBuf {
        self.content_root.join("homepage.md")
    }

    pub fn meta_file(&self) -> PathBuf {
        self.content_root.join("meta.md")
    }

    /// Root of all staged and generated raster images.
    pub fn images_dir(&self) -> PathBuf {
        self.static_root.join("images")
    }

    /// Pool of full-size cover images (`cover_NNN.png`).
    pub fn headers_dir(&self) -> PathBuf {
        self.images_dir().join("headers")
    }

    /// Pool of thumbnail-size cover images, same filenames as the headers.
    pub fn thumbnails_dir(&self) -> PathBuf {
        self.images_dir().join("thumbnails")
    }

    /// Pre-rendered ANSI art for the header pool (`cover_NNN.ansi`).
    pub fn ansi_headers_dir(&self) -> PathBuf {
        self.ansi_root.join("images").join("headers")
    }

    /// Destination for images staged from a content item's `images/` folder.
    pub fn staged_images_dir(&self, content_type: &str, item: &str) -> PathBuf {
        self.images_dir().join(content_type).join(item)
    }
}
