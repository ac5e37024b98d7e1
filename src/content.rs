//! Typed content records and the store loaders.
//!
//! Each frontmatter shape gets its own serde schema (`MetadataDoc`,
//! `AuthorDoc`, `PostDoc`, `ProjectDoc`, `HomepageDoc`), decoded strictly —
//! unknown content kinds don't exist, and a schema mismatch fails the whole
//! load. On top of the schemas sit the published records (`Post`, `Project`,
//! `Author`, `SiteMetadata`, `Homepage`) with their computed fields filled
//! in: slug, cover assignment, reading time, publish date.
//!
//! `ContentStore::load` builds everything in one synchronous, fail-fast pass
//! and returns an immutable value. Callers construct it once at startup and
//! pass it by reference; there is no hidden cache to invalidate.
//!
//! `AnsiStore` is the terminal-facing parallel: same discovery and computed
//! fields, but bodies rendered to ANSI and headers read from pre-rendered
//! `.ansi` art files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::ansi;
use crate::config::SitePaths;
use crate::context::{self, ContentContext, LayoutError};
use crate::cover::{self, CoverAssignment, CoverError, ImageSet};
use crate::frontmatter::{self, Document, FrontmatterError};
use crate::html::{self, RenderError};
use crate::naming;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Cover(#[from] CoverError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("'{field}' must not be empty in {path}")]
    EmptyField {
        path: PathBuf,
        field: &'static str,
    },
    #[error("Invalid URL in '{field}' of {path}: {source}")]
    InvalidUrl {
        path: PathBuf,
        field: &'static str,
        source: url::ParseError,
    },
    #[error("Duplicate slug '{slug}' under {dir}")]
    DuplicateSlug { slug: String, dir: PathBuf },
}

// ---------------------------------------------------------------------------
// Frontmatter schemas
// ---------------------------------------------------------------------------

/// `meta.md` frontmatter: SEO and social-card fields.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataDoc {
    pub description: String,
    pub keywords: Vec<String>,
    pub author: String,
    pub language: Vec<String>,
    pub robots: Vec<String>,
    #[serde(rename = "og:title")]
    pub og_title: String,
    #[serde(rename = "og:description")]
    pub og_description: String,
    #[serde(rename = "og:image")]
    pub og_image: Option<String>,
    #[serde(rename = "og:url")]
    pub og_url: String,
    #[serde(rename = "og:type")]
    pub og_type: String,
    #[serde(rename = "og:locale")]
    pub og_locale: String,
    #[serde(rename = "twitter:card")]
    pub twitter_card: String,
    #[serde(rename = "twitter:title")]
    pub twitter_title: String,
    #[serde(rename = "twitter:description")]
    pub twitter_description: String,
    #[serde(rename = "twitter:image")]
    pub twitter_image: Option<String>,
    #[serde(rename = "twitter:creator")]
    pub twitter_creator: String,
}

/// `author/index.md` frontmatter.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorDoc {
    pub picture: String,
    pub full_name: String,
    pub role: String,
    pub about: String,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
}

/// Post frontmatter. Everything but the title has a computed fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct PostDoc {
    pub title: String,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
    pub topic: Option<String>,
}

/// Project frontmatter.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDoc {
    pub title: String,
    pub description: Option<String>,
    pub repository: Option<String>,
    pub website: Option<String>,
    pub slug: Option<String>,
    pub date: Option<String>,
}

/// `homepage.md` frontmatter: one description per section.
#[derive(Debug, Clone, Deserialize)]
pub struct HomepageDoc {
    pub posts_section_description: String,
    pub projects_section_description: String,
}

// ---------------------------------------------------------------------------
// Published records
// ---------------------------------------------------------------------------

/// Site-wide metadata with list fields joined for meta-tag emission and
/// social images defaulted to the author's cover thumbnail.
#[derive(Debug, Clone, Serialize)]
pub struct SiteMetadata {
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub language: String,
    pub robots: String,
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub og_url: String,
    pub og_type: String,
    pub og_locale: String,
    pub twitter_card: String,
    pub twitter_title: String,
    pub twitter_description: String,
    pub twitter_image: String,
    pub twitter_creator: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Author {
    pub full_name: String,
    pub role: String,
    pub about: String,
    /// Picture staged into the static tree, with alternate encodings probed.
    pub picture: ImageSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin_url: Option<String>,
    pub html: String,
    pub has_code: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub slug: String,
    pub date: String,
    pub reading_time_minutes: u32,
    pub reading_time: String,
    pub cover: CoverAssignment,
    pub html: String,
    pub has_code: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub slug: String,
    pub date: String,
    pub reading_time_minutes: u32,
    pub reading_time: String,
    pub cover: CoverAssignment,
    pub html: String,
    pub has_code: bool,
}

/// A homepage section: copy, entry count, and a stable thumbnail derived
/// from the section name.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub description: String,
    pub entries: usize,
    pub thumbnail: ImageSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct Homepage {
    pub posts_section: SectionSummary,
    pub projects_section: SectionSummary,
}

/// The whole content tree, loaded once and passed by reference.
#[derive(Debug, Clone, Serialize)]
pub struct ContentStore {
    pub metadata: SiteMetadata,
    pub author: Author,
    pub posts: BTreeMap<String, Post>,
    pub projects: BTreeMap<String, Project>,
    pub homepage: Homepage,
}

impl ContentStore {
    pub fn load(paths: &SitePaths) -> Result<Self, LoadError> {
        let metadata = load_metadata(paths)?;
        let author = load_author(paths)?;
        let posts = load_posts(paths)?;
        let projects = load_projects(paths)?;
        let homepage = load_homepage(paths, posts.len(), projects.len())?;
        Ok(Self {
            metadata,
            author,
            posts,
            projects,
            homepage,
        })
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Document<T>, LoadError> {
    let text = read_file(path)?;
    frontmatter::parse(&text).map_err(|source| LoadError::Frontmatter {
        path: path.to_path_buf(),
        source,
    })
}

fn require_non_empty(
    path: &Path,
    field: &'static str,
    values: &[String],
) -> Result<(), LoadError> {
    if values.is_empty() {
        return Err(LoadError::EmptyField {
            path: path.to_path_buf(),
            field,
        });
    }
    Ok(())
}

fn validate_url(path: &Path, field: &'static str, value: &str) -> Result<(), LoadError> {
    Url::parse(value).map_err(|source| LoadError::InvalidUrl {
        path: path.to_path_buf(),
        field,
        source,
    })?;
    Ok(())
}

fn join_list(values: &[String]) -> String {
    values.join(", ")
}

/// Computed fields shared by posts and projects.
struct Derived {
    slug: String,
    date: String,
    reading_time_minutes: u32,
    reading_time: String,
    cover: CoverAssignment,
}

fn derive_fields(
    paths: &SitePaths,
    ctx: &ContentContext,
    title: &str,
    slug: Option<String>,
    date: Option<String>,
    body: &str,
) -> Result<Derived, LoadError> {
    let slug_source: &Path = if ctx.is_dir {
        ctx.item_dir()
    } else {
        &ctx.index_file
    };
    let slug = match slug {
        Some(s) => s,
        None => naming::derive_slug(slug_source),
    };
    let date = match date {
        Some(d) => d,
        None => naming::creation_date(&ctx.index_file).map_err(|source| LoadError::Io {
            path: ctx.index_file.clone(),
            source,
        })?,
    };
    let reading_time_minutes = naming::reading_time_minutes(body);
    Ok(Derived {
        slug,
        date,
        reading_time_minutes,
        reading_time: naming::reading_time_label(reading_time_minutes),
        cover: cover::assign(paths, title)?,
    })
}

fn load_metadata(paths: &SitePaths) -> Result<SiteMetadata, LoadError> {
    let path = paths.meta_file();
    let doc: Document<MetadataDoc> = parse_document(&path)?;
    let meta = doc.metadata;

    require_non_empty(&path, "keywords", &meta.keywords)?;
    require_non_empty(&path, "language", &meta.language)?;
    require_non_empty(&path, "robots", &meta.robots)?;
    validate_url(&path, "og:url", &meta.og_url)?;
    if let Some(url) = &meta.og_image {
        validate_url(&path, "og:image", url)?;
    }
    if let Some(url) = &meta.twitter_image {
        validate_url(&path, "twitter:image", url)?;
    }

    // Social cards without an explicit image fall back to the author's
    // deterministic cover thumbnail.
    let default_thumbnail = cover::assign(paths, &meta.author)?.thumbnail.default;
    Ok(SiteMetadata {
        description: meta.description,
        keywords: join_list(&meta.keywords),
        author: meta.author,
        language: join_list(&meta.language),
        robots: join_list(&meta.robots),
        og_title: meta.og_title,
        og_description: meta.og_description,
        og_image: meta.og_image.unwrap_or_else(|| default_thumbnail.clone()),
        og_url: meta.og_url,
        og_type: meta.og_type,
        og_locale: meta.og_locale,
        twitter_card: meta.twitter_card,
        twitter_title: meta.twitter_title,
        twitter_description: meta.twitter_description,
        twitter_image: meta.twitter_image.unwrap_or(default_thumbnail),
        twitter_creator: meta.twitter_creator,
    })
}

/// Copy the author's picture into `static/images/author/` and probe for
/// alternate encodings next to the copy.
fn stage_author_picture(paths: &SitePaths, picture: &str) -> Result<ImageSet, LoadError> {
    let src = paths.author_dir().join(picture);
    let file_name = src.file_name().ok_or_else(|| LoadError::EmptyField {
        path: src.clone(),
        field: "picture",
    })?;
    let dest_dir = paths.images_dir().join("author");
    fs::create_dir_all(&dest_dir).map_err(|source| LoadError::Io {
        path: dest_dir.clone(),
        source,
    })?;
    let dest = dest_dir.join(file_name);
    fs::copy(&src, &dest).map_err(|source| LoadError::Io {
        path: src.clone(),
        source,
    })?;
    Ok(ImageSet::probe(&dest, &paths.static_root)?)
}

fn load_author(paths: &SitePaths) -> Result<Author, LoadError> {
    let ctx = context::resolve(&paths.author_dir())?;
    let doc: Document<AuthorDoc> = parse_document(&ctx.index_file)?;
    let author = doc.metadata;

    if let Some(url) = &author.github_url {
        validate_url(&ctx.index_file, "github_url", url)?;
    }
    if let Some(url) = &author.linkedin_url {
        validate_url(&ctx.index_file, "linkedin_url", url)?;
    }
    let picture = stage_author_picture(paths, &author.picture)?;
    let rendered = html::render_html(&doc.body, &ctx, paths)?;
    Ok(Author {
        full_name: author.full_name,
        role: author.role,
        about: author.about,
        picture,
        github_url: author.github_url,
        linkedin_url: author.linkedin_url,
        html: rendered.html,
        has_code: rendered.has_code,
    })
}

fn load_posts(paths: &SitePaths) -> Result<BTreeMap<String, Post>, LoadError> {
    let dir = paths.posts_dir();
    let mut posts = BTreeMap::new();
    for object in context::discover(&dir)? {
        let ctx = context::resolve(&object)?;
        let doc: Document<PostDoc> = parse_document(&ctx.index_file)?;
        let meta = doc.metadata;
        let derived = derive_fields(paths, &ctx, &meta.title, meta.slug, meta.date, &doc.body)?;
        let rendered = html::render_html(&doc.body, &ctx, paths)?;
        let post = Post {
            title: meta.title,
            description: meta.description,
            topic: meta.topic,
            slug: derived.slug.clone(),
            date: derived.date,
            reading_time_minutes: derived.reading_time_minutes,
            reading_time: derived.reading_time,
            cover: derived.cover,
            html: rendered.html,
            has_code: rendered.has_code,
        };
        if posts.insert(derived.slug.clone(), post).is_some() {
            return Err(LoadError::DuplicateSlug {
                slug: derived.slug,
                dir,
            });
        }
    }
    Ok(posts)
}

fn load_projects(paths: &SitePaths) -> Result<BTreeMap<String, Project>, LoadError> {
    let dir = paths.projects_dir();
    let mut projects = BTreeMap::new();
    for object in context::discover(&dir)? {
        let ctx = context::resolve(&object)?;
        let doc: Document<ProjectDoc> = parse_document(&ctx.index_file)?;
        let meta = doc.metadata;
        if let Some(url) = &meta.website {
            validate_url(&ctx.index_file, "website", url)?;
        }
        let derived = derive_fields(paths, &ctx, &meta.title, meta.slug, meta.date, &doc.body)?;
        let rendered = html::render_html(&doc.body, &ctx, paths)?;
        let project = Project {
            title: meta.title,
            description: meta.description,
            repository: meta.repository,
            website: meta.website,
            slug: derived.slug.clone(),
            date: derived.date,
            reading_time_minutes: derived.reading_time_minutes,
            reading_time: derived.reading_time,
            cover: derived.cover,
            html: rendered.html,
            has_code: rendered.has_code,
        };
        if projects.insert(derived.slug.clone(), project).is_some() {
            return Err(LoadError::DuplicateSlug {
                slug: derived.slug,
                dir,
            });
        }
    }
    Ok(projects)
}

fn load_homepage(
    paths: &SitePaths,
    post_count: usize,
    project_count: usize,
) -> Result<Homepage, LoadError> {
    let path = paths.homepage_file();
    let doc: Document<HomepageDoc> = parse_document(&path)?;
    let meta = doc.metadata;
    // Section thumbnails key off the section name, so they stay stable
    // regardless of the entries behind them.
    let section = |description: String, entries: usize, name: &str| -> Result<SectionSummary, LoadError> {
        Ok(SectionSummary {
            description,
            entries,
            thumbnail: cover::assign(paths, name)?.thumbnail,
        })
    };
    Ok(Homepage {
        posts_section: section(meta.posts_section_description, post_count, "posts")?,
        projects_section: section(meta.projects_section_description, project_count, "projects")?,
    })
}

// ---------------------------------------------------------------------------
// ANSI store
// ---------------------------------------------------------------------------

/// A post or project prepared for terminal delivery: ANSI body, pre-rendered
/// header art, and the usual computed fields. The title comes from the item
/// name on disk, not the frontmatter.
#[derive(Debug, Clone, Serialize)]
pub struct AnsiEntry {
    pub slug: String,
    pub title: String,
    pub header: String,
    pub publish_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub reading_time_minutes: u32,
    pub reading_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnsiStore {
    pub posts: BTreeMap<String, AnsiEntry>,
    pub projects: BTreeMap<String, AnsiEntry>,
}

impl AnsiStore {
    /// Load both content types for terminal delivery. Requires the `.ansi`
    /// header art to be pre-rendered (the `ansi-headers` pipeline pass).
    pub fn load(paths: &SitePaths) -> Result<Self, LoadError> {
        Ok(Self {
            posts: load_ansi_posts(paths)?,
            projects: load_ansi_projects(paths)?,
        })
    }
}

fn load_ansi_entry(
    paths: &SitePaths,
    ctx: &ContentContext,
    slug: Option<String>,
    date: Option<String>,
    body: &str,
    repository: Option<String>,
    website: Option<String>,
) -> Result<AnsiEntry, LoadError> {
    let title = ctx.item_name();
    if ctx.image_files.is_some() {
        html::stage_images(ctx, paths)?;
    }
    let header_path = cover::ansi_header_path(paths, &title)?;
    let header = read_file(&header_path)?;
    let rendered_body = if body.trim().is_empty() {
        None
    } else {
        Some(ansi::render_markdown(body))
    };
    let derived = derive_fields(paths, ctx, &title, slug, date, body)?;
    Ok(AnsiEntry {
        slug: derived.slug,
        title,
        header,
        publish_date: derived.date,
        body: rendered_body,
        reading_time_minutes: derived.reading_time_minutes,
        reading_time: derived.reading_time,
        repository,
        website,
    })
}

fn load_ansi_posts(paths: &SitePaths) -> Result<BTreeMap<String, AnsiEntry>, LoadError> {
    let dir = paths.posts_dir();
    let mut posts = BTreeMap::new();
    for object in context::discover(&dir)? {
        let ctx = context::resolve(&object)?;
        let doc: Document<PostDoc> = parse_document(&ctx.index_file)?;
        let entry = load_ansi_entry(
            paths,
            &ctx,
            doc.metadata.slug,
            doc.metadata.date,
            &doc.body,
            None,
            None,
        )?;
        let slug = entry.slug.clone();
        if posts.insert(slug.clone(), entry).is_some() {
            return Err(LoadError::DuplicateSlug { slug, dir });
        }
    }
    Ok(posts)
}

fn load_ansi_projects(paths: &SitePaths) -> Result<BTreeMap<String, AnsiEntry>, LoadError> {
    let dir = paths.projects_dir();
    let mut projects = BTreeMap::new();
    for object in context::discover(&dir)? {
        let ctx = context::resolve(&object)?;
        let doc: Document<ProjectDoc> = parse_document(&ctx.index_file)?;
        let entry = load_ansi_entry(
            paths,
            &ctx,
            doc.metadata.slug,
            doc.metadata.date,
            &doc.body,
            doc.metadata.repository,
            doc.metadata.website,
        )?;
        let slug = entry.slug.clone();
        if projects.insert(slug.clone(), entry).is_some() {
            return Err(LoadError::DuplicateSlug { slug, dir });
        }
    }
    Ok(projects)
}
