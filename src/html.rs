//! Markdown-to-HTML post-processing.
//!
//! Rendering is a single pass over the pulldown-cmark event stream into an
//! HTML string. Driving the emitter ourselves (instead of `html::push_html`)
//! is what lets every element carry its presentation class, anchors pick up
//! `target`/`rel` hardening, and image sources get classified and rewritten
//! while they are being written out.
//!
//! ## Image handling
//!
//! An `<img src>` is **external** when it has a declared scheme and either a
//! network host or a scheme from a fixed allow-list (`data`, `mailto`).
//! External sources pass through untouched. Local sources are rewritten to
//! `images/<content_type>/<item>/<filename>` relative to the static root —
//! only the filename survives, so relative traversal components in the
//! source can never escape the staged directory.
//!
//! Before any rewriting happens, the item's sibling `images/` files are
//! copied (never moved — the Markdown source tree stays untouched) into the
//! static tree, with the destination wiped and recreated on every build.

use crate::config::SitePaths;
use crate::context::{ContentContext, LayoutError};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image source cannot be empty or only whitespace")]
    EmptyImageSource,
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Presentation classes injected per tag kind. Fixed strings, no
/// per-instance variation; the serving layer's stylesheet expects these.
mod classes {
    pub const ANCHOR: &str = "text-sky-500 font-bold";
    pub const HEADINGS: [&str; 6] = [
        "text-4xl font-black",
        "text-3xl font-black",
        "text-2xl font-black",
        "text-xl font-black",
        "text-xl font-bold",
        "text-lg font-bold",
    ];
    pub const BLOCKQUOTE: &str = "bg-neutral-900 px-4 py-2 italic rounded-md text-base font-medium";
    pub const UNORDERED_LIST: &str = "ps-5 space-y-1 list-disc list-inside";
    pub const ORDERED_LIST: &str = "ps-5 space-y-1 list-decimal list-inside";
    pub const IMAGE: &str = "mx-auto";
    pub const PRE: &str = "py-3 px-3 text-md overflow-x-auto";
}

/// URL prefix (relative to the static root) under which staged and pool
/// images are served.
const IMAGES_PREFIX: &str = "images";

/// Rendered body plus the flags the presentation layer keys off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHtml {
    pub html: String,
    /// True when the body contains any code element; the serving layer uses
    /// this to conditionally load syntax-highlighting assets.
    pub has_code: bool,
}

/// Render a Markdown body to post-processed HTML.
///
/// Stages sibling images first (when the context carries any), then walks
/// the event stream. Fails fast on layout problems and empty image sources.
pub fn render_html(
    body: &str,
    ctx: &ContentContext,
    paths: &SitePaths,
) -> Result<RenderedHtml, RenderError> {
    if ctx.image_files.is_some() {
        stage_images(ctx, paths)?;
    }
    let mut writer = HtmlWriter::new(ctx);
    let parser = Parser::new_ext(body, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES);
    for event in parser {
        writer.event(event)?;
    }
    Ok(writer.finish())
}

/// Classify a URL as external (scheme + host, or `data:`/`mailto:`) or local.
///
/// Empty or whitespace-only input is a validation error rather than "local":
/// an empty src in authored content is always a mistake.
pub fn is_external_url(src: &str) -> Result<bool, RenderError> {
    if src.trim().is_empty() {
        return Err(RenderError::EmptyImageSource);
    }
    match Url::parse(src) {
        Ok(parsed) => Ok(parsed.has_host() || matches!(parsed.scheme(), "data" | "mailto")),
        // No scheme at all: a relative reference, hence local.
        Err(_) => Ok(false),
    }
}

/// Copy a content item's sibling images into the static tree.
///
/// The destination directory is removed and recreated so stale files from a
/// previous build never survive. Source validation mirrors the resolver:
/// the images directory must exist, be a directory, and be non-empty.
pub fn stage_images(ctx: &ContentContext, paths: &SitePaths) -> Result<Vec<PathBuf>, RenderError> {
    let item_dir = ctx.item_dir();
    if !item_dir.is_dir() {
        return Err(LayoutError::NotADirectory(item_dir.to_path_buf()).into());
    }
    let source_dir = item_dir.join("images");
    if !source_dir.exists() {
        return Err(LayoutError::Missing(source_dir).into());
    }
    if !source_dir.is_dir() {
        return Err(LayoutError::ImagesNotADirectory(source_dir).into());
    }

    let dest_dir = paths.staged_images_dir(&ctx.content_type, &ctx.item_name());
    if dest_dir.exists() {
        if dest_dir.is_dir() {
            std::fs::remove_dir_all(&dest_dir).map_err(|source| RenderError::Io {
                path: dest_dir.clone(),
                source,
            })?;
        } else if dest_dir.is_file() {
            std::fs::remove_file(&dest_dir).map_err(|source| RenderError::Io {
                path: dest_dir.clone(),
                source,
            })?;
        } else {
            return Err(LayoutError::UnsupportedPathType(dest_dir).into());
        }
    }
    std::fs::create_dir_all(&dest_dir).map_err(|source| RenderError::Io {
        path: dest_dir.clone(),
        source,
    })?;

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&source_dir)
        .map_err(|source| RenderError::Io {
            path: source_dir.clone(),
            source,
        })?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    if sources.is_empty() {
        return Err(LayoutError::NoImages(source_dir).into());
    }
    sources.sort();

    let mut staged = Vec::with_capacity(sources.len());
    for src in &sources {
        let name = src.file_name().unwrap_or_default();
        let dst = dest_dir.join(name);
        std::fs::copy(src, &dst).map_err(|source| RenderError::Io {
            path: dst.clone(),
            source,
        })?;
        staged.push(dst);
    }
    Ok(staged)
}

/// Event-stream HTML emitter with class injection.
struct HtmlWriter<'c> {
    ctx: &'c ContentContext,
    out: String,
    has_code: bool,
    /// Alt text being collected between image start/end events.
    image_alt: Option<String>,
    /// `(src, title)` of the image whose alt text is being collected.
    pending_image: Option<(String, String)>,
    /// Raw text of the fenced code block being collected, with its language.
    code_block: Option<(Option<String>, String)>,
}

impl<'c> HtmlWriter<'c> {
    fn new(ctx: &'c ContentContext) -> Self {
        Self {
            ctx,
            out: String::with_capacity(1024),
            has_code: false,
            image_alt: None,
            pending_image: None,
            code_block: None,
        }
    }

    fn finish(self) -> RenderedHtml {
        RenderedHtml {
            html: self.out,
            has_code: self.has_code,
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start(tag)?,
            Event::End(tag) => self.end(tag)?,
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.push_markup(&html),
            Event::SoftBreak => self.push_markup("\n"),
            Event::HardBreak => self.push_markup("<br />"),
            Event::Rule => self.out.push_str("<hr />"),
            Event::TaskListMarker(checked) => {
                let checked = if checked { " checked" } else { "" };
                write!(self.out, r#"<input type="checkbox" disabled{checked} />"#).unwrap();
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {}
        }
        Ok(())
    }

    /// Inline markup goes to the output unless an image is collecting alt
    /// text, in which case nested tags are dropped and only text survives.
    fn push_markup(&mut self, markup: &str) {
        if self.image_alt.is_none() {
            self.out.push_str(markup);
        }
    }

    fn start(&mut self, tag: Tag<'_>) -> Result<(), RenderError> {
        match tag {
            Tag::Paragraph => self.push_markup("<p>"),
            Tag::Heading { level, .. } => {
                let n = heading_number(level);
                write!(
                    self.out,
                    r#"<h{n} class="{}">"#,
                    classes::HEADINGS[n as usize - 1]
                )
                .unwrap();
            }
            Tag::BlockQuote(_) => {
                write!(self.out, r#"<blockquote class="{}">"#, classes::BLOCKQUOTE).unwrap();
            }
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        // Fence info may carry attributes after the language.
                        info.split_whitespace().next().map(str::to_string)
                    }
                    _ => None,
                };
                self.code_block = Some((lang, String::new()));
            }
            Tag::List(start) => match start {
                Some(1) => {
                    write!(self.out, r#"<ol class="{}">"#, classes::ORDERED_LIST).unwrap();
                }
                Some(n) => {
                    write!(
                        self.out,
                        r#"<ol class="{}" start="{n}">"#,
                        classes::ORDERED_LIST
                    )
                    .unwrap();
                }
                None => {
                    write!(self.out, r#"<ul class="{}">"#, classes::UNORDERED_LIST).unwrap();
                }
            },
            Tag::Item => self.push_markup("<li>"),
            Tag::Emphasis => self.push_markup("<em>"),
            Tag::Strong => self.push_markup("<strong>"),
            Tag::Strikethrough => self.push_markup("<s>"),
            Tag::Link { dest_url, .. } => {
                // Anchors with an outbound destination open in a new tab
                // with a safe rel; in-page and relative links stay plain.
                let outbound = is_external_url(&dest_url).unwrap_or(false);
                write!(
                    self.out,
                    r#"<a class="{}" href="{}""#,
                    classes::ANCHOR,
                    escape_attr(&dest_url)
                )
                .unwrap();
                if outbound {
                    self.out
                        .push_str(r#" target="_blank" rel="noopener noreferrer""#);
                }
                self.out.push('>');
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image_alt = Some(String::new());
                self.pending_image = Some((dest_url.to_string(), title.to_string()));
            }
            Tag::Table(_) => self.out.push_str("<table>"),
            Tag::TableHead => self.out.push_str("<thead><tr>"),
            Tag::TableRow => self.out.push_str("<tr>"),
            Tag::TableCell => self.out.push_str("<td>"),
            Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => {}
        }
        Ok(())
    }

    fn end(&mut self, tag: TagEnd) -> Result<(), RenderError> {
        match tag {
            TagEnd::Paragraph => self.push_markup("</p>"),
            TagEnd::Heading(level) => {
                write!(self.out, "</h{}>", heading_number(level)).unwrap();
            }
            TagEnd::BlockQuote(_) => self.out.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some((lang, code)) = self.code_block.take() {
                    self.has_code = true;
                    write!(self.out, r#"<pre class="{}"><code"#, classes::PRE).unwrap();
                    if let Some(lang) = lang {
                        write!(self.out, r#" class="language-{}""#, escape_attr(&lang)).unwrap();
                    }
                    write!(self.out, ">{}</code></pre>", escape_html(&code)).unwrap();
                }
            }
            TagEnd::List(ordered) => {
                self.out.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.push_markup("</li>"),
            TagEnd::Emphasis => self.push_markup("</em>"),
            TagEnd::Strong => self.push_markup("</strong>"),
            TagEnd::Strikethrough => self.push_markup("</s>"),
            TagEnd::Link => self.push_markup("</a>"),
            TagEnd::Image => {
                let alt = self.image_alt.take().unwrap_or_default();
                if let Some((src, title)) = self.pending_image.take() {
                    self.write_image(&src, &alt, &title)?;
                }
            }
            TagEnd::Table => self.out.push_str("</tbody></table>"),
            TagEnd::TableHead => self.out.push_str("</tr></thead><tbody>"),
            TagEnd::TableRow => self.out.push_str("</tr>"),
            TagEnd::TableCell => self.out.push_str("</td>"),
            TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::Superscript
            | TagEnd::Subscript => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = self.code_block.as_mut() {
            code.push_str(text);
        } else if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(text);
        } else {
            self.out.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(code);
            return;
        }
        self.has_code = true;
        write!(self.out, "<code>{}</code>", escape_html(code)).unwrap();
    }

    fn write_image(&mut self, src: &str, alt: &str, title: &str) -> Result<(), RenderError> {
        let resolved = if is_external_url(src)? {
            src.to_string()
        } else {
            self.rewrite_local_src(src)
        };
        write!(
            self.out,
            r#"<img class="{}" src="{}" alt="{}""#,
            classes::IMAGE,
            escape_attr(&resolved),
            escape_attr(alt)
        )
        .unwrap();
        if !title.is_empty() {
            write!(self.out, r#" title="{}""#, escape_attr(title)).unwrap();
        }
        self.out.push_str(" />");
        Ok(())
    }

    /// `images/<content_type>/<item>/<filename>` — only the filename of the
    /// authored path is kept.
    fn rewrite_local_src(&self, src: &str) -> String {
        let filename = Path::new(src)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| src.to_string());
        format!(
            "{IMAGES_PREFIX}/{}/{}/{filename}",
            self.ctx.content_type,
            self.ctx.item_name()
        )
    }
}

fn heading_number(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{flat_context, item_with_images, site_fixture};

    #[test]
    fn external_classifier_matches_contract() {
        assert!(is_external_url("https://example.com/x.png").unwrap());
        assert!(is_external_url("mailto:a@b.com").unwrap());
        assert!(is_external_url("data:image/png;base64,AAAA").unwrap());
        assert!(!is_external_url("images/cover.png").unwrap());
        assert!(!is_external_url("./relative/x.png").unwrap());
        assert!(!is_external_url("/absolute/x.png").unwrap());
        assert!(matches!(
            is_external_url(""),
            Err(RenderError::EmptyImageSource)
        ));
        assert!(matches!(
            is_external_url("   "),
            Err(RenderError::EmptyImageSource)
        ));
    }

    #[test]
    fn scheme_without_host_outside_allowlist_is_local() {
        // Has a scheme but no network location and not data/mailto.
        assert!(!is_external_url("c:/windows/x.png").unwrap());
    }

    #[test]
    fn headings_get_level_classes() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("# One\n\n###### Six\n", &ctx, &paths).unwrap();
        assert!(out.html.contains(r#"<h1 class="text-4xl font-black">One</h1>"#));
        assert!(out.html.contains(r#"<h6 class="text-lg font-bold">Six</h6>"#));
    }

    #[test]
    fn outbound_anchor_is_hardened() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("[x](https://example.com)", &ctx, &paths).unwrap();
        assert!(out.html.contains(
            r#"<a class="text-sky-500 font-bold" href="https://example.com" target="_blank" rel="noopener noreferrer">x</a>"#
        ));
    }

    #[test]
    fn relative_anchor_keeps_class_but_not_target() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("[x](/about)", &ctx, &paths).unwrap();
        assert!(out.html.contains(r#"<a class="text-sky-500 font-bold" href="/about">x</a>"#));
        assert!(!out.html.contains("target"));
    }

    #[test]
    fn lists_and_blockquotes_get_classes() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("- a\n- b\n\n1. c\n\n> quoted\n", &ctx, &paths).unwrap();
        assert!(out
            .html
            .contains(r#"<ul class="ps-5 space-y-1 list-disc list-inside">"#));
        assert!(out
            .html
            .contains(r#"<ol class="ps-5 space-y-1 list-decimal list-inside">"#));
        assert!(out.html.contains(
            r#"<blockquote class="bg-neutral-900 px-4 py-2 italic rounded-md text-base font-medium">"#
        ));
    }

    #[test]
    fn fenced_code_sets_extras_flag() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("```rust\nfn main() {}\n```\n", &ctx, &paths).unwrap();
        assert!(out.has_code);
        assert!(out.html.contains(r#"<pre class="py-3 px-3 text-md overflow-x-auto">"#));
        assert!(out.html.contains(r#"<code class="language-rust">"#));
        assert!(out.html.contains("fn main() {}"));
    }

    #[test]
    fn inline_code_sets_extras_flag_too() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("use `let` here", &ctx, &paths).unwrap();
        assert!(out.has_code);
        assert!(out.html.contains("<code>let</code>"));
    }

    #[test]
    fn prose_without_code_leaves_flag_unset() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("plain paragraph", &ctx, &paths).unwrap();
        assert!(!out.has_code);
        assert_eq!(out.html, "<p>plain paragraph</p>");
    }

    #[test]
    fn code_content_is_escaped() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("```\n<b>&\n```\n", &ctx, &paths).unwrap();
        assert!(out.html.contains("&lt;b&gt;&amp;"));
    }

    #[test]
    fn external_image_passes_through() {
        let (_tmp, paths, ctx) = flat_context();
        let out =
            render_html("![alt](https://example.com/pic.png)", &ctx, &paths).unwrap();
        assert!(out
            .html
            .contains(r#"<img class="mx-auto" src="https://example.com/pic.png" alt="alt" />"#));
    }

    #[test]
    fn local_image_is_rewritten_with_filename_only() {
        let (_tmp, paths, ctx) = item_with_images("posts", "trip", &["photo.png"]);
        let out = render_html("![a trip](images/../images/photo.png)", &ctx, &paths).unwrap();
        assert!(
            out.html
                .contains(r#"src="images/posts/trip/photo.png""#),
            "html: {}",
            out.html
        );
    }

    #[test]
    fn staging_copies_and_wipes_destination() {
        let (_tmp, paths, ctx) = item_with_images("posts", "trip", &["photo.png"]);
        let dest_dir = paths.staged_images_dir("posts", "trip");
        std::fs::create_dir_all(&dest_dir).unwrap();
        std::fs::write(dest_dir.join("stale.png"), b"old").unwrap();

        let staged = stage_images(&ctx, &paths).unwrap();
        assert_eq!(staged, vec![dest_dir.join("photo.png")]);
        assert!(!dest_dir.join("stale.png").exists(), "stale file must be wiped");
        // Source is copied, not moved.
        assert!(ctx.item_dir().join("images/photo.png").exists());
    }

    #[test]
    fn staging_missing_images_dir_fails() {
        let (tmp, paths) = site_fixture();
        let dir = tmp.path().join("content/posts/bare");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.md"), "x").unwrap();
        let ctx = crate::context::resolve(&dir).unwrap();
        // resolve() saw no images dir; force staging anyway
        let err = stage_images(&ctx, &paths).unwrap_err();
        assert!(matches!(err, RenderError::Layout(LayoutError::Missing(_))));
    }

    #[test]
    fn staging_empty_images_dir_fails() {
        let (tmp, paths) = site_fixture();
        let dir = tmp.path().join("content/posts/hollow");
        std::fs::create_dir_all(dir.join("images")).unwrap();
        std::fs::write(dir.join("index.md"), "x").unwrap();
        let ctx = crate::context::resolve(&dir).unwrap();
        let err = stage_images(&ctx, &paths).unwrap_err();
        assert!(matches!(err, RenderError::Layout(LayoutError::NoImages(_))));
    }

    #[test]
    fn image_alt_collects_styled_text() {
        let (_tmp, paths, ctx) = flat_context();
        let out = render_html("![an *emphatic* alt](https://e.com/p.png)", &ctx, &paths).unwrap();
        assert!(out.html.contains(r#"alt="an emphatic alt""#));
        assert!(!out.html.contains("<em>"), "no markup inside alt");
    }
}
