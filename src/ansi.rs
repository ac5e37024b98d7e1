//! ANSI rendering for terminal clients.
//!
//! Two independent jobs live here:
//!
//! 1. **Markdown → ANSI text**: the terminal-facing equivalent of the HTML
//!    body. A single pass over the pulldown-cmark event stream emits
//!    truecolor-styled, word-wrapped text for a fixed-width terminal
//!    (79 columns). Code blocks use a fixed palette; every styled span is
//!    closed with a reset escape.
//!
//! 2. **Raster image → ANSI art**: covers are resized to the terminal width
//!    with the height corrected by `aspect * 0.3` (a character cell is
//!    roughly three times taller than it is wide), then each pixel becomes
//!    a truecolor-prefixed full-block character. One escape per pixel is
//!    wasteful on bytes but renders on any terminal with truecolor support,
//!    with no 256-color palette quantization.
//!
//! Both renderers are pure functions of their input; pre-rendering and
//! caching happen elsewhere (the asset pipeline writes `.ansi` files).

use image::RgbImage;
use image::imageops::FilterType;
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Target character width for all terminal output.
pub const TERMINAL_WIDTH: usize = 79;

/// Vertical correction: terminal cells are taller than wide, so the pixel
/// row count is scaled down to keep the art's proportions.
const ASPECT_CORRECTION: f64 = 0.3;

/// ANSI reset escape, closing every styled span and every art line.
pub const RESET: &str = "\x1b[0m";

const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const STRIKE: &str = "\x1b[9m";

#[derive(Error, Debug)]
pub enum AnsiError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
}

/// Fixed truecolor palette for terminal output.
mod palette {
    pub type Rgb = (u8, u8, u8);
    pub const HEADING: Rgb = (56, 189, 248);
    pub const LINK: Rgb = (14, 165, 233);
    pub const QUOTE: Rgb = (163, 163, 163);
    pub const CODE: Rgb = (201, 209, 217);
    pub const DIM: Rgb = (110, 118, 129);
    pub const BULLET: Rgb = (56, 189, 248);
}

fn fg((r, g, b): palette::Rgb) -> String {
    format!("\x1b[38;2;{r};{g};{b}m")
}

/// Render a Markdown body for a 79-column terminal.
pub fn render_markdown(body: &str) -> String {
    render_markdown_width(body, TERMINAL_WIDTH)
}

/// Render a Markdown body word-wrapped to `width` columns.
pub fn render_markdown_width(body: &str, width: usize) -> String {
    let mut writer = AnsiWriter::new(width);
    let parser = Parser::new_ext(body, Options::ENABLE_STRIKETHROUGH);
    for event in parser {
        writer.event(event);
    }
    writer.finish()
}

/// Convert an on-disk raster image to ANSI block art.
pub fn image_to_ansi(path: &Path, width: u32) -> Result<String, AnsiError> {
    let img = image::open(path)
        .map_err(|e| AnsiError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .to_rgb8();
    Ok(image_to_ansi_art(&img, width))
}

/// Pure pixel-to-escape conversion: one line per pixel row, one
/// truecolor-prefixed `█` per pixel, reset at the end of every line.
pub fn image_to_ansi_art(img: &RgbImage, width: u32) -> String {
    let aspect = img.height() as f64 / img.width() as f64;
    let height = ((width as f64 * aspect * ASPECT_CORRECTION).round() as u32).max(1);
    let resized = image::imageops::resize(img, width, height, FilterType::Lanczos3);

    let mut lines = Vec::with_capacity(height as usize);
    for row in resized.rows() {
        let mut line = String::new();
        for pixel in row {
            let [r, g, b] = pixel.0;
            write!(line, "\x1b[38;2;{r};{g};{b}m█").unwrap();
        }
        line.push_str(RESET);
        lines.push(line);
    }
    lines.join("\n")
}

/// Active inline style, rebuilt into an escape prefix per styled span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Style {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    color: Option<palette::Rgb>,
}

impl Style {
    fn prefix(&self) -> String {
        let mut p = String::new();
        if self.bold {
            p.push_str(BOLD);
        }
        if self.italic {
            p.push_str(ITALIC);
        }
        if self.underline {
            p.push_str(UNDERLINE);
        }
        if self.strike {
            p.push_str(STRIKE);
        }
        if let Some(rgb) = self.color {
            p.push_str(&fg(rgb));
        }
        p
    }

    fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// Word-wrapping event emitter.
///
/// Words accumulate escape sequences freely; wrapping decisions use only
/// the visible character count.
struct AnsiWriter {
    width: usize,
    out: String,
    line: String,
    line_visible: usize,
    word: String,
    word_visible: usize,
    /// Whether the next committed word needs a separating space.
    needs_space: bool,
    style: Style,
    /// Visible prefix applied at the start of every wrapped line
    /// (blockquote bars, list indents).
    line_prefix: String,
    prefix_visible: usize,
    quote_depth: usize,
    /// One entry per open list: `Some(counter)` for ordered lists.
    list_stack: Vec<Option<u64>>,
    /// Fenced code block being captured: `(language, text)`.
    code_block: Option<(Option<String>, String)>,
    /// Alt text capture for images.
    image_alt: Option<String>,
}

impl AnsiWriter {
    fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            out: String::new(),
            line: String::new(),
            line_visible: 0,
            word: String::new(),
            word_visible: 0,
            needs_space: false,
            style: Style::default(),
            line_prefix: String::new(),
            prefix_visible: 0,
            quote_depth: 0,
            list_stack: Vec::new(),
            code_block: None,
            image_alt: None,
        }
    }

    fn finish(mut self) -> String {
        self.commit_word();
        self.flush_line();
        // Collapse the trailing blank line left by the last block.
        while self.out.ends_with('\n') {
            self.out.pop();
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::SoftBreak => self.commit_word(),
            Event::HardBreak => {
                self.commit_word();
                self.flush_line();
            }
            Event::Rule => {
                self.break_block();
                let rule = format!("{}{}{RESET}", fg(palette::DIM), "─".repeat(self.width));
                self.out.push_str(&rule);
                self.out.push('\n');
                self.blank_line();
            }
            // Raw HTML has no terminal rendition.
            Event::Html(_) | Event::InlineHtml(_) => {}
            Event::TaskListMarker(_)
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_) => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.break_block();
                self.style.bold = true;
                if heading_number(level) <= 2 {
                    self.style.color = Some(palette::HEADING);
                }
            }
            Tag::BlockQuote(_) => {
                self.break_block();
                self.quote_depth += 1;
                self.style.italic = true;
                self.style.color = Some(palette::QUOTE);
                self.rebuild_prefix();
            }
            Tag::CodeBlock(kind) => {
                self.break_block();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        info.split_whitespace().next().map(str::to_string)
                    }
                    _ => None,
                };
                self.code_block = Some((lang, String::new()));
            }
            Tag::List(start) => {
                self.break_block();
                self.list_stack.push(start);
                self.rebuild_prefix();
            }
            Tag::Item => {
                self.commit_word();
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(Some(counter)) => {
                        let m = format!("{counter}. ");
                        *counter += 1;
                        m
                    }
                    _ => "• ".to_string(),
                };
                let styled = format!("{}{marker}{RESET}", fg(palette::BULLET));
                let visible = marker.chars().count();
                let prefix = self.line_prefix.clone();
                self.line.push_str(&prefix);
                self.line_visible += self.prefix_visible;
                self.line.push_str(&styled);
                self.line_visible += visible;
                self.needs_space = false;
            }
            Tag::Emphasis => self.style.italic = true,
            Tag::Strong => self.style.bold = true,
            Tag::Strikethrough => self.style.strike = true,
            Tag::Link { .. } => {
                self.style.underline = true;
                self.style.color = Some(palette::LINK);
            }
            Tag::Image { .. } => {
                self.image_alt = Some(String::new());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.commit_word();
                self.flush_line();
                self.blank_line();
            }
            TagEnd::Heading(level) => {
                self.commit_word();
                self.flush_line();
                if heading_number(level) == 1 {
                    let bar = format!(
                        "{}{}{RESET}",
                        fg(palette::HEADING),
                        "━".repeat(self.width)
                    );
                    self.out.push_str(&bar);
                    self.out.push('\n');
                }
                self.blank_line();
                self.style = Style::default();
            }
            TagEnd::BlockQuote(_) => {
                self.commit_word();
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.style = Style::default();
                self.rebuild_prefix();
                self.blank_line();
            }
            TagEnd::CodeBlock => {
                if let Some((lang, code)) = self.code_block.take() {
                    self.emit_code_block(lang.as_deref(), &code);
                }
                self.blank_line();
            }
            TagEnd::List(_) => {
                self.commit_word();
                self.flush_line();
                self.list_stack.pop();
                self.rebuild_prefix();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            TagEnd::Item => {
                self.commit_word();
                self.flush_line();
            }
            TagEnd::Emphasis => self.style.italic = false,
            TagEnd::Strong => self.style.bold = false,
            TagEnd::Strikethrough => self.style.strike = false,
            TagEnd::Link => {
                self.style.underline = false;
                self.style.color = None;
            }
            TagEnd::Image => {
                let alt = self.image_alt.take().unwrap_or_default();
                let label = format!("[image: {alt}]");
                let saved = self.style;
                self.style = Style {
                    color: Some(palette::DIM),
                    ..Style::default()
                };
                self.text(&label);
                self.commit_word();
                self.style = saved;
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some((_, code)) = self.code_block.as_mut() {
            code.push_str(text);
            return;
        }
        if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(text);
            return;
        }
        for c in text.chars() {
            if c.is_whitespace() {
                self.commit_word();
            } else {
                self.push_styled_char(c);
            }
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(alt) = self.image_alt.as_mut() {
            alt.push_str(code);
            return;
        }
        let saved = self.style;
        self.style = Style {
            color: Some(palette::CODE),
            ..saved
        };
        // Inline code keeps its internal spacing; treat it as one word.
        for c in code.chars() {
            self.push_styled_char(c);
        }
        self.style = saved;
    }

    fn push_styled_char(&mut self, c: char) {
        if self.word.is_empty() && !self.style.is_plain() {
            let prefix = self.style.prefix();
            self.word.push_str(&prefix);
        }
        self.word.push(c);
        self.word_visible += 1;
    }

    /// Move the pending word onto the current line, wrapping when needed.
    fn commit_word(&mut self) {
        if self.word.is_empty() {
            return;
        }
        if self.word.contains('\x1b') {
            self.word.push_str(RESET);
        }
        let sep = usize::from(self.needs_space);
        if self.line_visible + sep + self.word_visible > self.width && self.line_visible > 0 {
            self.flush_line();
        }
        if self.line.is_empty() {
            let prefix = self.line_prefix.clone();
            self.line.push_str(&prefix);
            self.line_visible += self.prefix_visible;
        } else if self.needs_space {
            self.line.push(' ');
            self.line_visible += 1;
        }
        let word = std::mem::take(&mut self.word);
        self.line.push_str(&word);
        self.line_visible += self.word_visible;
        self.word_visible = 0;
        self.needs_space = true;
    }

    fn flush_line(&mut self) {
        if self.line.is_empty() {
            self.line_visible = 0;
            return;
        }
        let line = std::mem::take(&mut self.line);
        self.out.push_str(&line);
        self.out.push('\n');
        self.line_visible = 0;
    }

    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// Flush any in-flight inline content before a new block opens.
    fn break_block(&mut self) {
        self.commit_word();
        self.flush_line();
    }

    fn rebuild_prefix(&mut self) {
        let mut prefix = String::new();
        let mut visible = 0;
        for _ in 0..self.quote_depth {
            prefix.push_str(&format!("{}▎ {RESET}", fg(palette::QUOTE)));
            visible += 2;
        }
        // Nested lists indent two spaces per enclosing level.
        let depth = self.list_stack.len().saturating_sub(1);
        for _ in 0..depth {
            prefix.push_str("  ");
            visible += 2;
        }
        self.line_prefix = prefix;
        self.prefix_visible = visible;
    }

    fn emit_code_block(&mut self, lang: Option<&str>, code: &str) {
        if let Some(lang) = lang {
            let label = format!("{}── {lang}{RESET}", fg(palette::DIM));
            self.out.push_str(&label);
            self.out.push('\n');
        }
        let color = fg(palette::CODE);
        for line in code.lines() {
            write!(self.out, "  {color}{line}{RESET}").unwrap();
            self.out.push('\n');
        }
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
