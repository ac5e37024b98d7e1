//! Batch conversion of static images to modern encodings and ANSI art.
//!
//! Discovery walks the images root for PNG/JPEG sources. Conversion runs in
//! two strictly ordered passes — every WebP before any AVIF — each fanned
//! out over the rayon pool with an all-or-nothing join: the first failed
//! task aborts the whole pass. Outputs already on disk are skipped unless
//! forced, so re-runs only pay for new sources.
//!
//! Every written encoding is size-guarded: an output that is not strictly
//! smaller than its source is deleted again and counted as rejected. The
//! `<picture>` fallback chain always has the original, so a rejected
//! alternate costs nothing.

use image::codecs::avif::AvifEncoder;
use image::codecs::webp::WebPEncoder;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::ansi::{self, AnsiError, TERMINAL_WIDTH};

/// rav1e effort preset; 4 trades encode time for density.
const AVIF_SPEED: u8 = 4;
const AVIF_QUALITY: u8 = 90;

/// Source extensions picked up by discovery.
const INPUT_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg"];

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Failed to encode {path}: {message}")]
    Encode { path: PathBuf, message: String },
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
    #[error(transparent)]
    Ansi(#[from] AnsiError),
}

/// What happened to a single output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Written,
    /// Output already existed and `force` was off.
    Skipped,
    /// Written but not smaller than the source, deleted again.
    Rejected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertStats {
    pub written: usize,
    pub skipped: usize,
    pub rejected: usize,
}

impl ConvertStats {
    fn tally(outcomes: &[Outcome]) -> Self {
        let mut stats = Self::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Written => stats.written += 1,
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Rejected => stats.rejected += 1,
            }
        }
        stats
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            written: self.written + other.written,
            skipped: self.skipped + other.skipped,
            rejected: self.rejected + other.rejected,
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.skipped + self.rejected
    }
}

/// All PNG/JPEG sources under `root`, sorted for deterministic reporting.
pub fn discover_images(root: &Path) -> Result<Vec<PathBuf>, ConvertError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                INPUT_EXTENSIONS
                    .iter()
                    .any(|known| e.eq_ignore_ascii_case(known))
            });
        if matches {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> ConvertError + '_ {
    move |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn decode_input(path: &Path) -> Result<image::DynamicImage, ConvertError> {
    image::open(path).map_err(|e| ConvertError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Delete an output that did not beat its source on size.
fn apply_size_guard(input: &Path, output: &Path) -> Result<Outcome, ConvertError> {
    let input_len = fs::metadata(input).map_err(io_err(input))?.len();
    let output_len = fs::metadata(output).map_err(io_err(output))?.len();
    if output_len >= input_len {
        fs::remove_file(output).map_err(io_err(output))?;
        return Ok(Outcome::Rejected);
    }
    Ok(Outcome::Written)
}

/// Encode a source as lossless WebP next to it.
pub fn convert_to_webp(input: &Path, output: &Path, force: bool) -> Result<Outcome, ConvertError> {
    if !force && output.exists() {
        return Ok(Outcome::Skipped);
    }
    let img = image::DynamicImage::ImageRgba8(decode_input(input)?.to_rgba8());
    {
        let writer = BufWriter::new(File::create(output).map_err(io_err(output))?);
        let encoder = WebPEncoder::new_lossless(writer);
        img.write_with_encoder(encoder)
            .map_err(|e| ConvertError::Encode {
                path: output.to_path_buf(),
                message: e.to_string(),
            })?;
    }
    apply_size_guard(input, output)
}

/// Encode a source as AVIF next to it.
pub fn convert_to_avif(input: &Path, output: &Path, force: bool) -> Result<Outcome, ConvertError> {
    if !force && output.exists() {
        return Ok(Outcome::Skipped);
    }
    let img = image::DynamicImage::ImageRgba8(decode_input(input)?.to_rgba8());
    {
        let writer = BufWriter::new(File::create(output).map_err(io_err(output))?);
        let encoder = AvifEncoder::new_with_speed_quality(writer, AVIF_SPEED, AVIF_QUALITY);
        img.write_with_encoder(encoder)
            .map_err(|e| ConvertError::Encode {
                path: output.to_path_buf(),
                message: e.to_string(),
            })?;
    }
    apply_size_guard(input, output)
}

/// Convert every source under `images_root` to WebP, then to AVIF.
///
/// The WebP batch joins completely before the AVIF batch starts. Within a
/// batch, tasks are independent; the first error wins the join and no
/// bookkeeping is kept for outputs already written.
pub fn convert_all(images_root: &Path, force: bool) -> Result<ConvertStats, ConvertError> {
    let inputs = discover_images(images_root)?;
    let webp = run_pass(&inputs, "webp", force, convert_to_webp)?;
    let avif = run_pass(&inputs, "avif", force, convert_to_avif)?;
    Ok(webp.merge(avif))
}

fn run_pass(
    inputs: &[PathBuf],
    extension: &str,
    force: bool,
    convert: fn(&Path, &Path, bool) -> Result<Outcome, ConvertError>,
) -> Result<ConvertStats, ConvertError> {
    let outcomes: Vec<Outcome> = inputs
        .par_iter()
        .map(|input| convert(input, &input.with_extension(extension), force))
        .collect::<Result<_, _>>()?;
    Ok(ConvertStats::tally(&outcomes))
}

/// Pre-render every header cover as a `.ansi` art file.
///
/// Headers are a small fixed pool, so rendering at build time beats
/// rendering per request.
pub fn render_ansi_headers(
    headers_dir: &Path,
    ansi_headers_dir: &Path,
    force: bool,
) -> Result<ConvertStats, ConvertError> {
    let inputs = discover_images(headers_dir)?;
    fs::create_dir_all(ansi_headers_dir).map_err(io_err(ansi_headers_dir))?;
    let outcomes: Vec<Outcome> = inputs
        .par_iter()
        .map(|input| {
            let mut output = ansi_headers_dir.join(input.file_name().unwrap_or_default());
            output.set_extension("ansi");
            render_ansi_header(input, &output, force)
        })
        .collect::<Result<_, _>>()?;
    Ok(ConvertStats::tally(&outcomes))
}

fn render_ansi_header(input: &Path, output: &Path, force: bool) -> Result<Outcome, ConvertError> {
    if !force && output.exists() {
        return Ok(Outcome::Skipped);
    }
    let art = ansi::image_to_ansi(input, TERMINAL_WIDTH as u32)?;
    fs::write(output, art).map_err(io_err(output))?;
    Ok(Outcome::Written)
}
