use clap::{Parser, Subcommand};
use inkpost::config::SitePaths;
use inkpost::content::{AnsiStore, ContentStore};
use inkpost::{convert, output};
use std::path::PathBuf;

/// Shared flag for commands that write converted assets.
#[derive(clap::Args, Clone)]
struct ForceArgs {
    /// Regenerate outputs even when they already exist
    #[arg(long)]
    force: bool,
}

#[derive(Parser)]
#[command(name = "inkpost")]
#[command(about = "Markdown content pipeline with HTML and ANSI delivery")]
#[command(long_about = "\
Markdown content pipeline with HTML and ANSI delivery

Your filesystem is the data source. Posts and projects are Markdown files
with YAML frontmatter; directory items carry sibling images that get staged
into the static tree.

Content structure:

  content/
  ├── meta.md                      # Site metadata (SEO + social cards)
  ├── homepage.md                  # Section descriptions
  ├── author/
  │   ├── index.md                 # Author bio
  │   └── me.png                   # Picture, staged into static/images/author/
  ├── posts/
  │   ├── quick_note.md            # Flat post (slug: quick-note)
  │   └── long_trip/               # Directory post
  │       ├── index.md
  │       └── images/              # Staged to static/images/posts/long_trip/
  └── projects/
      └── my_tool.md

Asset trees (siblings of the content root by default):

  static/images/headers/cover_NNN.png      # Cover pool (+ .webp/.avif)
  static/images/thumbnails/cover_NNN.png
  ansi/images/headers/cover_NNN.ansi       # Pre-rendered terminal art

Covers are assigned deterministically from the title length, so the same
title always gets the same cover.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    content: PathBuf,

    /// Static assets directory (default: `static` next to the content root)
    #[arg(long, global = true)]
    static_dir: Option<PathBuf>,

    /// ANSI assets directory (default: `ansi` next to the content root)
    #[arg(long, global = true)]
    ansi_dir: Option<PathBuf>,

    /// Worker threads for conversion batches (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load and validate the content tree without converting assets
    Check {
        /// Dump the loaded store as JSON instead of the inventory view
        #[arg(long)]
        json: bool,
    },
    /// Convert static images to WebP and AVIF siblings
    Convert(ForceArgs),
    /// Pre-render header covers as ANSI art
    AnsiHeaders(ForceArgs),
    /// Full build: convert assets, render headers, load both stores
    Build(ForceArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_thread_pool(cli.threads);

    let paths = SitePaths::resolve(cli.content, cli.static_dir, cli.ansi_dir)?;

    match cli.command {
        Command::Check { json } => {
            let store = ContentStore::load(&paths)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&store)?);
            } else {
                output::print_check_output(&store);
                println!();
                println!("==> Content is valid");
            }
        }
        Command::Convert(force) => {
            let stats = convert::convert_all(&paths.images_dir(), force.force)?;
            output::print_stats("images", &stats);
        }
        Command::AnsiHeaders(force) => {
            let stats = convert::render_ansi_headers(
                &paths.headers_dir(),
                &paths.ansi_headers_dir(),
                force.force,
            )?;
            output::print_stats("ansi headers", &stats);
        }
        Command::Build(force) => {
            // Assets first: the loaders probe alternate encodings and read
            // pre-rendered headers.
            let image_stats = convert::convert_all(&paths.images_dir(), force.force)?;
            output::print_stats("images", &image_stats);
            let header_stats = convert::render_ansi_headers(
                &paths.headers_dir(),
                &paths.ansi_headers_dir(),
                force.force,
            )?;
            output::print_stats("ansi headers", &header_stats);

            let store = ContentStore::load(&paths)?;
            output::print_check_output(&store);
            let ansi_store = AnsiStore::load(&paths)?;
            println!();
            println!(
                "==> Built {} posts, {} projects ({} terminal entries)",
                store.posts.len(),
                store.projects.len(),
                ansi_store.posts.len() + ansi_store.projects.len()
            );
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool.
///
/// Caps at the number of available cores — the flag can constrain down,
/// not up.
fn init_thread_pool(threads: Option<usize>) {
    let available = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let threads = threads.map_or(available, |t| t.clamp(1, available));
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
