//! Shared test fixtures for the inkpost test suite.
//!
//! Every fixture builds an isolated temp tree, so tests can mutate files
//! freely. The layout mirrors a real deployment:
//!
//! ```text
//! <tmp>/content/   author/, posts/, projects/, homepage.md, meta.md
//! <tmp>/static/    images/headers/, images/thumbnails/, staged images
//! <tmp>/ansi/      images/headers/ (pre-rendered .ansi art)
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::SitePaths;
use crate::context::{self, ContentContext};
use crate::cover;

/// Number of covers in fixture pools.
pub const POOL_SIZE: usize = 5;

/// Write a tiny valid PNG so the `image` crate can decode it.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
    img.save(path).unwrap();
}

/// Empty site layout: the three roots exist, nothing else.
pub fn site_fixture() -> (TempDir, SitePaths) {
    let tmp = TempDir::new().unwrap();
    let paths = SitePaths {
        content_root: tmp.path().join("content"),
        static_root: tmp.path().join("static"),
        ansi_root: tmp.path().join("ansi"),
    };
    fs::create_dir_all(&paths.content_root).unwrap();
    fs::create_dir_all(&paths.static_root).unwrap();
    fs::create_dir_all(&paths.ansi_root).unwrap();
    (tmp, paths)
}

/// A flat `.md` content item under `posts/`, resolved into a context.
pub fn flat_context() -> (TempDir, SitePaths, ContentContext) {
    let (tmp, paths) = site_fixture();
    let dir = paths.posts_dir();
    fs::create_dir_all(&dir).unwrap();
    let file = dir.join("note.md");
    fs::write(&file, "body").unwrap();
    let ctx = context::resolve(&file).unwrap();
    (tmp, paths, ctx)
}

/// A directory content item with an `images/` folder holding `files`.
pub fn item_with_images(
    content_type: &str,
    item: &str,
    files: &[&str],
) -> (TempDir, SitePaths, ContentContext) {
    let (tmp, paths) = site_fixture();
    let dir = paths.content_root.join(content_type).join(item);
    fs::create_dir_all(dir.join("images")).unwrap();
    fs::write(dir.join("index.md"), "body").unwrap();
    for file in files {
        write_png(&dir.join("images").join(file), 2, 2);
    }
    let ctx = context::resolve(&dir).unwrap();
    (tmp, paths, ctx)
}

/// A complete, loadable content tree with cover pools and ANSI headers.
///
/// Contents: two posts (`first_post.md` flat, `trip/` with images), one
/// project, author with picture, homepage, metadata. Cover pools hold
/// [`POOL_SIZE`] PNGs; each has a matching `cover_NNN.ansi` whose text is
/// `ANSI ART NNN`.
pub fn content_tree() -> (TempDir, SitePaths) {
    let (tmp, paths) = site_fixture();

    let headers = paths.headers_dir();
    let thumbnails = paths.thumbnails_dir();
    let ansi_headers = paths.ansi_headers_dir();
    fs::create_dir_all(&headers).unwrap();
    fs::create_dir_all(&thumbnails).unwrap();
    fs::create_dir_all(&ansi_headers).unwrap();
    for i in 1..=POOL_SIZE {
        write_png(&headers.join(cover::cover_filename(i)), 4, 4);
        write_png(&thumbnails.join(cover::cover_filename(i)), 2, 2);
        fs::write(
            ansi_headers.join(cover::cover_ansi_filename(i)),
            format!("ANSI ART {:03}", i),
        )
        .unwrap();
    }

    fs::write(
        paths.meta_file(),
        "---\n\
         description: A personal site\n\
         keywords:\n  - rust\n  - blog\n\
         author: Jane Doe\n\
         language:\n  - en\n\
         robots:\n  - index\n  - follow\n\
         og:title: Notes from Jane\n\
         og:description: Posts and projects\n\
         og:url: https://example.com\n\
         og:type: website\n\
         og:locale: en_US\n\
         twitter:card: summary\n\
         twitter:title: Notes from Jane\n\
         twitter:description: Posts and projects\n\
         twitter:creator: \"@jane\"\n\
         ---\n\
         Site metadata.\n",
    )
    .unwrap();

    fs::write(
        paths.homepage_file(),
        "---\n\
         posts_section_description: Things I wrote\n\
         projects_section_description: Things I built\n\
         ---\n",
    )
    .unwrap();

    let author = paths.author_dir();
    fs::create_dir_all(&author).unwrap();
    write_png(&author.join("me.png"), 2, 2);
    fs::write(
        author.join("index.md"),
        "---\n\
         picture: me.png\n\
         full_name: Jane Doe\n\
         role: Engineer\n\
         about: Writes code.\n\
         github_url: https://github.com/jane\n\
         ---\n\
         Longer bio text.\n",
    )
    .unwrap();

    let posts = paths.posts_dir();
    fs::create_dir_all(&posts).unwrap();
    fs::write(
        posts.join("first_post.md"),
        "---\n\
         title: Hello\n\
         topic: rust\n\
         ---\n\
         A short first note about nothing in particular.\n",
    )
    .unwrap();
    let trip = posts.join("trip");
    fs::create_dir_all(trip.join("images")).unwrap();
    write_png(&trip.join("images/photo.png"), 2, 2);
    fs::write(
        trip.join("index.md"),
        "---\n\
         title: Trip notes\n\
         slug: trip-notes\n\
         date: 01.02.2024\n\
         ---\n\
         Some notes with a *picture*.\n\n\
         ![shot](photo.png)\n",
    )
    .unwrap();

    let projects = paths.projects_dir();
    fs::create_dir_all(&projects).unwrap();
    fs::write(
        projects.join("tool.md"),
        "---\n\
         title: Tool\n\
         repository: https://github.com/jane/tool\n\
         website: https://tool.example.com\n\
         ---\n\
         A tool that does one thing.\n",
    )
    .unwrap();

    (tmp, paths)
}
