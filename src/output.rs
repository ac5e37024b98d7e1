//! CLI output formatting.
//!
//! Output is information-centric: every entity leads with its identity
//! (index, title, slug) and filesystem or asset paths appear as indented
//! context lines. Each stage has a `format_*` function returning lines for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.
//!
//! ```text
//! Posts
//! 001 Why terminals still matter (why-terminals-still-matter)
//!     Date: 03.06.2025
//!     Reading time: 4 min
//!     Cover: images/headers/cover_002.png
//! ```

use crate::content::ContentStore;
use crate::convert::ConvertStats;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn entry_line(index: usize, title: &str, slug: &str) -> String {
    format!("{} {} ({})", format_index(index), title, slug)
}

/// Format the content inventory shown by `check`.
pub fn format_check_output(store: &ContentStore) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Metadata".to_string());
    lines.push(format!("    Author: {}", store.metadata.author));
    lines.push(format!("    Keywords: {}", store.metadata.keywords));
    lines.push(format!("    Social image: {}", store.metadata.og_image));

    lines.push(String::new());
    lines.push("Author".to_string());
    lines.push(format!(
        "    {} ({})",
        store.author.full_name, store.author.role
    ));
    lines.push(format!("    Picture: {}", store.author.picture.default));

    lines.push(String::new());
    lines.push("Posts".to_string());
    for (i, post) in store.posts.values().enumerate() {
        lines.push(entry_line(i + 1, &post.title, &post.slug));
        lines.push(format!("    Date: {}", post.date));
        lines.push(format!("    Reading time: {}", post.reading_time));
        lines.push(format!("    Cover: {}", post.cover.header.default));
    }

    lines.push(String::new());
    lines.push("Projects".to_string());
    for (i, project) in store.projects.values().enumerate() {
        lines.push(entry_line(i + 1, &project.title, &project.slug));
        lines.push(format!("    Date: {}", project.date));
        if let Some(repository) = &project.repository {
            lines.push(format!("    Repository: {}", repository));
        }
        lines.push(format!("    Cover: {}", project.cover.header.default));
    }

    lines.push(String::new());
    lines.push("Homepage".to_string());
    lines.push(format!(
        "    Posts section: {} entries",
        store.homepage.posts_section.entries
    ));
    lines.push(format!(
        "    Projects section: {} entries",
        store.homepage.projects_section.entries
    ));

    lines
}

/// Print the content inventory to stdout.
pub fn print_check_output(store: &ContentStore) {
    for line in format_check_output(store) {
        println!("{}", line);
    }
}

/// One summary line per conversion pass.
pub fn format_stats_line(label: &str, stats: &ConvertStats) -> String {
    format!(
        "{}: {} written, {} skipped, {} rejected",
        label, stats.written, stats.skipped, stats.rejected
    )
}

/// Print a conversion pass summary to stdout.
pub fn print_stats(label: &str, stats: &ConvertStats) {
    println!("{}", format_stats_line(label, stats));
}
