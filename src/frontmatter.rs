//! Frontmatter splitting and YAML decoding.
//!
//! Every content file starts with a `---`-delimited YAML metadata block
//! followed by a Markdown body:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//! Body text
//! ```
//!
//! Splitting is strict: a file without both delimiters, or with a metadata
//! block that decodes to nothing, aborts the load of that item. There is no
//! per-item fallback — the caller propagates the error and the whole
//! content-tree build fails.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("No frontmatter delimiters found")]
    MissingDelimiters,
    #[error("Frontmatter block contains no properties")]
    EmptyMetadata,
    #[error("Invalid frontmatter YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// A split but not yet decoded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument<'a> {
    /// Raw YAML between the delimiters, without the `---` lines.
    pub metadata: &'a str,
    /// Everything after the closing delimiter line.
    pub body: &'a str,
}

/// A document with decoded frontmatter.
#[derive(Debug, Clone)]
pub struct Document<T> {
    pub metadata: T,
    pub body: String,
}

/// Split a file into its metadata block and body.
///
/// Accepts optional leading whitespace before the opening `---`. The closing
/// delimiter is the first subsequent line consisting of `---` (trailing
/// whitespace allowed); the body is everything after it, taken greedily.
pub fn split(text: &str) -> Result<RawDocument<'_>, FrontmatterError> {
    let text = text.trim_start();
    let after_open = strip_delimiter_line(text).ok_or(FrontmatterError::MissingDelimiters)?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if is_delimiter_line(line) {
            let metadata = after_open[..offset].trim_end_matches(['\n', '\r']);
            let body = &after_open[offset + line.len()..];
            return Ok(RawDocument { metadata, body });
        }
        offset += line.len();
    }
    Err(FrontmatterError::MissingDelimiters)
}

/// Split and decode the metadata block into `T`.
///
/// A block that decodes to YAML null or an empty mapping is rejected before
/// the typed decode, so schema errors never mask an empty file.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<Document<T>, FrontmatterError> {
    let raw = split(text)?;
    let value: serde_yaml::Value = serde_yaml::from_str(raw.metadata)?;
    match &value {
        serde_yaml::Value::Null => return Err(FrontmatterError::EmptyMetadata),
        serde_yaml::Value::Mapping(m) if m.is_empty() => {
            return Err(FrontmatterError::EmptyMetadata);
        }
        _ => {}
    }
    let metadata: T = serde_yaml::from_value(value)?;
    Ok(Document {
        metadata,
        body: raw.body.to_string(),
    })
}

/// Strip an opening `---` line, returning the remainder after its newline.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("---")?;
    let newline = rest.find('\n')?;
    if !rest[..newline].trim().is_empty() {
        return None;
    }
    Some(&rest[newline + 1..])
}

fn is_delimiter_line(line: &str) -> bool {
    line.trim_end() == "---"
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Meta {
        title: String,
    }

    #[test]
    fn splits_metadata_and_body() {
        let doc = split("---\ntitle: Hi\n---\nBody text").unwrap();
        assert_eq!(doc.metadata, "title: Hi");
        assert_eq!(doc.body, "Body text");
    }

    #[test]
    fn leading_whitespace_is_tolerated() {
        let doc = split("\n\n  ---\ntitle: Hi\n---\nBody").unwrap();
        assert_eq!(doc.metadata, "title: Hi");
    }

    #[test]
    fn trailing_spaces_on_delimiters_are_tolerated() {
        let doc = split("---  \ntitle: Hi\n---   \nBody").unwrap();
        assert_eq!(doc.metadata, "title: Hi");
        assert_eq!(doc.body, "Body");
    }

    #[test]
    fn body_is_taken_greedily_past_later_delimiters() {
        let doc = split("---\ntitle: Hi\n---\nfirst\n---\nsecond").unwrap();
        assert_eq!(doc.body, "first\n---\nsecond");
    }

    #[test]
    fn missing_opening_delimiter_fails() {
        assert!(matches!(
            split("title: Hi\n---\nBody"),
            Err(FrontmatterError::MissingDelimiters)
        ));
    }

    #[test]
    fn missing_closing_delimiter_fails() {
        assert!(matches!(
            split("---\ntitle: Hi\nBody"),
            Err(FrontmatterError::MissingDelimiters)
        ));
    }

    #[test]
    fn parse_decodes_typed_metadata() {
        let doc: Document<Meta> = parse("---\ntitle: Hi\n---\nBody text").unwrap();
        assert_eq!(doc.metadata, Meta { title: "Hi".into() });
        assert_eq!(doc.body, "Body text");
    }

    #[test]
    fn empty_metadata_block_is_rejected() {
        let err = parse::<serde_yaml::Value>("---\n\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontmatterError::EmptyMetadata));
    }

    #[test]
    fn comment_only_metadata_is_rejected() {
        let err = parse::<serde_yaml::Value>("---\n# nothing here\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontmatterError::EmptyMetadata));
    }

    #[test]
    fn schema_mismatch_surfaces_yaml_error() {
        let err = parse::<Meta>("---\nauthor: someone\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontmatterError::Yaml(_)));
    }

    #[test]
    fn multiline_body_preserved_verbatim() {
        let doc = split("---\na: 1\n---\nline one\n\nline two\n").unwrap();
        assert_eq!(doc.body, "line one\n\nline two\n");
    }
}
