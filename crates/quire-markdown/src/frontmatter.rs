//! Front-matter extraction and parsing.

use std::collections::btree_map::{self, BTreeMap};

use serde_yaml::Value;

/// Key that selects the template a document is rendered with.
pub const TEMPLATE_KEY: &str = "template";

/// Flat string metadata parsed from a document's front-matter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    fields: BTreeMap<String, String>,
}

impl Frontmatter {
    /// Look up a field by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Template name declared by the document, if any.
    pub fn template(&self) -> Option<&str> {
        self.get(TEMPLATE_KEY).filter(|name| !name.trim().is_empty())
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a Frontmatter {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Extract front-matter from a Markdown document.
///
/// Returns the parsed metadata and the remaining body after the closing fence.
/// Both fences are lines holding exactly `---`. A fenced block whose YAML is
/// not a mapping (a thematic break followed by prose, say) is not front-matter
/// and the document is returned untouched.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    let first_line = trimmed.lines().next().unwrap_or_default();
    if first_line.trim_end() != FENCE {
        return Ok((None, source));
    }

    let after_open = &trimmed[first_line.len()..];
    let Some((close_start, close_end)) = find_closing_fence(after_open) else {
        // Only a block that reads as metadata is an unclosed front-matter
        return match serde_yaml::from_str::<Value>(after_open) {
            Ok(Value::Mapping(_)) => Err(FrontmatterError::Unclosed),
            Err(_) if looks_like_mapping(after_open) => Err(FrontmatterError::Unclosed),
            _ => Ok((None, source)),
        };
    };

    let yaml_content = after_open[..close_start].trim();
    let remaining = &after_open[close_end..];

    match parse_fields(yaml_content)? {
        Some(frontmatter) => Ok((Some(frontmatter), remaining.trim_start())),
        None => Ok((None, source)),
    }
}

const FENCE: &str = "---";

/// Byte range of the first line after the opening fence that is exactly `---`.
fn find_closing_fence(after_open: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    for (index, line) in after_open.split_inclusive('\n').enumerate() {
        // Index 0 is the tail of the opening fence line
        if index > 0 && line.trim_end() == FENCE {
            return Some((offset, offset + line.len()));
        }
        offset += line.len();
    }
    None
}

/// Parse the fenced block. `None` means the block is not a mapping.
fn parse_fields(yaml: &str) -> Result<Option<Frontmatter>, FrontmatterError> {
    if yaml.is_empty() {
        return Ok(Some(Frontmatter::default()));
    }

    let value: Value = match serde_yaml::from_str(yaml) {
        Ok(value) => value,
        // A line of prose containing `: ` still looks like YAML to the parser,
        // so only blocks that start like a mapping report their syntax errors
        Err(e) if looks_like_mapping(yaml) => {
            return Err(FrontmatterError::InvalidYaml(e.to_string()))
        }
        Err(_) => return Ok(None),
    };

    let mapping = match value {
        Value::Null => return Ok(Some(Frontmatter::default())),
        Value::Mapping(mapping) => mapping,
        _ => return Ok(None),
    };

    let mut frontmatter = Frontmatter::default();
    for (key, value) in mapping {
        let key = scalar_to_string(&key).ok_or(FrontmatterError::NotAMapping)?;
        let value =
            scalar_to_string(&value).ok_or_else(|| FrontmatterError::NestedValue(key.clone()))?;
        frontmatter.insert(key, value);
    }

    Ok(Some(frontmatter))
}

/// Whether the first meaningful line of a block reads as a `key:` entry.
fn looks_like_mapping(yaml: &str) -> bool {
    yaml.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .and_then(|line| line.split_once(':'))
        .is_some_and(|(key, rest)| {
            !key.is_empty()
                && !key.contains(char::is_whitespace)
                && (rest.is_empty() || rest.starts_with(' '))
        })
}

/// Render a YAML scalar as text. Sequences and mappings have no flat form.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Errors that can occur when parsing front-matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed front-matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front-matter: {0}")]
    InvalidYaml(String),

    #[error("Front-matter must be a mapping of scalar keys")]
    NotAMapping,

    #[error("Front-matter field '{0}' must be a string, number or boolean")]
    NestedValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_valid_frontmatter() {
        let source = r#"---
title: Hello
description: A first post
template: post
---

# Hello World
"#;

        let (fm, content) = extract_frontmatter(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.get("title"), Some("Hello"));
        assert_eq!(fm.get("description"), Some("A first post"));
        assert_eq!(fm.template(), Some("post"));
        assert_eq!(fm.len(), 3);
        assert!(content.starts_with("# Hello World"));
    }

    #[test]
    fn handles_no_frontmatter() {
        let source = "# Just Markdown\n\nNo front-matter here.";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn handles_empty_block() {
        let (fm, content) = extract_frontmatter("---\n---\nBody").unwrap();

        assert!(fm.unwrap().is_empty());
        assert_eq!(content, "Body");
    }

    #[test]
    fn stringifies_scalars() {
        let source = "---\norder: 3\ndraft: false\nratio: 1.5\nempty:\n---\n";

        let (fm, _) = extract_frontmatter(source).unwrap();
        let fm = fm.unwrap();

        assert_eq!(fm.get("order"), Some("3"));
        assert_eq!(fm.get("draft"), Some("false"));
        assert_eq!(fm.get("ratio"), Some("1.5"));
        assert_eq!(fm.get("empty"), Some(""));
    }

    #[test]
    fn blank_template_is_ignored() {
        let (fm, _) = extract_frontmatter("---\ntemplate: ''\n---\n").unwrap();

        assert_eq!(fm.unwrap().template(), None);
    }

    #[test]
    fn errors_on_unclosed_frontmatter() {
        let source = "---\ntitle: Test\n# No closing";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::Unclosed)));
    }

    #[test]
    fn errors_on_invalid_yaml() {
        let source = "---\ntitle: [invalid yaml\n---\n";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::InvalidYaml(_))));
    }

    #[test]
    fn errors_on_nested_values() {
        let source = "---\ntags:\n  - rust\n  - web\n---\n";

        let result = extract_frontmatter(source);

        assert!(matches!(result, Err(FrontmatterError::NestedValue(key)) if key == "tags"));
    }

    #[test]
    fn non_mapping_block_is_body_text() {
        let source = "---\n- one\n- two\n---\n";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn thematic_breaks_are_not_frontmatter() {
        let source = "---\n\nIntro paragraph.\n\n---\n\nMore text.\n";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn unclosed_thematic_break_is_body_text() {
        let source = "---\n\nJust a rule on top.\n";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn fences_must_be_exact_lines() {
        let source = "----\ntitle: Hello\n----\nBody";

        let (fm, content) = extract_frontmatter(source).unwrap();

        assert!(fm.is_none());
        assert_eq!(content, source);
    }

    #[test]
    fn accepts_trailing_whitespace_and_crlf_on_fences() {
        let (fm, content) = extract_frontmatter("--- \r\ntitle: Hi\r\n---\r\nBody").unwrap();

        assert_eq!(fm.unwrap().get("title"), Some("Hi"));
        assert_eq!(content, "Body");
    }

    #[test]
    fn errors_on_non_scalar_keys() {
        let result = extract_frontmatter("---\n? [a, b]\n: value\n---\n");

        assert!(matches!(result, Err(FrontmatterError::NotAMapping)));
    }
}
