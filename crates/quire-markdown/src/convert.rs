//! Markdown to HTML conversion.

use std::collections::HashMap;

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// Markdown extensions enabled during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    pub tables: bool,
    pub footnotes: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    /// Give headings without an explicit id a slug anchor. Explicit `{#id}`
    /// attributes are always honoured.
    pub heading_ids: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            tasklists: true,
            heading_ids: true,
        }
    }
}

impl ConvertOptions {
    fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.tasklists);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options
    }
}

/// A converted document.
#[derive(Debug, Clone)]
pub struct Converted {
    /// HTML fragment for the document body
    pub html: String,

    /// Parsed front-matter (if present)
    pub frontmatter: Option<Frontmatter>,
}

/// Errors that can occur when converting a document.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Front-matter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Markdown converter.
///
/// Holds only configuration, so one instance serves a whole build.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Convert a Markdown document to HTML, splitting off its front-matter.
    pub fn convert(&self, source: &str) -> Result<Converted, ConvertError> {
        let (frontmatter, body) = extract_frontmatter(source)?;

        let mut events: Vec<Event<'_>> =
            Parser::new_ext(body, self.options.parser_options()).collect();

        if self.options.heading_ids {
            assign_heading_ids(&mut events);
        }

        let mut html_output = String::with_capacity(body.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());

        Ok(Converted {
            html: html_output,
            frontmatter,
        })
    }
}

/// Fill in slug ids for headings that have none, keeping them unique.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut seen: HashMap<String, usize> = HashMap::new();

    // Explicit `{#id}` anchors are reserved first
    for event in events.iter() {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            seen.insert(id.to_string(), 0);
        }
    }

    let mut i = 0;
    while i < events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            i += 1;
            continue;
        }

        let mut text = String::new();
        let mut end = i + 1;
        while end < events.len() {
            match &events[end] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            end += 1;
        }

        let slug = unique_slug(&slugify(&text), &mut seen);
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            *id = Some(CowStr::from(slug));
        }

        i = end + 1;
    }
}

fn unique_slug(base: &str, seen: &mut HashMap<String, usize>) -> String {
    let base = if base.is_empty() { "section" } else { base };

    let Some(&last) = seen.get(base) else {
        seen.insert(base.to_string(), 0);
        return base.to_string();
    };

    let mut count = last;
    loop {
        count += 1;
        let candidate = format!("{}-{}", base, count);
        if !seen.contains_key(&candidate) {
            seen.insert(base.to_string(), count);
            seen.insert(candidate.clone(), 0);
            return candidate;
        }
    }
}

/// Convert a heading to a URL-safe slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|c| *c != '\0')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
