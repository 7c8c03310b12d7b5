//! Markdown document parser and renderer.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

use crate::frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError};

/// A parsed markdown document.
#[derive(Debug, Clone)]
pub struct ParsedDoc {
    /// Parsed frontmatter (if present)
    pub frontmatter: Option<Frontmatter>,

    /// Markdown content (without frontmatter)
    pub content: String,
}

/// Errors that can occur when parsing a document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

/// Parse a markdown document into frontmatter and body.
pub fn parse_document(source: &str) -> Result<ParsedDoc, ParseError> {
    let (frontmatter, content) = extract_frontmatter(source)?;

    Ok(ParsedDoc {
        frontmatter,
        content: content.to_string(),
    })
}

/// Slug used when text contains nothing sluggable.
const EMPTY_SLUG: &str = "untitled";

/// Convert text to a lowercase, hyphen-separated ASCII slug.
///
/// Diacritics are transliterated, whitespace, `-` and `_` become separators,
/// and other punctuation is dropped. Slugging a slug returns it unchanged.
pub fn slugify(text: &str) -> String {
    let ascii = deunicode::deunicode(text).to_lowercase();

    let mut out = String::with_capacity(ascii.len());
    let mut separator = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if separator && !out.is_empty() {
                out.push('-');
            }
            separator = false;
            out.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            separator = true;
        }
    }

    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Render a markdown body to HTML.
///
/// Uses commonmark with the GFM extensions. Soft line breaks are emitted as
/// hard breaks, so a single newline in the source becomes `<br />`.
/// Headings get an `id` slugged from their text.
pub fn render_markdown(content: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let mut events: Vec<Event> = Parser::new_ext(content, options)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        })
        .collect();

    let mut heading_ids = Vec::new();
    let mut current_heading: Option<(usize, String)> = None;

    for (index, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                current_heading = Some((index, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut heading_text)) = current_heading {
                    heading_text.push_str(text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((start, title)) = current_heading.take() {
                    heading_ids.push((start, slugify(&title)));
                }
            }
            _ => {}
        }
    }

    for (start, slug) in heading_ids {
        if let Event::Start(Tag::Heading { id, .. }) = &mut events[start] {
            if id.is_none() {
                *id = Some(CowStr::from(slug));
            }
        }
    }

    let mut html_output = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut html_output, events.into_iter());

    html_output
}
