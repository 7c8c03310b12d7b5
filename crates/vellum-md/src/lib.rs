//! Markdown documents with YAML front-matter.
//!
//! This crate splits a source document into its front-matter block and body,
//! deserializes the front-matter into [`Frontmatter`], and renders markdown
//! bodies to HTML.

pub mod frontmatter;
pub mod parser;

pub use frontmatter::{extract_frontmatter, Frontmatter, FrontmatterError, Keywords};
pub use parser::{parse_document, render_markdown, slugify, ParseError, ParsedDoc};
