//! Frontmatter extraction and parsing.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Parsed frontmatter from a markdown document.
///
/// Every field is optional. Keys this struct does not know about are kept in
/// [`Frontmatter::extra`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Frontmatter {
    /// Page title
    #[serde(default)]
    pub title: Option<String>,

    /// Page description for SEO
    #[serde(default)]
    pub description: Option<String>,

    /// SEO keywords, either a list or a single comma-separated string
    #[serde(default)]
    pub keywords: Option<Keywords>,

    #[serde(default)]
    pub author: Option<String>,

    /// Social sharing image, a site path or an absolute URL
    #[serde(default)]
    pub og_image: Option<String>,

    /// Open Graph content type (`article` or `website`)
    #[serde(default, rename = "type")]
    pub page_type: Option<String>,

    #[serde(default)]
    pub published_date: Option<String>,

    #[serde(default)]
    pub last_modified_date: Option<String>,

    /// Section label, defaults to the parent folder name
    #[serde(default)]
    pub section: Option<String>,

    /// Canonical URL override
    #[serde(default)]
    pub canonical: Option<String>,

    /// Template file name inside the template directory
    #[serde(default)]
    pub page_template: Option<String>,

    /// Stylesheet file name inside the css directory
    #[serde(default)]
    pub page_css: Option<String>,

    /// Sitemap change frequency
    #[serde(default)]
    pub changefreq: Option<String>,

    /// Sitemap priority
    #[serde(default)]
    pub priority: Option<f32>,

    /// Site name (root index only)
    #[serde(default)]
    pub site_name: Option<String>,

    /// Site base URL (root index only)
    #[serde(default)]
    pub site_url: Option<String>,

    /// Any other keys
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Keywords given either as a YAML list or as a single scalar.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Keywords {
    List(Vec<String>),
    One(String),
}

impl Keywords {
    /// Join keywords into a single `", "`-separated string.
    pub fn joined(&self) -> String {
        match self {
            Keywords::List(items) => items.join(", "),
            Keywords::One(value) => value.clone(),
        }
    }
}

/// Extract frontmatter from markdown content.
///
/// Returns the parsed frontmatter and the remaining content after the frontmatter block.
pub fn extract_frontmatter(source: &str) -> Result<(Option<Frontmatter>, &str), FrontmatterError> {
    let trimmed = source.trim_start();

    if !trimmed.starts_with("---") {
        return Ok((None, source));
    }

    // Find the closing ---
    let after_open = &trimmed[3..];
    let Some(close_pos) = after_open.find("\n---") else {
        return Err(FrontmatterError::Unclosed);
    };

    let yaml_content = after_open[..close_pos].trim();
    let remaining = &after_open[close_pos + 4..];

    // Drop the rest of the closing fence line
    let remaining = match remaining.find('\n') {
        Some(pos) if remaining[..pos].trim().is_empty() => &remaining[pos + 1..],
        None if remaining.trim().is_empty() => "",
        _ => remaining,
    };

    if yaml_content.is_empty() {
        return Ok((Some(Frontmatter::default()), remaining));
    }

    let frontmatter: Frontmatter = serde_yaml::from_str(yaml_content)
        .map_err(|e| FrontmatterError::InvalidYaml(e.to_string()))?;

    Ok((Some(frontmatter), remaining))
}

/// Errors that can occur when parsing frontmatter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("Unclosed frontmatter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in frontmatter: {0}")]
    InvalidYaml(String),
}
