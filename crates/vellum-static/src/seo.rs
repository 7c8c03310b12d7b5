//! SEO metadata: meta tags, Open Graph, Twitter Card and JSON-LD.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::config::SiteConfig;
use crate::graph::DocumentNode;
use crate::paths::split_parent;
use crate::util::escape_html;

/// Open Graph content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Article,
    Website,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Article => "article",
            ContentType::Website => "website",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "article" => Some(ContentType::Article),
            "website" => Some(ContentType::Website),
            _ => None,
        }
    }
}

/// Metadata derived for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoConfig {
    pub title: String,
    pub description: Option<String>,
    /// Keywords joined with `", "`
    pub keywords: Option<String>,
    pub author: Option<String>,
    /// Absolute URL of the social image
    pub image: Option<String>,
    pub site_name: String,
    /// Absolute URL of the page
    pub url: String,
    pub canonical_url: String,
    pub content_type: ContentType,
    /// ISO-8601 instant
    pub published_time: Option<String>,
    /// ISO-8601 instant, defaults to `published_time`
    pub modified_time: Option<String>,
    pub section: Option<String>,
}

/// One `<meta>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    /// `name` or `property`
    pub attribute: &'static str,
    pub key: String,
    pub content: String,
}

impl MetaTag {
    fn name(key: &str, content: &str) -> Self {
        Self {
            attribute: "name",
            key: key.to_string(),
            content: content.to_string(),
        }
    }

    fn property(key: &str, content: &str) -> Self {
        Self {
            attribute: "property",
            key: key.to_string(),
            content: content.to_string(),
        }
    }

    pub fn to_html(&self) -> String {
        format!(
            r#"<meta {}="{}" content="{}">"#,
            self.attribute,
            escape_html(&self.key),
            escape_html(&self.content)
        )
    }
}

/// Rendered SEO output for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct SeoBlock {
    pub meta_tags: String,
    pub structured_data: String,
    pub canonical_url: String,
}

/// Parse a front-matter date into a UTC instant.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]`, `YYYY-MM-DDTHH:MM:SS` and
/// plain `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn iso_instant(value: Option<&str>, field: &str, doc: &DocumentNode) -> Option<String> {
    let raw = value?;
    match parse_date(raw) {
        Some(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => {
            tracing::warn!("Unparseable {} '{}' in {}", field, raw, doc.path);
            None
        }
    }
}

fn is_absolute_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("//")
}

fn absolute_image(image: &str, site_url: &str, root_path: &str) -> String {
    if is_absolute_url(image) {
        return image.to_string();
    }

    let raw = format!("{}/{}{}", site_url, root_path, image.trim_start_matches('/'));
    // Parsing folds the `./` and `../` segments left by the root prefix.
    url::Url::parse(&raw).map(|u| u.to_string()).unwrap_or(raw)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Derive the SEO metadata of a page.
///
/// `root_path` is the page's relative prefix back to the site root.
pub fn derive_seo(
    title: &str,
    doc: &DocumentNode,
    site: &SiteConfig,
    root_path: &str,
) -> SeoConfig {
    let fm = &doc.frontmatter;
    let url = format!("{}/{}", site.site_url, doc.output_path());

    let content_type = fm
        .page_type
        .as_deref()
        .and_then(ContentType::parse)
        .unwrap_or(if doc.parent.is_empty() {
            ContentType::Website
        } else {
            ContentType::Article
        });

    let published_time = iso_instant(fm.published_date.as_deref(), "published_date", doc);
    let modified_time = iso_instant(fm.last_modified_date.as_deref(), "last_modified_date", doc)
        .or_else(|| published_time.clone());

    let section = non_empty(fm.section.as_ref()).or_else(|| {
        let (_, folder) = split_parent(&doc.parent);
        (!folder.is_empty()).then(|| folder.to_string())
    });

    SeoConfig {
        title: title.to_string(),
        description: non_empty(fm.description.as_ref()),
        keywords: fm
            .keywords
            .as_ref()
            .map(|k| k.joined())
            .filter(|k| !k.is_empty()),
        author: non_empty(fm.author.as_ref()),
        image: non_empty(fm.og_image.as_ref())
            .map(|image| absolute_image(&image, &site.site_url, root_path)),
        site_name: site.site_name.clone(),
        canonical_url: non_empty(fm.canonical.as_ref()).unwrap_or_else(|| url.clone()),
        url,
        content_type,
        published_time,
        modified_time,
        section,
    }
}

/// Basic, Open Graph and Twitter Card tags, in that order.
pub fn meta_tags(seo: &SeoConfig) -> Vec<MetaTag> {
    let mut tags = Vec::new();

    if let Some(description) = &seo.description {
        tags.push(MetaTag::name("description", description));
    }
    if let Some(keywords) = &seo.keywords {
        tags.push(MetaTag::name("keywords", keywords));
    }
    if let Some(author) = &seo.author {
        tags.push(MetaTag::name("author", author));
    }

    tags.push(MetaTag::property("og:title", &seo.title));
    tags.push(MetaTag::property("og:type", seo.content_type.as_str()));
    tags.push(MetaTag::property("og:url", &seo.canonical_url));
    tags.push(MetaTag::property("og:site_name", &seo.site_name));
    if let Some(description) = &seo.description {
        tags.push(MetaTag::property("og:description", description));
    }
    if let Some(image) = &seo.image {
        tags.push(MetaTag::property("og:image", image));
    }
    if seo.content_type == ContentType::Article {
        if let Some(published) = &seo.published_time {
            tags.push(MetaTag::property("article:published_time", published));
        }
        if let Some(modified) = &seo.modified_time {
            tags.push(MetaTag::property("article:modified_time", modified));
        }
        if let Some(section) = &seo.section {
            tags.push(MetaTag::property("article:section", section));
        }
        if let Some(author) = &seo.author {
            tags.push(MetaTag::property("article:author", author));
        }
    }

    let card = if seo.image.is_some() {
        "summary_large_image"
    } else {
        "summary"
    };
    tags.push(MetaTag::name("twitter:card", card));
    tags.push(MetaTag::name("twitter:title", &seo.title));
    if let Some(description) = &seo.description {
        tags.push(MetaTag::name("twitter:description", description));
    }
    if let Some(image) = &seo.image {
        tags.push(MetaTag::name("twitter:image", image));
    }

    tags
}

/// schema.org `Article` or `WebPage` object.
pub fn structured_data(seo: &SeoConfig) -> Value {
    let mut data = Map::new();
    data.insert("@context".into(), json!("https://schema.org"));
    data.insert("url".into(), json!(seo.canonical_url));

    let mut insert_opt = |key: &str, value: &Option<String>| {
        if let Some(value) = value {
            data.insert(key.into(), json!(value));
        }
    };
    insert_opt("description", &seo.description);
    insert_opt("image", &seo.image);
    insert_opt("keywords", &seo.keywords);

    match seo.content_type {
        ContentType::Article => {
            data.insert("@type".into(), json!("Article"));
            data.insert("headline".into(), json!(seo.title));
            if let Some(published) = &seo.published_time {
                data.insert("datePublished".into(), json!(published));
            }
            if let Some(modified) = &seo.modified_time {
                data.insert("dateModified".into(), json!(modified));
            }
            if let Some(section) = &seo.section {
                data.insert("articleSection".into(), json!(section));
            }
            if let Some(author) = &seo.author {
                data.insert("author".into(), json!({ "@type": "Person", "name": author }));
            }
            data.insert(
                "publisher".into(),
                json!({ "@type": "Organization", "name": seo.site_name }),
            );
            data.insert(
                "mainEntityOfPage".into(),
                json!({ "@type": "WebPage", "@id": seo.canonical_url }),
            );
        }
        ContentType::Website => {
            data.insert("@type".into(), json!("WebPage"));
            data.insert("name".into(), json!(seo.title));
            data.insert(
                "isPartOf".into(),
                json!({ "@type": "WebSite", "name": seo.site_name }),
            );
        }
    }

    Value::Object(data)
}

/// Render tags and structured data for the page template.
pub fn render_seo(seo: &SeoConfig) -> SeoBlock {
    let meta_tags = meta_tags(seo)
        .iter()
        .map(MetaTag::to_html)
        .collect::<Vec<_>>()
        .join("\n");

    let json = serde_json::to_string_pretty(&structured_data(seo))
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    SeoBlock {
        meta_tags,
        structured_data: format!("<script type=\"application/ld+json\">\n{json}\n</script>"),
        canonical_url: seo.canonical_url.clone(),
    }
}
