//! Sitemap accumulation and serialization.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/index.html</loc>
//!     <lastmod>2025-01-01</lastmod>
//!     <changefreq>weekly</changefreq>
//!     <priority>1.0</priority>
//!   </url>
//! </urlset>
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::graph::DocumentNode;
use crate::seo::parse_date;
use crate::util::escape_xml;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// How often a page is expected to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeFreq {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(ChangeFreq::Always),
            "hourly" => Ok(ChangeFreq::Hourly),
            "daily" => Ok(ChangeFreq::Daily),
            "weekly" => Ok(ChangeFreq::Weekly),
            "monthly" => Ok(ChangeFreq::Monthly),
            "yearly" => Ok(ChangeFreq::Yearly),
            "never" => Ok(ChangeFreq::Never),
            other => Err(format!("unknown change frequency '{other}'")),
        }
    }
}

/// One advertised URL.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    /// Site-relative path
    pub loc: String,
    pub lastmod: Option<NaiveDate>,
    pub changefreq: Option<ChangeFreq>,
    /// In `[0.0, 1.0]`
    pub priority: Option<f32>,
}

impl SitemapEntry {
    /// Entry for a rendered document, applying the crawl-hint defaults.
    ///
    /// Index documents get `weekly` with priority `1.0` at the content root
    /// and `0.8` deeper down. Other documents get `monthly` / `0.6`. Values
    /// from front-matter win.
    pub fn for_document(doc: &DocumentNode) -> Self {
        let fm = &doc.frontmatter;

        let (default_freq, default_priority) = match (doc.is_index(), doc.depth()) {
            (true, 1) => (ChangeFreq::Weekly, 1.0),
            (true, _) => (ChangeFreq::Weekly, 0.8),
            (false, _) => (ChangeFreq::Monthly, 0.6),
        };

        let changefreq = match fm.changefreq.as_deref().map(ChangeFreq::from_str) {
            Some(Ok(freq)) => freq,
            Some(Err(e)) => {
                tracing::warn!("{} in {}, using {}", e, doc.path, default_freq);
                default_freq
            }
            None => default_freq,
        };

        let priority = fm
            .priority
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(default_priority);

        let lastmod = fm
            .last_modified_date
            .as_deref()
            .or(fm.published_date.as_deref())
            .and_then(parse_date)
            .map(|dt| dt.date_naive())
            .unwrap_or_else(|| doc.modified.date_naive());

        Self {
            loc: doc.output_path(),
            lastmod: Some(lastmod),
            changefreq: Some(changefreq),
            priority: Some(priority),
        }
    }
}

/// Entries collected during one build, in processing order.
#[derive(Debug, Default)]
pub struct SitemapAccumulator {
    entries: Vec<SitemapEntry>,
}

impl SitemapAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_url(&mut self, entry: SitemapEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SitemapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialize to sitemap XML with every location qualified by `site_url`.
    pub fn to_xml(&self, site_url: &str) -> String {
        let base = site_url.trim_end_matches('/');
        let mut xml = String::with_capacity(128 + self.entries.len() * 160);

        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"");
        xml.push_str(SITEMAP_NS);
        xml.push_str("\">\n");

        for entry in &self.entries {
            let loc = format!("{}/{}", base, entry.loc.trim_start_matches('/'));
            xml.push_str("  <url>\n    <loc>");
            xml.push_str(&escape_xml(&loc));
            xml.push_str("</loc>\n");
            if let Some(lastmod) = entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod.format("%Y-%m-%d")));
            }
            if let Some(freq) = entry.changefreq {
                xml.push_str(&format!("    <changefreq>{freq}</changefreq>\n"));
            }
            if let Some(priority) = entry.priority {
                xml.push_str(&format!("    <priority>{priority:.1}</priority>\n"));
            }
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}
