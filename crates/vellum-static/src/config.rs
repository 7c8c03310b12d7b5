//! Build and site configuration.

use vellum_md::Frontmatter;

/// Site name used when the root index does not provide one.
pub const DEFAULT_SITE_NAME: &str = "My Site";

/// Site URL used when the root index does not provide one.
pub const DEFAULT_SITE_URL: &str = "https://example.com";

/// Configuration for building a static site.
///
/// All directories are store paths, relative to the content root.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Working area owned by the generator. Nothing below it is treated as content.
    pub work_dir: String,

    /// Output directory, wiped and rebuilt on every run
    pub output_dir: String,

    /// Directory holding page templates
    pub template_dir: String,

    /// Directory holding stylesheets
    pub css_dir: String,

    /// Number of documents rendered concurrently per batch
    pub batch_size: usize,
}

impl BuildConfig {
    /// Derive a configuration whose directories all live inside `work_dir`.
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let work_dir = work_dir.into().trim_matches('/').to_string();
        Self {
            output_dir: format!("{work_dir}/site"),
            template_dir: format!("{work_dir}/templates"),
            css_dir: format!("{work_dir}/css"),
            work_dir,
            batch_size: 5,
        }
    }

    /// Store path of the user-supplied robots.txt override.
    pub fn robots_override(&self) -> String {
        format!("{}/robots.txt", self.work_dir)
    }

    /// Store path of the generated README in the working area.
    pub fn readme_path(&self) -> String {
        format!("{}/README.md", self.work_dir)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::with_work_dir("_vellum")
    }
}

/// Per-run site settings, read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site_name: String,

    /// Base URL without a trailing slash
    pub site_url: String,

    pub output_root: String,
    pub template_root: String,
    pub css_root: String,
}

impl SiteConfig {
    /// Load site settings from the root index front-matter.
    ///
    /// Missing values fall back to [`DEFAULT_SITE_NAME`] and
    /// [`DEFAULT_SITE_URL`]; a missing URL is logged.
    pub fn from_frontmatter(frontmatter: Option<&Frontmatter>, build: &BuildConfig) -> Self {
        let site_name = frontmatter
            .and_then(|fm| fm.site_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_SITE_NAME)
            .to_string();

        let site_url = match frontmatter
            .and_then(|fm| fm.site_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
        {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                tracing::warn!(
                    "No site_url in the root index front-matter, using {}",
                    DEFAULT_SITE_URL
                );
                DEFAULT_SITE_URL.to_string()
            }
        };

        Self {
            site_name,
            site_url,
            output_root: build.output_dir.clone(),
            template_root: build.template_dir.clone(),
            css_root: build.css_dir.clone(),
        }
    }
}
