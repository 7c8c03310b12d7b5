//! Page templates and final page assembly.
//!
//! Templates are plain HTML files with `{{ placeholder }}` substitutions,
//! read from the template directory of the content store. Each template is
//! read once per build and kept in a shared minijinja environment.

use std::sync::{PoisonError, RwLock};

use minijinja::{context, Environment, Value};

use crate::config::SiteConfig;
use crate::graph::DocumentNode;
use crate::paths::relative_path_to_site_root;
use crate::seo::SeoBlock;
use crate::store::{ContentStore, StoreError};
use crate::util::{escape_html, join_path};

/// Template used when a page does not name one.
pub const DEFAULT_TEMPLATE: &str = "default.html";

/// Stylesheet used when a page does not name one.
pub const DEFAULT_STYLESHEET: &str = "default.css";

/// Errors that can occur while rendering a page template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Failed to read template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to render template: {0}")]
    Render(#[from] minijinja::Error),
}

/// Template cache backed by the content store.
///
/// Safe to share between the pages of a batch. Two pages loading the same
/// template at once both insert it; the second insert replaces the first
/// with identical content.
pub struct TemplateEngine<'s> {
    store: &'s dyn ContentStore,
    template_root: String,
    env: RwLock<Environment<'static>>,
}

impl<'s> TemplateEngine<'s> {
    /// Create an empty cache reading from `template_root`.
    pub fn new(store: &'s dyn ContentStore, template_root: impl Into<String>) -> Self {
        Self {
            store,
            template_root: template_root.into(),
            env: RwLock::new(Environment::new()),
        }
    }

    /// Load a template into the cache, returning its resolved path.
    pub fn load(&self, name: &str) -> Result<String, TemplateError> {
        let path = join_path(&self.template_root, name);

        {
            let env = self.env.read().unwrap_or_else(PoisonError::into_inner);
            if env.get_template(&path).is_ok() {
                return Ok(path);
            }
        }

        let source = self.store.read_text(&path).map_err(|e| match e {
            StoreError::NotFound(_) => TemplateError::NotFound(path.clone()),
            source => TemplateError::Read {
                path: path.clone(),
                source,
            },
        })?;

        tracing::debug!("Loaded template {}", path);

        self.env
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_template_owned(path.clone(), source)?;

        Ok(path)
    }

    /// Render a cached template with the given context.
    ///
    /// A missing template other than [`DEFAULT_TEMPLATE`] falls back to it.
    pub fn render(&self, name: &str, ctx: Value) -> Result<String, TemplateError> {
        let path = match self.load(name) {
            Ok(path) => path,
            Err(TemplateError::NotFound(missing)) if name != DEFAULT_TEMPLATE => {
                tracing::warn!("Template {} not found, using {}", missing, DEFAULT_TEMPLATE);
                self.load(DEFAULT_TEMPLATE)?
            }
            Err(e) => return Err(e),
        };

        let env = self.env.read().unwrap_or_else(PoisonError::into_inner);
        let template = env.get_template(&path)?;
        Ok(template.render(ctx)?)
    }

    /// Number of cached templates.
    pub fn cached(&self) -> usize {
        self.env
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .templates()
            .count()
    }

    /// Drop every cached template.
    pub fn clear(&self) {
        self.env
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear_templates();
    }
}

// Escaped here rather than by minijinja, which also encodes `/`.
fn text(value: &str) -> Value {
    Value::from_safe_string(escape_html(value).into_owned())
}

/// Assembles final page HTML from its rendered parts.
pub struct PageRenderer<'a> {
    templates: &'a TemplateEngine<'a>,
    site: &'a SiteConfig,
}

impl<'a> PageRenderer<'a> {
    pub fn new(templates: &'a TemplateEngine<'a>, site: &'a SiteConfig) -> Self {
        Self { templates, site }
    }

    /// Render a page.
    ///
    /// `body` is the document's markdown with references already rewritten.
    /// `template_name` overrides the document's `page_template`.
    pub fn render(
        &self,
        doc: &DocumentNode,
        body: &str,
        navigation: &str,
        seo: &SeoBlock,
        template_name: Option<&str>,
    ) -> Result<String, TemplateError> {
        let fm = &doc.frontmatter;
        let root_path = relative_path_to_site_root(&doc.output_path());

        let template = template_name
            .or(fm.page_template.as_deref())
            .unwrap_or(DEFAULT_TEMPLATE);
        let stylesheet = fm.page_css.as_deref().unwrap_or(DEFAULT_STYLESHEET);

        let content = vellum_md::render_markdown(body);

        let ctx = context! {
            title => text(doc.title()),
            siteName => text(&self.site.site_name),
            rootPath => text(&root_path),
            content => Value::from_safe_string(content),
            navigation => Value::from_safe_string(navigation.to_string()),
            styleSheet => text(&format!("{root_path}css/{stylesheet}")),
            seoMetaTags => Value::from_safe_string(seo.meta_tags.clone()),
            seoStructuredData => Value::from_safe_string(seo.structured_data.clone()),
            canonicalUrl => text(&seo.canonical_url),
        };

        self.templates.render(template, ctx)
    }
}
