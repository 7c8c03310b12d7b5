//! Static site builder.
//!
//! Runs the whole pipeline against a [`ContentStore`]:
//! initialize the output area, load site settings, render every document in
//! fixed-size parallel batches, copy assets, then write the sitemap and
//! robots.txt. Every run is a full rebuild.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use crate::assets::{default_robots, DefaultAssets};
use crate::config::{BuildConfig, SiteConfig};
use crate::graph::{ContentGraph, DocumentNode, DOCUMENT_EXTENSIONS};
use crate::links::LinkRewriter;
use crate::navigation::{build_navigation, render_tree, NavNode};
use crate::paths::{extension, file_stem, is_index_name, relative_path_to_site_root, split_parent};
use crate::seo::{derive_seo, render_seo};
use crate::sitemap::{SitemapAccumulator, SitemapEntry};
use crate::store::{ContentStore, StoreError};
use crate::templates::{PageRenderer, TemplateEngine, TemplateError, DEFAULT_STYLESHEET, DEFAULT_TEMPLATE};
use crate::util::join_path;

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages written
    pub pages: usize,

    /// Number of documents that failed to render
    pub failed: usize,

    /// Number of images copied
    pub images: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory (store path)
    pub output_dir: String,
}

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to initialize {path}: {source}")]
    InitError {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to read content: {0}")]
    ReadError(#[source] StoreError),

    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: String,
        #[source]
        source: StoreError,
    },
}

/// Errors that fail a single page without stopping the build.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: StoreError,
    },
}

/// Pipeline stages of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    Idle,
    Initializing,
    NameLoaded,
    Processing,
    AssetsCopied,
    SitemapWritten,
    RobotsWritten,
    Done,
    Failed,
}

/// Caches and bookkeeping owned by one run. Dropping it clears them.
struct RunContext<'s> {
    state: BuildState,
    templates: TemplateEngine<'s>,
    seen: HashSet<String>,
    sitemap: SitemapAccumulator,
}

impl<'s> RunContext<'s> {
    fn new(store: &'s dyn ContentStore, config: &BuildConfig) -> Self {
        Self {
            state: BuildState::Idle,
            templates: TemplateEngine::new(store, config.template_dir.clone()),
            seen: HashSet::new(),
            sitemap: SitemapAccumulator::new(),
        }
    }

    fn advance(&mut self, next: BuildState) {
        tracing::debug!("Build state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

impl Drop for RunContext<'_> {
    fn drop(&mut self) {
        self.templates.clear();
        self.seen.clear();
        self.sitemap.clear();
        tracing::debug!("Cleared run caches (final state {:?})", self.state);
    }
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    store: Arc<dyn ContentStore>,
}

impl StaticBuilder {
    /// Create a new static builder.
    pub fn new(config: BuildConfig, store: Arc<dyn ContentStore>) -> Self {
        Self { config, store }
    }

    /// Build the static site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();
        let mut run = RunContext::new(self.store.as_ref(), &self.config);

        match self.run_pipeline(&mut run) {
            Ok((pages, failed, images)) => {
                run.advance(BuildState::Done);
                Ok(BuildResult {
                    pages,
                    failed,
                    images,
                    duration_ms: start.elapsed().as_millis() as u64,
                    output_dir: self.config.output_dir.clone(),
                })
            }
            Err(e) => {
                tracing::error!("Build failed while {:?}: {}", run.state, e);
                run.advance(BuildState::Failed);
                Err(e)
            }
        }
    }

    fn run_pipeline(&self, run: &mut RunContext<'_>) -> Result<(usize, usize, usize), BuildError> {
        run.advance(BuildState::Initializing);
        self.initialize()?;

        run.advance(BuildState::NameLoaded);
        let site = self.load_site_config();
        tracing::info!("Building {} ({})", site.site_name, site.site_url);

        run.advance(BuildState::Processing);
        let entries = self.store.list_files().map_err(BuildError::ReadError)?;
        let graph = ContentGraph::build(self.store.as_ref(), &entries, &self.config.work_dir);
        let nav = build_navigation(graph.documents());
        let (pages, failed) = self.process_documents(run, &graph, &nav, &site);

        run.advance(BuildState::AssetsCopied);
        let images = self.copy_images(&graph, &site);
        self.copy_stylesheets(&site);

        run.advance(BuildState::SitemapWritten);
        let sitemap_path = join_path(&site.output_root, "sitemap.xml");
        self.write_output(&sitemap_path, &run.sitemap.to_xml(&site.site_url))?;

        run.advance(BuildState::RobotsWritten);
        self.write_robots(&site)?;

        Ok((pages, failed, images))
    }

    /// Wipe the output directory and make sure the working area exists.
    fn initialize(&self) -> Result<(), BuildError> {
        let config = &self.config;
        let init_err = |path: &str| {
            let path = path.to_string();
            move |source: StoreError| BuildError::InitError { path, source }
        };

        if self.store.exists(&config.output_dir) {
            remove_dir_all(self.store.as_ref(), &config.output_dir)
                .map_err(init_err(&config.output_dir))?;
        }

        for dir in [
            &config.work_dir,
            &config.output_dir,
            &config.template_dir,
            &config.css_dir,
        ] {
            self.store.mkdir(dir).map_err(init_err(dir))?;
        }

        let seeds = [
            (join_path(&config.template_dir, DEFAULT_TEMPLATE), DefaultAssets::template()),
            (join_path(&config.css_dir, DEFAULT_STYLESHEET), DefaultAssets::stylesheet()),
            (config.readme_path(), DefaultAssets::readme()),
        ];
        for (path, content) in seeds {
            if !self.store.exists(&path) {
                self.store.write_text(&path, content).map_err(init_err(&path))?;
                tracing::info!("Created {}", path);
            }
        }

        Ok(())
    }

    /// Read site name and URL from the content-root index.
    fn load_site_config(&self) -> SiteConfig {
        let index = match self.store.list_dir("") {
            Ok(listing) => listing.files.into_iter().find(|path| is_root_index(path)),
            Err(e) => {
                tracing::warn!("Could not list the content root: {}", e);
                None
            }
        };

        let frontmatter = match index {
            Some(path) => match self.store.read_text(&path) {
                Ok(raw) => Some(DocumentNode::parse(&path, &raw, Default::default()).frontmatter),
                Err(e) => {
                    tracing::warn!("Could not read {}: {}", path, e);
                    None
                }
            },
            None => {
                tracing::warn!("No index document at the content root");
                None
            }
        };

        SiteConfig::from_frontmatter(frontmatter.as_ref(), &self.config)
    }

    /// Render every document, batch by batch.
    ///
    /// Documents within a batch render in parallel; batches run in order.
    /// Returns the number of pages written and failed.
    fn process_documents(
        &self,
        run: &mut RunContext<'_>,
        graph: &ContentGraph,
        nav: &[NavNode],
        site: &SiteConfig,
    ) -> (usize, usize) {
        let queue: Vec<&DocumentNode> = graph
            .documents()
            .iter()
            .filter(|doc| {
                let fresh = run.seen.insert(doc.path.clone());
                if !fresh {
                    tracing::debug!("Skipping already processed {}", doc.path);
                }
                fresh
            })
            .collect();

        let renderer = PageRenderer::new(&run.templates, site);
        let rewriter = LinkRewriter::new(graph);
        let mut pages = 0;
        let mut failed = 0;

        for (index, batch) in queue.chunks(self.config.batch_size.max(1)).enumerate() {
            tracing::debug!("Rendering batch {} ({} documents)", index + 1, batch.len());

            let results: Vec<Result<SitemapEntry, PageError>> = batch
                .par_iter()
                .map(|doc| self.build_page(doc, &rewriter, &renderer, nav, site))
                .collect();

            for (doc, result) in batch.iter().zip(results) {
                match result {
                    Ok(entry) => {
                        run.sitemap.add_url(entry);
                        pages += 1;
                    }
                    Err(e) => {
                        tracing::error!("Failed to build {}: {}", doc.path, e);
                        failed += 1;
                    }
                }
            }
        }

        tracing::info!("Rendered {} pages ({} failed)", pages, failed);
        (pages, failed)
    }

    /// Render and write one page.
    fn build_page(
        &self,
        doc: &DocumentNode,
        rewriter: &LinkRewriter<'_>,
        renderer: &PageRenderer<'_>,
        nav: &[NavNode],
        site: &SiteConfig,
    ) -> Result<SitemapEntry, PageError> {
        let output = doc.output_path();
        let root_path = relative_path_to_site_root(&output);

        let body = rewriter.rewrite(&doc.body, &output);
        let navigation = render_tree(nav, &output);
        let seo = render_seo(&derive_seo(doc.title(), doc, site, &root_path));

        let html = renderer.render(doc, &body, &navigation, &seo, None)?;

        let target = join_path(&site.output_root, &output);
        let write_err = |source: StoreError| PageError::Write {
            path: target.clone(),
            source,
        };
        let (dir, _) = split_parent(&target);
        self.store.mkdir(dir).map_err(write_err)?;
        self.store.write_text(&target, &html).map_err(write_err)?;

        tracing::debug!("Wrote {}", target);
        Ok(SitemapEntry::for_document(doc))
    }

    /// Copy every image to its mirrored output path.
    fn copy_images(&self, graph: &ContentGraph, site: &SiteConfig) -> usize {
        let mut copied = 0;

        for image in graph.images() {
            let target = join_path(&site.output_root, &image.output_path());
            let (dir, _) = split_parent(&target);

            let result = self
                .store
                .read_binary(&image.path)
                .and_then(|bytes| {
                    self.store.mkdir(dir)?;
                    self.store.write_binary(&target, &bytes)
                });

            match result {
                Ok(()) => copied += 1,
                Err(e) => tracing::warn!("Failed to copy image {}: {}", image.path, e),
            }
        }

        tracing::info!("Copied {} images", copied);
        copied
    }

    /// Copy every stylesheet in the css directory to `css/`.
    fn copy_stylesheets(&self, site: &SiteConfig) {
        let listing = match self.store.list_dir(&site.css_root) {
            Ok(listing) => listing,
            Err(e) => {
                tracing::warn!("Failed to list stylesheets in {}: {}", site.css_root, e);
                return;
            }
        };

        let css_out = join_path(&site.output_root, "css");
        if let Err(e) = self.store.mkdir(&css_out) {
            tracing::warn!("Failed to create {}: {}", css_out, e);
            return;
        }

        for file in listing.files {
            let (_, name) = split_parent(&file);
            let target = join_path(&css_out, name);
            let result = self
                .store
                .read_binary(&file)
                .and_then(|bytes| self.store.write_binary(&target, &bytes));
            if let Err(e) = result {
                tracing::warn!("Failed to copy stylesheet {}: {}", file, e);
            }
        }
    }

    /// Write robots.txt, preferring the user override in the working area.
    fn write_robots(&self, site: &SiteConfig) -> Result<(), BuildError> {
        let override_path = self.config.robots_override();

        let robots = if self.store.exists(&override_path) {
            tracing::debug!("Using {}", override_path);
            self.store
                .read_text(&override_path)
                .map_err(BuildError::ReadError)?
        } else {
            default_robots(&site.site_url)
        };

        self.write_output(&join_path(&site.output_root, "robots.txt"), &robots)
    }

    fn write_output(&self, path: &str, content: &str) -> Result<(), BuildError> {
        self.store
            .write_text(path, content)
            .map_err(|source| BuildError::WriteError {
                path: path.to_string(),
                source,
            })
    }
}

/// Whether a content-root file name is the site's index document.
fn is_root_index(file_name: &str) -> bool {
    let is_document = extension(file_name)
        .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext.as_str()));
    is_document && is_index_name(file_stem(file_name))
}

/// Remove a directory tree through the store.
///
/// Deletes files, recurses into folders and then removes the emptied
/// directory. If that fails anywhere, a single removal of `path` itself is
/// attempted; if that fails too, the first error is returned.
pub fn remove_dir_all(store: &dyn ContentStore, path: &str) -> Result<(), StoreError> {
    match remove_tree(store, path) {
        Ok(()) => Ok(()),
        Err(original) => {
            tracing::warn!("Recursive delete of {} failed: {}", path, original);
            store.rmdir(path).map_err(|_| original)
        }
    }
}

fn remove_tree(store: &dyn ContentStore, path: &str) -> Result<(), StoreError> {
    let listing = store.list_dir(path)?;
    for file in &listing.files {
        store.remove(file)?;
    }
    for folder in &listing.folders {
        remove_tree(store, folder)?;
    }
    store.rmdir(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsStore;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn site_with(files: &[(&str, &str)]) -> (TempDir, Arc<FsStore>) {
        let temp = tempdir().unwrap();
        let store = Arc::new(FsStore::new(temp.path()));
        for (path, content) in files {
            let (dir, _) = split_parent(path);
            store.mkdir(dir).unwrap();
            store.write_text(path, content).unwrap();
        }
        (temp, store)
    }

    fn builder(store: &Arc<FsStore>) -> StaticBuilder {
        StaticBuilder::new(BuildConfig::default(), store.clone())
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join("_vellum/site").join(rel)).unwrap()
    }

    fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
        let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(dir).unwrap().display().to_string();
                (rel, fs::read(e.path()).unwrap())
            })
            .collect();
        files.sort();
        files
    }

    #[tokio::test]
    async fn builds_demo_site() {
        let (temp, store) = site_with(&[
            (
                "index.md",
                "---\nsite_name: Demo\nsite_url: https://demo.test\n---\n# Welcome\n",
            ),
            ("blog/post1.md", "See [[index]]"),
        ]);
        store.mkdir("images").unwrap();
        store.write_binary("images/pic.png", &[0x89, 0x50, 0x4e, 0x47]).unwrap();

        let result = builder(&store).build().await.unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(result.failed, 0);
        assert_eq!(result.images, 1);

        let out = temp.path().join("_vellum/site");
        assert!(out.join("index.html").exists());
        assert!(read(temp.path(), "blog/post1.html").contains(r#"<a href="../index.html">index</a>"#));
        assert!(out.join("css/default.css").exists());
        assert_eq!(fs::read(out.join("images/pic.png")).unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);

        let sitemap = read(temp.path(), "sitemap.xml");
        assert_eq!(sitemap.matches("<url>").count(), 2);
        assert!(sitemap.contains(
            "<loc>https://demo.test/index.html</loc>\n    <lastmod>"
        ));
        let index_entry = sitemap
            .split("<url>")
            .find(|u| u.contains("https://demo.test/index.html"))
            .unwrap();
        assert!(index_entry.contains("<priority>1.0</priority>"));

        assert_eq!(
            read(temp.path(), "robots.txt"),
            "User-agent: *\nAllow: /\n\nSitemap: https://demo.test/sitemap.xml"
        );

        let home = read(temp.path(), "index.html");
        assert!(home.contains("<title>index | Demo</title>"));
        assert!(home.contains(r#"<link rel="canonical" href="https://demo.test/index.html">"#));
        assert!(home.contains(r#"<meta property="og:type" content="website">"#));
    }

    #[tokio::test]
    async fn rebuild_is_byte_identical() {
        let (temp, store) = site_with(&[
            ("index.md", "---\nsite_url: https://demo.test\n---\nHome"),
            ("a/index.md", "[[b]] and [[missing]]"),
            ("a/b.md", "![[nothing.png]]"),
            ("c/d/e.md", "[[a/index|A]]"),
        ]);

        let out = temp.path().join("_vellum/site");
        builder(&store).build().await.unwrap();
        let first = snapshot(&out);
        builder(&store).build().await.unwrap();
        let second = snapshot(&out);

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn broken_references_do_not_fail_the_build() {
        let (temp, store) = site_with(&[
            ("index.md", "[[Nowhere]] ![[ghost.png]]"),
        ]);

        let result = builder(&store).build().await.unwrap();

        assert_eq!(result.failed, 0);
        let html = read(temp.path(), "index.html");
        assert!(html.contains("#broken-link"));
        assert!(html.contains("#broken-image"));
    }

    #[tokio::test]
    async fn clears_stale_output_and_keeps_user_templates() {
        let (temp, store) = site_with(&[
            ("index.md", "Home"),
            ("_vellum/site/old/stale.html", "stale"),
            ("_vellum/templates/default.html", "CUSTOM {{ title }}"),
        ]);

        builder(&store).build().await.unwrap();

        let out = temp.path().join("_vellum/site");
        assert!(!out.join("old").exists());
        assert_eq!(read(temp.path(), "index.html"), "CUSTOM index");
        assert_eq!(
            fs::read_to_string(temp.path().join("_vellum/templates/default.html")).unwrap(),
            "CUSTOM {{ title }}"
        );
        assert!(temp.path().join("_vellum/README.md").exists());
    }

    #[tokio::test]
    async fn failing_page_is_isolated() {
        let (temp, store) = site_with(&[
            ("index.md", "Home"),
            ("broken.md", "---\npage_template: bad.html\n---\nx"),
            ("fine.md", "ok"),
            ("_vellum/templates/bad.html", "{{ unclosed"),
        ]);

        let result = builder(&store).build().await.unwrap();

        assert_eq!(result.pages, 2);
        assert_eq!(result.failed, 1);
        let out = temp.path().join("_vellum/site");
        assert!(!out.join("broken.html").exists());
        assert!(out.join("fine.html").exists());
        assert_eq!(read(temp.path(), "sitemap.xml").matches("<url>").count(), 2);
    }

    #[tokio::test]
    async fn uses_robots_override_and_copies_stylesheets() {
        let (temp, store) = site_with(&[
            ("index.md", "Home"),
            ("_vellum/robots.txt", "User-agent: *\nDisallow: /"),
            ("_vellum/css/extra.css", "body { color: red; }"),
        ]);

        builder(&store).build().await.unwrap();

        assert_eq!(read(temp.path(), "robots.txt"), "User-agent: *\nDisallow: /");
        assert_eq!(read(temp.path(), "css/extra.css"), "body { color: red; }");
        assert!(temp.path().join("_vellum/site/css/default.css").exists());
    }

    #[tokio::test]
    async fn defaults_site_settings_without_root_index() {
        let (temp, store) = site_with(&[("notes/a.md", "A")]);

        builder(&store).build().await.unwrap();

        assert!(read(temp.path(), "robots.txt").contains("https://example.com/sitemap.xml"));
        assert!(read(temp.path(), "notes/a.html").contains("| My Site</title>"));
    }

    #[tokio::test]
    async fn heading_references_land_on_rendered_headings() {
        let (temp, store) = site_with(&[
            ("index.md", "Home"),
            ("guide/post.md", "intro\n\n## Getting Started\n\nsteps"),
            ("other.md", "Read [[post#Getting Started|the intro]]"),
        ]);

        builder(&store).build().await.unwrap();

        assert!(read(temp.path(), "other.html")
            .contains(r##"<a href="guide/post.html#getting-started">the intro</a>"##));
        assert!(read(temp.path(), "guide/post.html")
            .contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
    }

    #[tokio::test]
    async fn reads_site_settings_from_capitalized_root_index() {
        let (temp, store) = site_with(&[
            (
                "Index.md",
                "---\nsite_name: Demo\nsite_url: https://demo.test\n---\nHome",
            ),
            ("blog/index.md", "---\nsite_name: Wrong\n---\nBlog"),
        ]);

        builder(&store).build().await.unwrap();

        assert!(read(temp.path(), "robots.txt").ends_with("Sitemap: https://demo.test/sitemap.xml"));
        assert!(read(temp.path(), "index.html").contains("<title>Index | Demo</title>"));
    }

    #[test]
    fn recognizes_root_index_names() {
        assert!(is_root_index("index.md"));
        assert!(is_root_index("Index.md"));
        assert!(is_root_index("INDEX.MDX"));
        assert!(!is_root_index("index.html"));
        assert!(!is_root_index("indexes.md"));
    }

    #[tokio::test]
    async fn sitemap_follows_document_order_for_any_batch_size() {
        let files: Vec<(String, String)> = (0..12)
            .map(|i| (format!("p/{i:02}.md"), format!("page {i}")))
            .collect();
        let refs: Vec<(&str, &str)> = files.iter().map(|(p, c)| (p.as_str(), c.as_str())).collect();
        let (temp, store) = site_with(&refs);

        for batch_size in [1, 5, 64] {
            let config = BuildConfig {
                batch_size,
                ..BuildConfig::default()
            };
            let result = StaticBuilder::new(config, store.clone()).build().await.unwrap();
            assert_eq!(result.pages, 12);

            let sitemap = read(temp.path(), "sitemap.xml");
            let locs: Vec<&str> = sitemap
                .lines()
                .filter_map(|l| l.trim().strip_prefix("<loc>"))
                .collect();
            let expected: Vec<String> = (0..12)
                .map(|i| format!("https://example.com/p/{i:02}.html</loc>"))
                .collect();
            assert_eq!(locs, expected);
        }
    }

    #[tokio::test]
    async fn init_failure_aborts_the_run() {
        let (_temp, store) = site_with(&[("index.md", "Home"), ("_vellum/site", "not a directory")]);

        let err = builder(&store).build().await.unwrap_err();

        assert!(matches!(err, BuildError::InitError { ref path, .. } if path == "_vellum/site"));
    }

    #[test]
    fn removes_nested_trees() {
        let (temp, store) = site_with(&[
            ("out/a.html", "a"),
            ("out/x/y/z.html", "z"),
            ("out/x/w.png", "w"),
        ]);

        remove_dir_all(store.as_ref(), "out").unwrap();

        assert!(!temp.path().join("out").exists());
    }

    #[test]
    fn remove_missing_dir_reports_original_error() {
        let (_temp, store) = site_with(&[]);

        let err = remove_dir_all(store.as_ref(), "nope").unwrap_err();

        assert!(matches!(err, StoreError::NotFound(ref p) if p == "nope"));
    }
}
