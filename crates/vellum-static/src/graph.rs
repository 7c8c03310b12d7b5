//! In-memory content graph for one build.
//!
//! Holds every document and image found in the content store, minus the
//! generator's own working area, and resolves references by name or path.

use chrono::{DateTime, Utc};
use vellum_md::{parse_document, Frontmatter};

use crate::paths::{self, extension, file_stem, is_index_name, split_parent};
use crate::store::{ContentStore, StoreEntry};

/// Extensions treated as markdown documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Extensions treated as images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp"];

/// One markdown document.
#[derive(Debug, Clone)]
pub struct DocumentNode {
    /// Source path relative to the content root
    pub path: String,

    /// File name without extension
    pub base_name: String,

    /// Containing folder, empty at the content root
    pub parent: String,

    /// Markdown body without front-matter
    pub body: String,

    pub frontmatter: Frontmatter,

    pub modified: DateTime<Utc>,
}

impl DocumentNode {
    /// Build a node from raw document text.
    ///
    /// Malformed front-matter is logged and ignored; the whole text then
    /// becomes the body.
    pub fn parse(path: &str, raw: &str, modified: DateTime<Utc>) -> Self {
        let (frontmatter, body) = match parse_document(raw) {
            Ok(doc) => (doc.frontmatter.unwrap_or_default(), doc.content),
            Err(e) => {
                tracing::warn!("Ignoring front-matter of {}: {}", path, e);
                (Frontmatter::default(), raw.to_string())
            }
        };

        let (parent, file_name) = split_parent(path);

        Self {
            path: path.to_string(),
            base_name: file_stem(file_name).to_string(),
            parent: parent.to_string(),
            body,
            frontmatter,
            modified,
        }
    }

    /// Whether this is its folder's landing page.
    pub fn is_index(&self) -> bool {
        is_index_name(&self.base_name)
    }

    /// Number of path segments, 1 for documents at the content root.
    pub fn depth(&self) -> usize {
        self.path.split('/').filter(|s| !s.is_empty()).count()
    }

    /// Front-matter title, falling back to the base name.
    pub fn title(&self) -> &str {
        self.frontmatter
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.base_name)
    }

    /// Output path of the rendered page.
    pub fn output_path(&self) -> String {
        paths::output_path_for(&self.path)
    }

    fn path_without_extension(&self) -> &str {
        let (_, file_name) = split_parent(&self.path);
        let stem_len = file_stem(file_name).len();
        let ext_len = file_name.len() - stem_len;
        &self.path[..self.path.len() - ext_len]
    }
}

/// One image asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    /// Source path relative to the content root
    pub path: String,

    pub file_name: String,

    /// File name without extension
    pub base_name: String,
}

impl ImageNode {
    pub fn new(path: &str) -> Self {
        let (_, file_name) = split_parent(path);
        Self {
            path: path.to_string(),
            file_name: file_name.to_string(),
            base_name: file_stem(file_name).to_string(),
        }
    }

    pub fn output_path(&self) -> String {
        paths::image_output_path_for(&self.path)
    }
}

/// Documents and images of one build, in store listing order.
#[derive(Debug, Clone, Default)]
pub struct ContentGraph {
    documents: Vec<DocumentNode>,
    images: Vec<ImageNode>,
}

/// Whether `path` lies inside (or is) the generator's working area.
pub fn is_in_work_dir(path: &str, work_dir: &str) -> bool {
    let work_dir = work_dir.trim_matches('/');
    !work_dir.is_empty()
        && (path == work_dir
            || path
                .strip_prefix(work_dir)
                .is_some_and(|rest| rest.starts_with('/')))
}

impl ContentGraph {
    pub fn new(documents: Vec<DocumentNode>, images: Vec<ImageNode>) -> Self {
        Self { documents, images }
    }

    /// Build the graph from a store listing.
    ///
    /// Entries inside `work_dir` are skipped. Documents that cannot be read
    /// are logged and left out.
    pub fn build(store: &dyn ContentStore, entries: &[StoreEntry], work_dir: &str) -> Self {
        let mut documents = Vec::new();
        let mut images = Vec::new();

        for entry in entries {
            if is_in_work_dir(&entry.path, work_dir) {
                continue;
            }

            let (_, file_name) = split_parent(&entry.path);
            let Some(ext) = extension(file_name) else {
                continue;
            };

            if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
                match store.read_text(&entry.path) {
                    Ok(raw) => documents.push(DocumentNode::parse(&entry.path, &raw, entry.modified)),
                    Err(e) => tracing::warn!("Skipping unreadable document {}: {}", entry.path, e),
                }
            } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                images.push(ImageNode::new(&entry.path));
            }
        }

        tracing::debug!(
            "Content graph: {} documents, {} images",
            documents.len(),
            images.len()
        );

        Self { documents, images }
    }

    pub fn documents(&self) -> &[DocumentNode] {
        &self.documents
    }

    pub fn images(&self) -> &[ImageNode] {
        &self.images
    }

    /// The content-root index document, if there is one.
    pub fn root_index(&self) -> Option<&DocumentNode> {
        self.documents
            .iter()
            .find(|doc| doc.parent.is_empty() && doc.is_index())
    }

    /// Resolve a document reference.
    ///
    /// A trailing markdown extension is ignored. An exact source path match
    /// wins; otherwise the first document (in graph order) with that base
    /// name is returned. Base names are not unique, so the fallback is
    /// ambiguous when several folders hold a document of the same name.
    pub fn find_document(&self, reference: &str) -> Option<&DocumentNode> {
        let reference = strip_document_extension(reference.trim().trim_start_matches('/'));
        if reference.is_empty() {
            return None;
        }

        self.documents
            .iter()
            .find(|doc| doc.path == reference || doc.path_without_extension() == reference)
            .or_else(|| self.documents.iter().find(|doc| doc.base_name == reference))
    }

    /// Resolve an image reference by source path, then file name, then base name.
    pub fn find_image(&self, reference: &str) -> Option<&ImageNode> {
        let reference = reference.trim().trim_start_matches('/');
        if reference.is_empty() {
            return None;
        }

        self.images
            .iter()
            .find(|img| img.path == reference)
            .or_else(|| self.images.iter().find(|img| img.file_name == reference))
            .or_else(|| self.images.iter().find(|img| img.base_name == reference))
    }
}

fn strip_document_extension(reference: &str) -> &str {
    let (_, file_name) = split_parent(reference);
    match extension(file_name) {
        Some(ext) if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) => {
            &reference[..reference.len() - ext.len() - 1]
        }
        _ => reference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsStore;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn doc(path: &str) -> DocumentNode {
        DocumentNode::parse(path, "", Utc::now())
    }

    fn graph(doc_paths: &[&str], image_paths: &[&str]) -> ContentGraph {
        ContentGraph::new(
            doc_paths.iter().map(|p| doc(p)).collect(),
            image_paths.iter().map(|p| ImageNode::new(p)).collect(),
        )
    }

    #[test]
    fn parses_document_node() {
        let node = DocumentNode::parse(
            "blog/First Post.md",
            "---\ntitle: Hello\n---\nBody text",
            Utc::now(),
        );

        assert_eq!(node.base_name, "First Post");
        assert_eq!(node.parent, "blog");
        assert_eq!(node.body, "Body text");
        assert_eq!(node.title(), "Hello");
        assert_eq!(node.depth(), 2);
        assert!(!node.is_index());
        assert_eq!(node.output_path(), "blog/first-post.html");
    }

    #[test]
    fn bad_frontmatter_keeps_raw_body() {
        let node = DocumentNode::parse("a.md", "---\ntitle: [oops\n---\ntext", Utc::now());

        assert_eq!(node.frontmatter, Frontmatter::default());
        assert!(node.body.contains("text"));
        assert_eq!(node.title(), "a");
    }

    #[test]
    fn index_detection_is_case_insensitive() {
        assert!(doc("Index.md").is_index());
        assert!(doc("blog/INDEX.md").is_index());
        assert!(!doc("blog/indexer.md").is_index());
    }

    #[test]
    fn finds_documents_by_path_then_name() {
        let g = graph(&["index.md", "blog/post.md", "notes/post.md", "notes/other.md"], &[]);

        assert_eq!(g.find_document("notes/post").unwrap().path, "notes/post.md");
        assert_eq!(g.find_document("notes/post.md").unwrap().path, "notes/post.md");
        assert_eq!(g.find_document("other").unwrap().path, "notes/other.md");
        assert!(g.find_document("missing").is_none());
        assert!(g.find_document("").is_none());
    }

    #[test]
    fn base_name_fallback_is_first_in_graph_order() {
        let g = graph(&["notes/post.md", "blog/post.md"], &[]);

        assert_eq!(g.find_document("post").unwrap().path, "notes/post.md");
    }

    #[test]
    fn finds_images_by_path_file_name_and_base_name() {
        let g = graph(&[], &["images/pic.png", "other/pic.jpg", "diagram.svg"]);

        assert_eq!(g.find_image("other/pic.jpg").unwrap().path, "other/pic.jpg");
        assert_eq!(g.find_image("pic.jpg").unwrap().path, "other/pic.jpg");
        assert_eq!(g.find_image("pic").unwrap().path, "images/pic.png");
        assert_eq!(g.find_image("diagram").unwrap().path, "diagram.svg");
        assert!(g.find_image("nope.png").is_none());
    }

    #[test]
    fn work_dir_membership() {
        assert!(is_in_work_dir("_vellum", "_vellum"));
        assert!(is_in_work_dir("_vellum/site/index.html", "_vellum"));
        assert!(!is_in_work_dir("_vellum-notes/a.md", "_vellum"));
        assert!(!is_in_work_dir("a.md", ""));
    }

    #[test]
    fn builds_from_store_excluding_work_dir() {
        let temp = tempdir().unwrap();
        let store = FsStore::new(temp.path());

        store.mkdir("_vellum/site").unwrap();
        store.mkdir("blog").unwrap();
        store.write_text("index.md", "---\nsite_name: Demo\n---\n# Home").unwrap();
        store.write_text("blog/post.md", "Post").unwrap();
        store.write_text("blog/cover.webp", "img").unwrap();
        store.write_text("blog/data.csv", "a,b").unwrap();
        store.write_text("_vellum/site/index.html", "old").unwrap();
        store.write_text("_vellum/notes.md", "generated").unwrap();

        let entries = store.list_files().unwrap();
        let g = ContentGraph::build(&store, &entries, "_vellum");

        let docs: Vec<&str> = g.documents().iter().map(|d| d.path.as_str()).collect();
        assert_eq!(docs, vec!["blog/post.md", "index.md"]);
        assert_eq!(g.images().len(), 1);
        assert_eq!(g.images()[0].path, "blog/cover.webp");
        assert_eq!(
            g.root_index().unwrap().frontmatter.site_name.as_deref(),
            Some("Demo")
        );
    }
}
