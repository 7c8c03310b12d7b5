//! Navigation tree mirroring the content folder hierarchy.
//!
//! Folders become groups, `index` documents become the landing page of their
//! folder's group, and every other document becomes a leaf. The tree is built
//! once per run and rendered once per page, so the current page can be
//! highlighted and its ancestors expanded.

use std::collections::HashMap;

use crate::graph::DocumentNode;
use crate::paths::{relative_path, split_parent};
use crate::util::escape_html;

/// Label of the content-root index when it has no title.
const HOME_LABEL: &str = "Home";

/// A navigation entry.
///
/// A node with children and no output path is a plain folder group. A node
/// with an output path and no children is a page. A node with both is a
/// folder whose index page is also its label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavNode {
    /// Display name
    pub name: String,
    /// Source document path, empty for folders without an index
    pub source_path: String,
    /// Output path, empty for folders without an index
    pub output_path: String,
    pub children: Vec<NavNode>,
    pub is_index: bool,
}

impl NavNode {
    fn folder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_path: String::new(),
            output_path: String::new(),
            children: Vec::new(),
            is_index: false,
        }
    }

    fn page(doc: &DocumentNode, name: &str) -> Self {
        Self {
            name: name.to_string(),
            source_path: doc.path.clone(),
            output_path: doc.output_path(),
            children: Vec::new(),
            is_index: doc.is_index(),
        }
    }

    pub fn has_page(&self) -> bool {
        !self.output_path.is_empty()
    }

    /// Whether `output_path` is this node or any of its descendants.
    pub fn contains(&self, output_path: &str) -> bool {
        self.output_path == output_path || self.children.iter().any(|c| c.contains(output_path))
    }
}

/// Flat node storage used while building; children refer to indices.
struct Arena {
    nodes: Vec<NavNode>,
    children: Vec<Vec<usize>>,
}

impl Arena {
    fn push(&mut self, node: NavNode) -> usize {
        self.nodes.push(node);
        self.children.push(Vec::new());
        self.nodes.len() - 1
    }

    fn into_tree(mut self, roots: &[usize]) -> Vec<NavNode> {
        roots.iter().map(|&idx| self.take(idx)).collect()
    }

    fn take(&mut self, idx: usize) -> NavNode {
        let child_ids = std::mem::take(&mut self.children[idx]);
        let children = child_ids.into_iter().map(|c| self.take(c)).collect();
        let mut node = std::mem::replace(&mut self.nodes[idx], NavNode::folder(""));
        node.children = children;
        node
    }
}

/// Build the navigation tree for a set of documents.
///
/// Documents are processed in source path order, so the result does not
/// depend on the order they were listed in.
pub fn build_navigation(documents: &[DocumentNode]) -> Vec<NavNode> {
    let mut sorted: Vec<&DocumentNode> = documents.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));

    let mut arena = Arena {
        nodes: Vec::new(),
        children: Vec::new(),
    };
    let mut roots: Vec<usize> = Vec::new();
    let mut folders: HashMap<String, usize> = HashMap::new();

    for doc in sorted {
        let (dir, _) = split_parent(&doc.path);

        // Create or reuse the folder chain for this document.
        let mut parent: Option<usize> = None;
        let mut cumulative = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if !cumulative.is_empty() {
                cumulative.push('/');
            }
            cumulative.push_str(segment);

            let idx = match folders.get(&cumulative) {
                Some(&idx) => idx,
                None => {
                    let idx = arena.push(NavNode::folder(segment));
                    match parent {
                        Some(p) => arena.children[p].push(idx),
                        None => roots.push(idx),
                    }
                    folders.insert(cumulative.clone(), idx);
                    idx
                }
            };
            parent = Some(idx);
        }

        match parent {
            Some(folder) if doc.is_index() => {
                let node = &mut arena.nodes[folder];
                node.source_path = doc.path.clone();
                node.output_path = doc.output_path();
                node.is_index = true;
            }
            Some(folder) => {
                let idx = arena.push(NavNode::page(doc, doc.title()));
                arena.children[folder].push(idx);
            }
            None => {
                let name = if doc.is_index() && doc.frontmatter.title.is_none() {
                    HOME_LABEL
                } else {
                    doc.title()
                };
                let idx = arena.push(NavNode::page(doc, name));
                roots.push(idx);
            }
        }
    }

    arena.into_tree(&roots)
}

/// Render the tree as nested lists for the page at `current_output`.
///
/// Links are relative to that page. Groups containing it are expanded and
/// the matching entry is marked active.
pub fn render_tree(nodes: &[NavNode], current_output: &str) -> String {
    let mut html = String::new();
    render_list(&mut html, nodes, current_output, "nav-list");
    html
}

fn render_list(html: &mut String, nodes: &[NavNode], current: &str, class: &str) {
    html.push_str(&format!(r#"<ul class="{class}">"#));
    for node in nodes {
        render_node(html, node, current);
    }
    html.push_str("</ul>");
}

fn render_node(html: &mut String, node: &NavNode, current: &str) {
    let active = node.has_page() && node.output_path == current;
    let label = label_html(node, current, active);

    if node.children.is_empty() {
        let class = if active { "nav-item active" } else { "nav-item" };
        html.push_str(&format!(r#"<li class="{class}">{label}</li>"#));
        return;
    }

    let class = if active { "nav-folder active" } else { "nav-folder" };
    let open = if node.contains(current) { " open" } else { "" };
    html.push_str(&format!(
        r#"<li class="{class}"><details{open}><summary>{label}</summary>"#
    ));
    render_list(html, &node.children, current, "nav-children");
    html.push_str("</details></li>");
}

fn label_html(node: &NavNode, current: &str, active: bool) -> String {
    let name = escape_html(&node.name);
    if !node.has_page() {
        return format!(r#"<span class="nav-label">{name}</span>"#);
    }

    let href = escape_html(&relative_path(current, &node.output_path)).into_owned();
    if active {
        format!(r#"<a href="{href}" aria-current="page">{name}</a>"#)
    } else {
        format!(r#"<a href="{href}">{name}</a>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn docs(paths: &[&str]) -> Vec<DocumentNode> {
        paths
            .iter()
            .map(|p| DocumentNode::parse(p, "", Utc::now()))
            .collect()
    }

    fn find<'a>(nodes: &'a [NavNode], output: &str, trail: &mut Vec<&'a NavNode>) -> usize {
        let mut count = 0;
        for node in nodes {
            if node.output_path == output {
                count += 1;
                trail.push(node);
            }
            count += find(&node.children, output, trail);
        }
        count
    }

    #[test]
    fn builds_folder_tree() {
        let nav = build_navigation(&docs(&[
            "index.md",
            "about.md",
            "blog/index.md",
            "blog/post1.md",
            "blog/2024/recap.md",
        ]));

        let names: Vec<&str> = nav.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["about", "blog", "Home"]);

        let blog = &nav[1];
        assert!(blog.is_index);
        assert_eq!(blog.output_path, "blog/index.html");
        assert_eq!(blog.source_path, "blog/index.md");

        let children: Vec<&str> = blog.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(children, vec!["2024", "post1"]);

        let year = &blog.children[0];
        assert!(!year.has_page());
        assert_eq!(year.children[0].output_path, "blog/2024/recap.html");
    }

    #[test]
    fn index_seen_after_children_attaches_to_existing_folder() {
        let nav = build_navigation(&docs(&["guide/a.md", "guide/index.md"]));

        assert_eq!(nav.len(), 1);
        assert_eq!(nav[0].output_path, "guide/index.html");
        assert_eq!(nav[0].children.len(), 1);
    }

    #[test]
    fn uses_titles_for_pages() {
        let documents = vec![
            DocumentNode::parse("notes/a.md", "---\ntitle: Alpha\n---\n", Utc::now()),
            DocumentNode::parse("index.md", "---\ntitle: Welcome\n---\n", Utc::now()),
        ];

        let nav = build_navigation(&documents);

        assert_eq!(nav[0].name, "Welcome");
        assert_eq!(nav[1].name, "notes");
        assert_eq!(nav[1].children[0].name, "Alpha");
    }

    #[test]
    fn every_document_appears_exactly_once_under_its_folders() {
        let documents = docs(&[
            "index.md",
            "x/index.md",
            "x/y/z.md",
            "x/y/index.md",
            "x/w.md",
            "q/r/s/t.md",
        ]);
        let nav = build_navigation(&documents);

        for doc in &documents {
            let mut trail = Vec::new();
            let output = doc.output_path();
            assert_eq!(find(&nav, &output, &mut trail), 1, "{output}");
        }

        // q/r/s are folder-only groups on the way to t.
        let q = nav.iter().find(|n| n.name == "q").unwrap();
        assert!(!q.has_page());
        assert_eq!(q.children[0].children[0].children[0].output_path, "q/r/s/t.html");
    }

    #[test]
    fn construction_ignores_input_order() {
        let a = build_navigation(&docs(&["b/one.md", "a.md", "b/index.md"]));
        let b = build_navigation(&docs(&["b/index.md", "a.md", "b/one.md"]));

        assert_eq!(a, b);
    }

    #[test]
    fn renders_active_page_and_expands_ancestors() {
        let nav = build_navigation(&docs(&[
            "index.md",
            "blog/index.md",
            "blog/post1.md",
            "docs/intro.md",
        ]));

        let html = render_tree(&nav, "blog/post1.html");

        assert!(html.starts_with(r#"<ul class="nav-list">"#));
        assert!(html.contains(
            r#"<li class="nav-folder"><details open><summary><a href="index.html">blog</a></summary>"#
        ));
        assert!(html.contains(
            r#"<li class="nav-item active"><a href="post1.html" aria-current="page">post1</a></li>"#
        ));
        assert!(html.contains(
            r#"<li class="nav-folder"><details><summary><span class="nav-label">docs</span></summary>"#
        ));
        assert!(html.contains(r#"<a href="../index.html">Home</a>"#));
    }

    #[test]
    fn renders_complete_markup() {
        let nav = build_navigation(&docs(&["index.md", "notes/a.md"]));

        let html = render_tree(&nav, "notes/a.html");

        assert_eq!(
            html,
            concat!(
                r#"<ul class="nav-list">"#,
                r#"<li class="nav-item"><a href="../index.html">Home</a></li>"#,
                r#"<li class="nav-folder"><details open><summary><span class="nav-label">notes</span></summary>"#,
                r#"<ul class="nav-children">"#,
                r#"<li class="nav-item active"><a href="a.html" aria-current="page">a</a></li>"#,
                "</ul></details></li></ul>",
            )
        );
    }

    #[test]
    fn folder_index_is_active_on_its_own_page() {
        let nav = build_navigation(&docs(&["blog/index.md", "blog/post1.md"]));

        let html = render_tree(&nav, "blog/index.html");

        assert!(html.contains(r#"<li class="nav-folder active"><details open>"#));
    }

    #[test]
    fn escapes_names() {
        let nav = build_navigation(&docs(&["Q&A.md"]));

        let html = render_tree(&nav, "index.html");

        assert!(html.contains(">Q&amp;A</a>"));
    }
}
