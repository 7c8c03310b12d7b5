//! Wiki-style reference and embed rewriting.
//!
//! Turns `[[target]]`, `[[target|label]]` and `![[image]]` markers in a
//! markdown body into plain markdown links with paths relative to the page
//! being rendered. Nothing outside the two bracket syntaxes is touched.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::graph::ContentGraph;
use crate::paths::{relative_path, sanitize_segment};

/// Fragment used for references that do not resolve.
pub const BROKEN_LINK: &str = "#broken-link";

/// Fragment used for embeds that do not resolve.
pub const BROKEN_IMAGE: &str = "#broken-image";

// Embeds also match here and are passed through untouched.
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!?\[\[([^\[\]|]+)(?:\|([^\[\]]*))?\]\]").expect("reference pattern is valid")
});

static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[\[([^\[\]|]+)(?:\|[^\[\]]*)?\]\]").expect("embed pattern is valid")
});

/// Rewrites references in document bodies against one content graph.
pub struct LinkRewriter<'a> {
    graph: &'a ContentGraph,
}

impl<'a> LinkRewriter<'a> {
    pub fn new(graph: &'a ContentGraph) -> Self {
        Self { graph }
    }

    /// Rewrite references, then embeds, for the page at `current_output`.
    pub fn rewrite(&self, body: &str, current_output: &str) -> String {
        let body = self.rewrite_references(body, current_output);
        self.rewrite_embeds(&body, current_output)
    }

    /// Rewrite `[[target]]` and `[[target|label]]` into markdown links.
    ///
    /// Unresolved targets point at [`BROKEN_LINK`].
    pub fn rewrite_references(&self, body: &str, current_output: &str) -> String {
        REFERENCE_RE
            .replace_all(body, |caps: &Captures| {
                let whole = &caps[0];
                if whole.starts_with('!') {
                    return whole.to_string();
                }

                let target = caps[1].trim();
                let label = caps
                    .get(2)
                    .map(|m| m.as_str().trim())
                    .filter(|l| !l.is_empty())
                    .unwrap_or(target);

                let dest = self.resolve_reference(target, current_output);
                format!("[{}]({})", label, markdown_destination(&dest))
            })
            .into_owned()
    }

    /// Rewrite `![[image]]` into markdown images.
    ///
    /// Unresolved images keep their reference as alt text and point at
    /// [`BROKEN_IMAGE`].
    pub fn rewrite_embeds(&self, body: &str, current_output: &str) -> String {
        EMBED_RE
            .replace_all(body, |caps: &Captures| {
                let reference = caps[1].trim();
                match self.graph.find_image(reference) {
                    Some(image) => {
                        let dest = relative_path(current_output, &image.output_path());
                        format!("![]({})", markdown_destination(&dest))
                    }
                    None => {
                        tracing::warn!(
                            "Broken image embed '{}' in {}",
                            reference,
                            current_output
                        );
                        format!("![{}]({})", reference, BROKEN_IMAGE)
                    }
                }
            })
            .into_owned()
    }

    fn resolve_reference(&self, target: &str, current_output: &str) -> String {
        let (page, anchor) = match target.split_once('#') {
            Some((page, heading)) => (page.trim(), Some(sanitize_segment(heading))),
            None => (target, None),
        };

        if page.is_empty() {
            return match anchor {
                Some(anchor) => format!("#{anchor}"),
                None => BROKEN_LINK.to_string(),
            };
        }

        match self.graph.find_document(page) {
            Some(doc) => {
                let mut dest = relative_path(current_output, &doc.output_path());
                if let Some(anchor) = anchor {
                    dest.push('#');
                    dest.push_str(&anchor);
                }
                dest
            }
            None => {
                tracing::warn!("Broken link '{}' in {}", target, current_output);
                BROKEN_LINK.to_string()
            }
        }
    }
}

/// Wrap destinations containing spaces in angle brackets.
fn markdown_destination(dest: &str) -> String {
    if dest.contains(' ') {
        format!("<{dest}>")
    } else {
        dest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DocumentNode, ImageNode};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn graph() -> ContentGraph {
        let docs = ["index.md", "blog/post1.md", "blog/Deep Dive.md", "guides/setup/index.md"]
            .iter()
            .map(|p| DocumentNode::parse(p, "", Utc::now()))
            .collect();
        let images = ["images/pic.png", "blog/Screen Shot.png"]
            .iter()
            .map(|p| ImageNode::new(p))
            .collect();
        ContentGraph::new(docs, images)
    }

    #[test]
    fn rewrites_reference_to_relative_link() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("See [[index]]", "blog/post1.html"),
            "See [index](../index.html)"
        );
    }

    #[test]
    fn uses_label_when_given() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("[[Deep Dive|the deep dive]]", "index.html"),
            "[the deep dive](blog/deep-dive.html)"
        );
    }

    #[test]
    fn resolves_folder_index_by_path() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("[[guides/setup/index|Setup]]", "blog/post1.html"),
            "[Setup](../guides/setup/index.html)"
        );
    }

    #[test]
    fn keeps_heading_anchor() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("[[post1#Getting Started]]", "index.html"),
            "[post1#Getting Started](blog/post1.html#getting-started)"
        );
        assert_eq!(
            rewriter.rewrite("[[#Intro|top]]", "index.html"),
            "[top](#intro)"
        );
    }

    #[test]
    fn broken_reference_degrades() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("[[Nowhere|gone]]", "index.html"),
            "[gone](#broken-link)"
        );
    }

    #[test]
    fn rewrites_embeds() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("![[pic.png]]", "blog/post1.html"),
            "![](../images/pic.png)"
        );
        assert_eq!(
            rewriter.rewrite("![[Screen Shot.png|300]]", "blog/post1.html"),
            "![](<Screen Shot.png>)"
        );
    }

    #[test]
    fn broken_embed_degrades() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("![[missing.png]]", "index.html"),
            "![missing.png](#broken-image)"
        );
    }

    #[test]
    fn embed_is_not_treated_as_reference() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        assert_eq!(
            rewriter.rewrite("![[index]] and [[index]]", "index.html"),
            "![index](#broken-image) and [index](index.html)"
        );
    }

    #[test]
    fn leaves_other_markup_alone() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);
        let body = "# Title\n\n[plain](https://example.com) and ![alt](x.png)\n";

        assert_eq!(rewriter.rewrite(body, "index.html"), body);
    }

    #[test]
    fn reference_round_trips_to_target_location() {
        let g = graph();
        let rewriter = LinkRewriter::new(&g);

        let from = "guides/setup/index.html";
        let out = rewriter.rewrite("[[post1]]", from);
        let href = out.trim_start_matches("[post1](").trim_end_matches(')');

        // Resolve the href against the directory of `from`.
        let mut segments: Vec<&str> = from.split('/').collect();
        segments.pop();
        for part in href.split('/') {
            match part {
                ".." => {
                    segments.pop();
                }
                "." => {}
                other => segments.push(other),
            }
        }

        assert_eq!(segments.join("/"), "blog/post1.html");
    }
}
