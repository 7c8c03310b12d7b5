//! Default files seeded into the working area, and robots.txt.

/// Seeded files, by purpose.
pub struct DefaultAssets;

impl DefaultAssets {
    /// The default page template.
    pub fn template() -> &'static str {
        DEFAULT_TEMPLATE
    }

    /// The default stylesheet.
    pub fn stylesheet() -> &'static str {
        DEFAULT_CSS
    }

    /// README explaining the working area.
    pub fn readme() -> &'static str {
        DEFAULT_README
    }
}

/// Generated robots.txt pointing crawlers at the sitemap.
pub fn default_robots(site_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\n\nSitemap: {}/sitemap.xml",
        site_url.trim_end_matches('/')
    )
}

const DEFAULT_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }} | {{ siteName }}</title>
  <link rel="canonical" href="{{ canonicalUrl }}">
  {{ seoMetaTags }}
  {{ seoStructuredData }}
  <link rel="stylesheet" href="{{ styleSheet }}">
</head>
<body>
  <div class="layout">
    <nav class="sidebar">
      <div class="nav-header">
        <a href="{{ rootPath }}index.html" class="nav-logo">{{ siteName }}</a>
      </div>
      {{ navigation }}
    </nav>
    <main class="main">
      <article class="content">
        <h1>{{ title }}</h1>
        {{ content }}
      </article>
    </main>
  </div>
</body>
</html>
"##;

const DEFAULT_CSS: &str = r##"/* vellum default theme */

:root {
  --sidebar-width: 280px;
  --content-max-width: 760px;
  --background: #ffffff;
  --foreground: #1f2328;
  --muted: #f6f8fa;
  --muted-foreground: #59636e;
  --border: #d1d9e0;
  --primary: #0969da;
  --primary-foreground: #ffffff;
  --radius: 0.375rem;
}

* {
  box-sizing: border-box;
  margin: 0;
  padding: 0;
}

body {
  font-family: system-ui, -apple-system, sans-serif;
  background: var(--background);
  color: var(--foreground);
  line-height: 1.6;
}

.layout {
  display: grid;
  grid-template-columns: var(--sidebar-width) 1fr;
  min-height: 100vh;
}

/* Sidebar */
.sidebar {
  background: var(--muted);
  border-right: 1px solid var(--border);
  padding: 1.5rem;
  position: sticky;
  top: 0;
  height: 100vh;
  overflow-y: auto;
}

.nav-header {
  margin-bottom: 1.5rem;
}

.nav-logo {
  font-weight: 700;
  font-size: 1.25rem;
  color: var(--foreground);
  text-decoration: none;
}

.nav-list,
.nav-children {
  list-style: none;
}

.nav-children {
  margin-left: 1rem;
}

.nav-item a,
.nav-folder summary {
  display: block;
  padding: 0.25rem 0.5rem;
  color: var(--muted-foreground);
  text-decoration: none;
  border-radius: var(--radius);
  cursor: pointer;
}

.nav-folder summary a {
  display: inline;
  padding: 0;
}

.nav-item.active > a,
.nav-folder.active > details > summary {
  background: var(--primary);
  color: var(--primary-foreground);
}

.nav-folder.active > details > summary a {
  color: inherit;
}

/* Main content */
.main {
  padding: 2rem;
}

.content {
  max-width: var(--content-max-width);
}

.content h1 {
  font-size: 2.25rem;
  margin-bottom: 1.5rem;
}

.content h2 {
  font-size: 1.5rem;
  margin: 2rem 0 1rem;
  padding-bottom: 0.5rem;
  border-bottom: 1px solid var(--border);
}

.content p,
.content ul,
.content ol,
.content table {
  margin-bottom: 1rem;
}

.content li {
  margin-left: 1.5rem;
}

.content a {
  color: var(--primary);
  text-underline-offset: 4px;
}

.content a[href="#broken-link"] {
  color: var(--muted-foreground);
  text-decoration: line-through;
  pointer-events: none;
}

.content img {
  max-width: 100%;
}

.content img[src="#broken-image"] {
  display: inline-block;
  padding: 0.25rem 0.5rem;
  border: 1px dashed var(--border);
  color: var(--muted-foreground);
}

.content pre {
  background: var(--muted);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 1rem;
  overflow-x: auto;
  margin-bottom: 1rem;
}

.content code {
  font-family: ui-monospace, monospace;
  font-size: 0.875em;
}

.content th,
.content td {
  border: 1px solid var(--border);
  padding: 0.25rem 0.75rem;
}

@media (max-width: 1024px) {
  .layout {
    grid-template-columns: 1fr;
  }

  .sidebar {
    position: static;
    height: auto;
  }
}
"##;

const DEFAULT_README: &str = r#"# vellum working area

This folder belongs to the site generator. Nothing in it is published as a page.

- `templates/` holds page templates. `default.html` is used unless a page sets
  `page_template` in its front-matter.
- `css/` holds stylesheets. Every file is copied to `css/` in the built site.
  `default.css` is used unless a page sets `page_css`.
- `robots.txt`, if present, replaces the generated one.
- `site/` is the built site. It is deleted and rebuilt on every run.

Templates substitute these placeholders: `{{ title }}`, `{{ siteName }}`,
`{{ rootPath }}`, `{{ content }}`, `{{ navigation }}`, `{{ styleSheet }}`,
`{{ seoMetaTags }}`, `{{ seoStructuredData }}`, `{{ canonicalUrl }}`.

Files here are only created when missing, so edits are kept across builds.
"#;
