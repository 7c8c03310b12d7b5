//! Create a starter site.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::build::load_config;

/// Run the init command.
pub async fn run(config_path: &Path, dir: Option<PathBuf>, yes: bool) -> Result<()> {
    tracing::info!("Initializing vellum...");

    let content_dir = match dir {
        Some(dir) => dir,
        None => load_config(config_path)?.content.dir,
    };
    fs::create_dir_all(&content_dir)
        .with_context(|| format!("Failed to create {}", content_dir.display()))?;

    write_starter(config_path, DEFAULT_CONFIG, yes)?;
    for (rel, content) in STARTER_PAGES {
        write_starter(&content_dir.join(rel), content, yes)?;
    }

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'vellum build' to build the site.");

    Ok(())
}

/// Write `content` to `path` unless it exists and `overwrite` is off.
fn write_starter(path: &Path, content: &str, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(true)
}

const DEFAULT_CONFIG: &str = r#"# Vellum Configuration

[content]
# Folder holding your markdown notes
dir = "."

[build]
# Working area for templates, stylesheets and the built site
work_dir = "_vellum"

# Documents rendered concurrently
batch_size = 5
"#;

const STARTER_PAGES: [(&str, &str); 3] = [
    ("index.md", DEFAULT_INDEX),
    ("guides/index.md", DEFAULT_GUIDES_INDEX),
    ("guides/first-steps.md", DEFAULT_FIRST_STEPS),
];

const DEFAULT_INDEX: &str = r#"---
site_name: My Site
site_url: https://example.com
description: Notes published with vellum
---

# Welcome

This site is built from a folder of markdown notes.

Start with the [[guides/index|guides]], or jump straight to [[first-steps]].
"#;

const DEFAULT_GUIDES_INDEX: &str = r#"---
title: Guides
---

Every folder can have an `index.md`. It becomes the folder's page in the
navigation.

- [[first-steps]]
"#;

const DEFAULT_FIRST_STEPS: &str = r#"---
title: First Steps
published_date: 2024-01-01
---

## Linking

Link to another note with `[[note name]]` or `[[note name|label]]`.
Jump to a heading with `[[note name#Heading]]`.

## Images

Embed an image with `![[picture.png]]`.

## Building

Run `vellum build`. The site is written to `_vellum/site`.
Templates and stylesheets in `_vellum/` can be edited freely.

Back to [[index|home]].
"#;
