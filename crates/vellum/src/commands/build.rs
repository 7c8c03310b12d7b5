//! Static site build command.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{ensure, Result};
use serde::Deserialize;
use vellum_static::{BuildConfig, FsStore, StaticBuilder};

/// Configuration file structure (vellum.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub content: ContentSettings,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct ContentSettings {
    #[serde(default = "default_content_dir")]
    pub dir: PathBuf,
}

impl Default for ContentSettings {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    /// Working area, relative to the content directory
    pub work_dir: Option<String>,
    /// Output directory, relative to the content directory
    pub output: Option<String>,
    pub batch_size: Option<usize>,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from(".")
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub content_dir: Option<PathBuf>,
    pub output: Option<String>,
    pub batch_size: Option<usize>,
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        tracing::info!("Loaded config from {}", path.display());
        return Ok(config);
    }
    Ok(ConfigFile::default())
}

/// Whether `path` is a non-empty relative path with no `.` or `..` segments.
fn is_plain_relative(path: &str) -> bool {
    !path.is_empty()
        && path
            .split('/')
            .all(|segment| !matches!(segment, "" | "." | ".."))
}

/// Merge file settings and command-line overrides.
///
/// The output directory is wiped on every build, so it must sit inside the
/// working area.
fn resolve(file: ConfigFile, overrides: Overrides) -> Result<(PathBuf, BuildConfig)> {
    let mut config = match file.build.work_dir {
        Some(work_dir) => BuildConfig::with_work_dir(work_dir),
        None => BuildConfig::default(),
    };
    ensure!(
        is_plain_relative(&config.work_dir),
        "work_dir '{}' must be a folder inside the content directory",
        config.work_dir
    );

    if let Some(output) = overrides.output.or(file.build.output) {
        config.output_dir = output.trim_matches('/').to_string();
    }
    let inside_work_dir = config
        .output_dir
        .strip_prefix(config.work_dir.as_str())
        .is_some_and(|rest| rest.starts_with('/'));
    ensure!(
        is_plain_relative(&config.output_dir) && inside_work_dir,
        "output '{}' must be a folder inside the working area '{}'",
        config.output_dir,
        config.work_dir
    );

    if let Some(batch_size) = overrides.batch_size.or(file.build.batch_size) {
        ensure!(batch_size > 0, "batch_size must be at least 1");
        config.batch_size = batch_size;
    }

    let content_dir = overrides.content_dir.unwrap_or(file.content.dir);
    Ok((content_dir, config))
}

/// Run the build command.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building static site...");

    let (content_dir, config) = resolve(load_config(config_path)?, overrides)?;
    ensure!(
        content_dir.is_dir(),
        "Content directory {} does not exist",
        content_dir.display()
    );

    let store = Arc::new(FsStore::new(&content_dir));
    let result = StaticBuilder::new(config, store).build().await?;

    tracing::info!(
        "Built {} pages and copied {} images in {}ms",
        result.pages,
        result.images,
        result.duration_ms
    );
    if result.failed > 0 {
        tracing::warn!("{} documents failed to build", result.failed);
    }

    tracing::info!("Output: {}", content_dir.join(&result.output_dir).display());

    Ok(())
}
