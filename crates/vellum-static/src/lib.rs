//! Static site generator for vellum.
//!
//! Turns a folder of markdown notes with `[[wiki-style]]` references into a
//! browsable HTML site with navigation, SEO metadata, a sitemap and robots.txt.

pub mod assets;
pub mod builder;
pub mod config;
pub mod graph;
pub mod links;
pub mod navigation;
pub mod paths;
pub mod seo;
pub mod sitemap;
pub mod store;
pub mod templates;
pub mod util;

pub use builder::{remove_dir_all, BuildError, BuildResult, PageError, StaticBuilder};
pub use config::{BuildConfig, SiteConfig};
pub use store::{ContentStore, FsStore, StoreError};
