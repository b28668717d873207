//! Static site builder for quire.
//!
//! Walks a tree of Markdown documents, renders each through a template and
//! writes the pages into a mirrored output tree next to the copied static assets.

pub mod assets;
pub mod builder;
pub mod paths;
pub mod templates;
pub mod walker;

pub use builder::{BuildConfig, BuildError, BuildResult, SiteBuilder};
pub use templates::{PageContext, TemplateEngine};
pub use walker::{TreeWalker, WalkStats};
