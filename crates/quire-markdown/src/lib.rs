//! Markdown converter with front-matter extraction.
//!
//! This crate turns a Markdown document into an HTML fragment and pulls the
//! YAML front-matter block at its top into a flat string mapping.

pub mod convert;
pub mod frontmatter;

pub use convert::{ConvertError, ConvertOptions, Converted, Converter};
pub use frontmatter::{Frontmatter, FrontmatterError};
