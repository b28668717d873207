//! Static site builder.

use std::path::{Path, PathBuf};
use std::time::Instant;

use quire_markdown::{ConvertOptions, Converter};

use crate::assets;
use crate::paths::STATIC_DIR_NAME;
use crate::templates::TemplateEngine;
use crate::walker::TreeWalker;

/// Configuration for building a site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Markdown source tree
    pub source_dir: PathBuf,

    /// Generated output tree
    pub output_dir: PathBuf,

    /// Directory holding `<name>.<template_extension>` templates
    pub template_dir: PathBuf,

    /// Assets copied verbatim to `<output_dir>/static`
    pub static_dir: PathBuf,

    /// Clear the output directory before building
    pub erase_output: bool,

    /// Template used when a document declares none
    pub default_template: String,

    /// Extension appended to template names
    pub template_extension: String,

    /// Markdown extensions
    pub markdown: ConvertOptions,
}

impl BuildConfig {
    /// Standard `src`/`build`/`templates`/`static` layout under `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            source_dir: root.join("src"),
            output_dir: root.join("build"),
            template_dir: root.join("templates"),
            static_dir: root.join("static"),
            erase_output: true,
            default_template: "base".to_string(),
            template_extension: "html".to_string(),
            markdown: ConvertOptions::default(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::from_root(".")
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of pages generated
    pub pages: usize,

    /// Number of source subdirectories mirrored
    pub directories: usize,

    /// Number of static files copied
    pub assets: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read: {0}")]
    ReadError(String),

    #[error("Failed to parse Markdown: {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Failed to render template for {path}: {message}")]
    TemplateError { path: String, message: String },

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
///
/// Owns the converter and template engine for one run; the walker borrows them.
pub struct SiteBuilder {
    config: BuildConfig,
    converter: Converter,
    templates: TemplateEngine,
}

impl SiteBuilder {
    /// Create a new site builder.
    pub fn new(config: BuildConfig) -> Self {
        let converter = Converter::new(config.markdown);
        let templates = TemplateEngine::new(&config.template_dir, &config.template_extension);

        Self {
            config,
            converter,
            templates,
        }
    }

    /// Build the site.
    pub async fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        self.prepare_directories().await?;

        if self.config.erase_output {
            let removed = assets::empty_dir(&self.config.output_dir)
                .await
                .map_err(|e| {
                    BuildError::WriteError(format!("{}: {}", self.config.output_dir.display(), e))
                })?;
            tracing::debug!(
                "Erased {} entries from {}",
                removed,
                self.config.output_dir.display()
            );
        }

        let walker = TreeWalker {
            converter: &self.converter,
            templates: &self.templates,
            source_root: &self.config.source_dir,
            output_root: &self.config.output_dir,
            default_template: &self.config.default_template,
        };
        let stats = walker.walk(&self.config.source_dir).await?;
        tracing::debug!(
            "Rendered {} pages across {} directories, skipped {} other files",
            stats.pages,
            stats.directories,
            stats.skipped
        );

        let assets = self.copy_static().await?;

        let duration = start.elapsed();

        Ok(BuildResult {
            pages: stats.pages,
            directories: stats.directories,
            assets,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Ensure the output, source, template and static roots exist.
    async fn prepare_directories(&self) -> Result<(), BuildError> {
        for dir in [
            &self.config.output_dir,
            &self.config.source_dir,
            &self.config.template_dir,
            &self.config.static_dir,
        ] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| BuildError::WriteError(format!("{}: {}", dir.display(), e)))?;
        }

        Ok(())
    }

    /// Copy the static directory to `<output>/static`.
    async fn copy_static(&self) -> Result<usize, BuildError> {
        let src = self.config.static_dir.clone();
        let dst = self.config.output_dir.join(STATIC_DIR_NAME);

        let copied = tokio::task::spawn_blocking(move || assets::copy_tree(&src, &dst))
            .await
            .map_err(|e| BuildError::WriteError(e.to_string()))?
            .map_err(|e| {
                BuildError::WriteError(format!(
                    "copying {}: {}",
                    self.config.static_dir.display(),
                    e
                ))
            })?;

        tracing::debug!("Copied {} static files", copied);

        Ok(copied)
    }
}
