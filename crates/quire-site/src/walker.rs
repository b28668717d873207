//! Recursive source tree walk and per-document rendering.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use quire_markdown::{Converter, Frontmatter};
use tokio::task::JoinSet;

use crate::builder::BuildError;
use crate::paths;
use crate::templates::{PageContext, TemplateEngine};

/// Counters collected during a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Pages rendered and written
    pub pages: usize,
    /// Subdirectories mirrored into the output tree
    pub directories: usize,
    /// Non-Markdown files and looping directory links left alone
    pub skipped: usize,
}

/// Kind of a directory entry, resolved through symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
}

type WalkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), BuildError>> + Send + 'a>>;

/// Walks a source tree and renders every Markdown document into the output tree.
pub struct TreeWalker<'a> {
    pub converter: &'a Converter,
    pub templates: &'a TemplateEngine,
    pub source_root: &'a Path,
    pub output_root: &'a Path,
    pub default_template: &'a str,
}

impl TreeWalker<'_> {
    /// Walk `dir` and everything below it.
    pub async fn walk(&self, dir: &Path) -> Result<WalkStats, BuildError> {
        let mut stats = WalkStats::default();
        let mut ancestors = Vec::new();
        self.walk_dir(dir.to_path_buf(), &mut ancestors, &mut stats).await?;
        Ok(stats)
    }

    /// `ancestors` holds the canonical paths of the directories being walked,
    /// outermost first.
    fn walk_dir<'s>(
        &'s self,
        dir: PathBuf,
        ancestors: &'s mut Vec<PathBuf>,
        stats: &'s mut WalkStats,
    ) -> WalkFuture<'s> {
        Box::pin(async move {
            ancestors.push(canonical(&dir).await?);

            for (path, kind) in list_entries(&dir).await? {
                match kind {
                    EntryKind::Directory => {
                        let target = canonical(&path).await?;
                        if ancestors.contains(&target) {
                            tracing::warn!(
                                "Skipping {}: links back to {}",
                                path.display(),
                                target.display()
                            );
                            stats.skipped += 1;
                            continue;
                        }

                        tracing::debug!("Directory: {}", path.display());

                        let mirrored =
                            paths::mirrored_dir(self.source_root, self.output_root, &path);
                        tokio::fs::create_dir_all(&mirrored).await.map_err(|e| {
                            BuildError::WriteError(format!("{}: {}", mirrored.display(), e))
                        })?;
                        stats.directories += 1;

                        self.walk_dir(path, &mut *ancestors, &mut *stats).await?;
                    }
                    EntryKind::File if paths::is_markdown(&path) => {
                        tracing::debug!("File: {}", path.display());
                        self.build_page(&path).await?;
                        stats.pages += 1;
                    }
                    EntryKind::File => {
                        tracing::debug!("Skipping non-Markdown file: {}", path.display());
                        stats.skipped += 1;
                    }
                }
            }

            ancestors.pop();
            Ok(())
        })
    }

    /// Convert, render and write a single document. Returns the page path.
    pub async fn build_page(&self, path: &Path) -> Result<PathBuf, BuildError> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))?;

        let doc = self
            .converter
            .convert(&source)
            .map_err(|e| BuildError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let parent = path.parent().unwrap_or(self.source_root);
        let relative = paths::relative_dir(self.source_root, parent);
        let output_dir = self.output_root.join(&relative);
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| BuildError::WriteError(format!("{}: {}", output_dir.display(), e)))?;

        let static_path = paths::static_path(&relative);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let template = doc
            .frontmatter
            .as_ref()
            .and_then(Frontmatter::template)
            .unwrap_or(self.default_template);

        let context = PageContext {
            content: &doc.html,
            static_path: &static_path,
            slug: &stem,
            metadata: doc.frontmatter.as_ref(),
        };

        let html = self
            .templates
            .render_page(template, &context)
            .map_err(|e| BuildError::TemplateError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let output_path = paths::page_output_path(self.output_root, &relative, &stem);
        tokio::fs::write(&output_path, html)
            .await
            .map_err(|e| BuildError::WriteError(format!("{}: {}", output_path.display(), e)))?;

        tracing::debug!(
            "Rendered {} -> {} (template '{}')",
            path.display(),
            output_path.display(),
            template
        );

        Ok(output_path)
    }
}

async fn canonical(path: &Path) -> Result<PathBuf, BuildError> {
    tokio::fs::canonicalize(path)
        .await
        .map_err(|e| BuildError::ReadError(format!("{}: {}", path.display(), e)))
}

/// List a directory in file-name order, stat'ing all entries concurrently.
///
/// An empty directory yields an empty list.
async fn list_entries(dir: &Path) -> Result<Vec<(PathBuf, EntryKind)>, BuildError> {
    let read_error =
        |e: std::io::Error| BuildError::ReadError(format!("{}: {}", dir.display(), e));

    let mut read_dir = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(read_error)? {
        entries.push(entry.path());
    }
    entries.sort();

    let mut stats = JoinSet::new();
    for (index, path) in entries.iter().enumerate() {
        let path = path.clone();
        stats.spawn(async move { (index, tokio::fs::metadata(path).await) });
    }

    let mut kinds = vec![EntryKind::File; entries.len()];
    while let Some(joined) = stats.join_next().await {
        let (index, metadata) = joined.map_err(|e| BuildError::ReadError(e.to_string()))?;
        let metadata = metadata.map_err(|e| {
            BuildError::ReadError(format!("{}: {}", entries[index].display(), e))
        })?;
        if metadata.is_dir() {
            kinds[index] = EntryKind::Directory;
        }
    }

    Ok(entries.into_iter().zip(kinds).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn lists_entries_in_name_order() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("b-dir")).unwrap();
        fs::write(temp.path().join("c.md"), "").unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();

        let entries = list_entries(temp.path()).await.unwrap();

        let names: Vec<_> = entries
            .iter()
            .map(|(p, k)| (p.file_name().unwrap().to_str().unwrap().to_string(), *k))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.txt".to_string(), EntryKind::File),
                ("b-dir".to_string(), EntryKind::Directory),
                ("c.md".to_string(), EntryKind::File),
            ]
        );
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let temp = tempdir().unwrap();

        let entries = list_entries(temp.path()).await.unwrap();

        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_a_read_error() {
        let temp = tempdir().unwrap();

        let result = list_entries(&temp.path().join("missing")).await;

        assert!(matches!(result, Err(BuildError::ReadError(_))));
    }

    #[tokio::test]
    async fn builds_a_single_page() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("build");
        let templates_dir = temp.path().join("templates");
        fs::create_dir_all(src.join("notes")).unwrap();
        fs::create_dir_all(&templates_dir).unwrap();
        fs::write(
            templates_dir.join("base.html"),
            "{{ slug }}|{{ static }}|{{ content }}",
        )
        .unwrap();
        fs::write(src.join("notes/todo.md"), "- milk").unwrap();

        let converter = Converter::default();
        let templates = TemplateEngine::new(&templates_dir, "html");
        let walker = TreeWalker {
            converter: &converter,
            templates: &templates,
            source_root: &src,
            output_root: &out,
            default_template: "base",
        };

        let output = walker.build_page(&src.join("notes/todo.md")).await.unwrap();

        assert_eq!(output, out.join("notes/todo.html"));
        assert_eq!(
            fs::read_to_string(output).unwrap(),
            "todo|../static|<ul>\n<li>milk</li>\n</ul>\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn skips_directory_links_back_to_an_ancestor() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        let out = temp.path().join("build");
        let templates_dir = temp.path().join("templates");
        let shared = temp.path().join("shared");
        fs::create_dir_all(src.join("docs")).unwrap();
        fs::create_dir_all(&shared).unwrap();
        fs::create_dir_all(&templates_dir).unwrap();
        fs::write(templates_dir.join("base.html"), "{{ content }}").unwrap();
        fs::write(src.join("docs/page.md"), "# Page").unwrap();
        fs::write(shared.join("note.md"), "note").unwrap();
        symlink(&src, src.join("docs/loop")).unwrap();
        symlink(&shared, src.join("shared")).unwrap();
        // An indirect cycle: shared/back -> src -> shared
        symlink(&src, shared.join("back")).unwrap();

        let converter = Converter::default();
        let templates = TemplateEngine::new(&templates_dir, "html");
        let walker = TreeWalker {
            converter: &converter,
            templates: &templates,
            source_root: &src,
            output_root: &out,
            default_template: "base",
        };

        let stats = walker.walk(&src).await.unwrap();

        assert_eq!(stats.pages, 2);
        assert_eq!(stats.directories, 2);
        assert_eq!(stats.skipped, 2);
        assert!(out.join("docs/page.html").is_file());
        assert!(out.join("shared/note.html").is_file());
        assert!(!out.join("docs/loop").exists());
        assert!(!out.join("shared/back").exists());
    }
}
