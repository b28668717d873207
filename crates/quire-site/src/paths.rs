//! Path arithmetic between the source and output trees.

use std::path::{Component, Path, PathBuf};

/// Name of the static asset directory inside the output tree.
pub const STATIC_DIR_NAME: &str = "static";

/// Extension of documents that get rendered.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Extension of rendered pages.
pub const PAGE_EXTENSION: &str = "html";

/// Check whether a file is a Markdown document.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}

/// Path of `dir` relative to `root`, or empty when `dir` is not under `root`.
pub fn relative_dir(root: &Path, dir: &Path) -> PathBuf {
    dir.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Location a source directory is mirrored to in the output tree.
pub fn mirrored_dir(source_root: &Path, output_root: &Path, dir: &Path) -> PathBuf {
    output_root.join(relative_dir(source_root, dir))
}

/// Output file for a page rendered from `<relative_dir>/<stem>.md`.
pub fn page_output_path(output_root: &Path, relative_dir: &Path, stem: &str) -> PathBuf {
    output_root
        .join(relative_dir)
        .join(format!("{}.{}", stem, PAGE_EXTENSION))
}

/// Relative link from a page's output directory to the output `static` directory.
///
/// Always uses forward slashes: `static` at the root, `../static` one level
/// down, `../../static` two levels down.
pub fn static_path(relative_dir: &Path) -> String {
    let depth = relative_dir
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();

    let mut path = "../".repeat(depth);
    path.push_str(STATIC_DIR_NAME);
    path
}
