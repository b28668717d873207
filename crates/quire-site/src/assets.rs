//! Output directory housekeeping and static asset copying.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Remove everything inside `dir`, keeping the directory itself.
///
/// Creates the directory if it does not exist. Returns the number of
/// top-level entries removed.
pub async fn empty_dir(dir: &Path) -> io::Result<usize> {
    tokio::fs::create_dir_all(dir).await?;

    let mut removed = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();

        // Symlinks are removed, never followed
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        removed += 1;
    }

    Ok(removed)
}

/// Recursively copy `src` into `dst`, overwriting files that already exist.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &target)?;
        copied += 1;
    }

    Ok(copied)
}
