//! Removal of directories left empty by an organization run.

use crate::error::CleanupError;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Deletes every empty directory below `root` (never `root` itself) and returns
/// how many were removed.
///
/// The walk is post-order, so a directory is inspected only after all of its
/// children have been handled; a parent emptied by the removal of its last child
/// is removed in the same pass. Symlinks are not followed. Directories that
/// cannot be read or removed are logged and left in place, and an unreadable
/// directory's contents are not visited.
///
/// # Errors
///
/// Fails only if `root` itself cannot be read.
///
/// # Examples
///
/// ```no_run
/// use folder_organizer::cleanup::cleanup_empty_directories;
/// use std::path::Path;
///
/// let removed = cleanup_empty_directories(Path::new("/home/me/Downloads"))?;
/// println!("removed {} empty directories", removed);
/// # Ok::<(), folder_organizer::error::CleanupError>(())
/// ```
pub fn cleanup_empty_directories(root: &Path) -> Result<usize, CleanupError> {
    fs::read_dir(root).map_err(|source| CleanupError::InaccessibleRoot {
        path: root.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read directory, skipping");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        match is_empty_dir(path) {
            Ok(true) => match fs::remove_dir(path) {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "removed empty directory");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot remove directory");
                }
            },
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "cannot read directory");
            }
        }
    }

    tracing::info!(root = %root.display(), removed, "empty directory cleanup finished");
    Ok(removed)
}

fn is_empty_dir(path: &Path) -> std::io::Result<bool> {
    Ok(fs::read_dir(path)?.next().is_none())
}
