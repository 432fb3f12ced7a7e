//! Working-tree enumeration.

use std::path::{Path, PathBuf};

use faultscan_core::errors::ClassifyError;
use faultscan_core::Language;
use walkdir::WalkDir;

/// Version-control metadata directory, never part of the source tree.
const VCS_DIR: &str = ".git";

/// Every regular file with a supported suffix, plus a count of everything seen.
#[derive(Debug, Default)]
pub struct TreeListing {
    /// Files and directories under the root, excluding the root and `.git`.
    pub entries: usize,
    /// Candidate source files in path order.
    pub candidates: Vec<(PathBuf, Language)>,
    /// Entries that could not be read while walking.
    pub walk_errors: usize,
}

pub fn list_tree(root: &Path) -> Result<TreeListing, ClassifyError> {
    if !root.is_dir() {
        return Err(ClassifyError::Walk {
            root: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut listing = TreeListing::default();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != VCS_DIR);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(root = %root.display(), error = %e, "skipping unreadable entry");
                listing.walk_errors += 1;
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }
        listing.entries += 1;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(language) = Language::from_path(entry.path()) {
            listing.candidates.push((entry.into_path(), language));
        }
    }
    Ok(listing)
}
