//! Discovery of `.rs` files under a search root.

use std::fs;
use std::path::{Path, PathBuf};

use swg_core::fault::{FaultKind, Faults, SourceLocation};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["target"];

/// All `.rs` files under `root` in file-name order, skipping hidden
/// directories, `target` and anything in `exclude`.
///
/// `exclude` entries may be absolute or relative to `root`. Unreadable
/// entries are recorded as source faults and skipped.
pub fn rust_files(root: &Path, exclude: &[PathBuf], faults: &mut Faults) -> Vec<PathBuf> {
    let excluded = canonical_excludes(root, exclude);
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped(entry, &excluded));

    for entry in walker {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "rs")
                {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => {
                let location = e.path().map(|p| SourceLocation::new(p, 0));
                faults.push(FaultKind::Source, location.as_ref(), e.to_string());
            }
        }
    }
    log::debug!("found {} source files under {}", files.len(), root.display());
    files
}

fn canonical_excludes(root: &Path, exclude: &[PathBuf]) -> Vec<PathBuf> {
    exclude
        .iter()
        .flat_map(|ex| [ex.clone(), root.join(ex)])
        .filter_map(|path| fs::canonicalize(path).ok())
        .collect()
}

fn is_skipped(entry: &DirEntry, excluded: &[PathBuf]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) {
        return true;
    }
    fs::canonicalize(entry.path()).is_ok_and(|path| excluded.contains(&path))
}
