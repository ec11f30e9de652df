//! Immediate-subdirectory listing for path typeahead.

use std::fs;
use std::path::Path;

use super::is_hidden_name;

/// List the non-hidden child directories of `dir`, sorted by name.
///
/// A missing target or a target that is not a directory yields an empty list.
/// Entries that cannot be inspected are skipped.
pub fn list_subdirectories(dir: &Path) -> Vec<String> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut directories: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(path = %dir.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden_name(&name) {
                return None;
            }
            // Follows symlinks; a link that leaves the root is refused later by the sandbox.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_dir() => Some(name),
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(path = %entry.path().display(), error = %e, "skipping entry");
                    None
                }
            }
        })
        .collect();

    directories.sort();
    directories
}
