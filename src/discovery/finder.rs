//! Board file search, shallow or recursive.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use super::is_hidden_name;

/// File suffix that marks a board file.
pub const BOARD_FILE_SUFFIX: &str = ".knbn";

/// A discovered board file.
///
/// `name` is the path relative to the search base, so boards that share a
/// file name in different subdirectories stay distinguishable. In shallow
/// mode that is just the file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardFileRef {
    pub name: String,
    pub path: String,
}

/// How far below the search directory to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkMode {
    /// Immediate children only.
    Shallow,
    /// Every non-hidden subdirectory.
    Recursive,
}

impl WalkMode {
    pub fn from_recursive(recursive: bool) -> Self {
        if recursive { Self::Recursive } else { Self::Shallow }
    }
}

/// An entry that could not be read during a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: Option<PathBuf>,
    pub reason: String,
}

/// Result of an uncached walk: the boards found plus whatever was skipped.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub boards: Vec<BoardFileRef>,
    pub skipped: Vec<SkippedEntry>,
}

/// Board files directly inside `search_dir`.
pub fn find_boards(search_dir: &Path) -> WalkReport {
    walk(search_dir, search_dir, WalkMode::Shallow)
}

/// Board files anywhere under `search_dir`, named relative to `base_dir`.
///
/// Hidden directories are not entered. Unreadable subtrees are recorded in
/// the report and skipped; the rest of the walk continues.
pub fn find_boards_recursive(search_dir: &Path, base_dir: &Path) -> WalkReport {
    walk(search_dir, base_dir, WalkMode::Recursive)
}

fn walk(search_dir: &Path, base_dir: &Path, mode: WalkMode) -> WalkReport {
    collect_report(board_entries(search_dir, mode), search_dir, base_dir, mode)
}

fn board_entries(
    search_dir: &Path,
    mode: WalkMode,
) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    let mut walker = WalkDir::new(search_dir).min_depth(1).sort_by_file_name();
    if mode == WalkMode::Shallow {
        walker = walker.max_depth(1);
    }
    walker.into_iter().filter_entry(is_walkable)
}

fn collect_report<I>(
    entries: I,
    search_dir: &Path,
    base_dir: &Path,
    mode: WalkMode,
) -> WalkReport
where
    I: Iterator<Item = walkdir::Result<DirEntry>>,
{
    let mut report = WalkReport::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                tracing::debug!(
                    path = ?path,
                    error = %e,
                    "skipping unreadable entry during board search"
                );
                report.skipped.push(SkippedEntry {
                    path,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_board_file(entry.file_name()) {
            continue;
        }

        report.boards.push(BoardFileRef {
            name: display_name(entry.path(), base_dir),
            path: entry.path().to_string_lossy().into_owned(),
        });
    }

    tracing::debug!(
        dir = %search_dir.display(),
        ?mode,
        boards = report.boards.len(),
        skipped = report.skipped.len(),
        "board search finished"
    );
    report
}

fn is_walkable(entry: &DirEntry) -> bool {
    entry.depth() == 0
        || !entry.file_type().is_dir()
        || !is_hidden_name(&entry.file_name().to_string_lossy())
}

fn is_board_file(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().ends_with(BOARD_FILE_SUFFIX)
}

fn display_name(path: &Path, base_dir: &Path) -> String {
    match path.strip_prefix(base_dir) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}
