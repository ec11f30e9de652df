//! Board discovery under a sandboxed working directory.
//!
//! ```text
//!  raw path ──> sandbox.rs ──> lister.rs            (typeahead: child dirs)
//!                   │
//!                   └────────> cache.rs ──> finder.rs (board files, walkdir)
//! ```
//!
//! `BoardDiscovery` owns one `PathSandbox` and one `BoardCache`. All methods
//! do blocking filesystem work; async callers should run them on a blocking
//! thread.

pub mod cache;
pub mod finder;
pub mod lister;
pub mod sandbox;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use cache::{
    BoardCache, CacheKey, CacheStats, Clock, DEFAULT_CACHE_TTL, ManualClock, SystemClock,
};
pub use finder::{BOARD_FILE_SUFFIX, BoardFileRef, WalkMode};
pub use sandbox::PathSandbox;

use crate::errors::DiscoveryError;

/// Names starting with a dot are hidden.
pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Options for a board listing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListBoardsOptions {
    pub recursive: bool,
    pub force_refresh: bool,
}

pub struct BoardDiscovery {
    sandbox: PathSandbox,
    cache: BoardCache,
}

impl BoardDiscovery {
    pub fn new(working_root: impl AsRef<Path>, ttl: Duration) -> Result<Self, DiscoveryError> {
        Self::with_clock(working_root, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        working_root: impl AsRef<Path>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            sandbox: PathSandbox::new(working_root)?,
            cache: BoardCache::with_clock(ttl, clock),
        })
    }

    pub fn working_root(&self) -> &Path {
        self.sandbox.root()
    }

    pub fn sandbox(&self) -> &PathSandbox {
        &self.sandbox
    }

    pub fn resolve(&self, raw: &str) -> Result<PathBuf, DiscoveryError> {
        self.sandbox.resolve(raw)
    }

    /// Child directories of `raw` for typeahead. Only a sandbox violation is
    /// an error; anything missing is an empty list.
    pub fn list_directories(&self, raw: &str) -> Result<Vec<String>, DiscoveryError> {
        let target = self.sandbox.resolve(raw)?;
        Ok(lister::list_subdirectories(&target))
    }

    /// Board files under `raw`.
    ///
    /// The target directory itself must exist in both modes. Unreadable
    /// entries below it are skipped.
    pub fn list_boards(
        &self,
        raw: &str,
        options: ListBoardsOptions,
    ) -> Result<Vec<BoardFileRef>, DiscoveryError> {
        let target = self.sandbox.resolve(raw)?;
        if !target.is_dir() {
            return Err(DiscoveryError::NotFound { path: target });
        }

        let mode = WalkMode::from_recursive(options.recursive);
        let key = CacheKey::new(target.clone(), target.clone(), mode);
        let boards = self.cache.get_or_walk(key, options.force_refresh, || {
            let report = match mode {
                WalkMode::Shallow => finder::find_boards(&target),
                WalkMode::Recursive => finder::find_boards_recursive(&target, &target),
            };
            report.boards
        });
        Ok(boards)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
